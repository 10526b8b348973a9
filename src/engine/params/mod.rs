/// Encoder option schema.
///
/// This module is the single source of truth for the NVENC HEVC private
/// options: their names, ranges, defaults, named constants and the SDK
/// version each one needs. The option table is loaded from
/// hevc-nvenc-options.toml at build time and compiled into the binary.
pub mod types;

mod generated {
    include!(concat!(env!("OUT_DIR"), "/params_generated.rs"));
}

mod help;
mod validation;

use std::sync::OnceLock;

pub use types::{ParamDescriptor, ParamKind, SdkVersion};

pub use generated::{BUILT_SDK_MAJOR, CLASS_NAME, PARAMS, SCHEMA_VERSION};

pub use validation::{ValidationError, parse_option_string};

use crate::engine::settings::EncoderSettings;

impl SdkVersion {
    /// The SDK this crate was built against (`NVENC_SDK_MAJOR`).
    pub const BUILT: SdkVersion = SdkVersion::new(BUILT_SDK_MAJOR);
}

/// Get a selector from the full option table, regardless of SDK version
///
/// # Example
/// ```ignore
/// use hevc_nvenc::engine::params::get_param;
///
/// let preset = get_param("preset").expect("preset option should exist");
/// assert_eq!(preset.group, Some("preset"));
/// ```
pub fn get_param(name: &str) -> Option<&'static ParamDescriptor> {
    PARAMS.iter().find(|p| p.is_selector() && p.name == name)
}

/// The option schema as advertised for one SDK version.
///
/// Entries the SDK cannot honor are left out, and closed selectors have their
/// range narrowed to the constants that remain.
#[derive(Debug, Clone)]
pub struct Schema {
    sdk: SdkVersion,
    params: Vec<ParamDescriptor>,
}

static BUILT_SCHEMA: OnceLock<Schema> = OnceLock::new();

impl Schema {
    pub fn for_sdk(sdk: SdkVersion) -> Self {
        let mut params: Vec<ParamDescriptor> = PARAMS
            .iter()
            .filter(|p| p.available_on(sdk))
            .cloned()
            .collect();

        let spans: Vec<(usize, i64, i64)> = params
            .iter()
            .enumerate()
            .filter(|(_, p)| p.is_selector() && p.closed)
            .filter_map(|(i, selector)| {
                let group = selector.group?;
                let values = params
                    .iter()
                    .filter(|c| c.is_constant() && c.group == Some(group))
                    .map(|c| c.default_value)
                    .chain(selector.sentinel);
                let min = values.clone().min()?;
                let max = values.max()?;
                Some((i, min, max))
            })
            .collect();

        for (i, min, max) in spans {
            params[i].min = min;
            params[i].max = max;
        }

        Self { sdk, params }
    }

    /// Schema for the SDK this crate was built against (cached)
    pub fn built() -> &'static Schema {
        BUILT_SCHEMA.get_or_init(|| Schema::for_sdk(SdkVersion::BUILT))
    }

    pub fn sdk(&self) -> SdkVersion {
        self.sdk
    }

    /// Every advertised entry, selectors followed by their constants
    pub fn params(&self) -> &[ParamDescriptor] {
        &self.params
    }

    pub fn selectors(&self) -> impl Iterator<Item = &ParamDescriptor> {
        self.params.iter().filter(|p| p.is_selector())
    }

    /// Get an advertised selector by option name
    pub fn get_param(&self, name: &str) -> Option<&ParamDescriptor> {
        self.selectors().find(|p| p.name == name)
    }

    /// Named constants of a group, in table order
    pub fn constants<'a>(&'a self, group: &'a str) -> impl Iterator<Item = &'a ParamDescriptor> {
        self.params
            .iter()
            .filter(move |p| p.is_constant() && p.group == Some(group))
    }

    /// Group names that have at least one advertised constant
    pub fn groups(&self) -> Vec<&'static str> {
        let mut groups: Vec<&'static str> = Vec::new();
        for group in self.params.iter().filter(|p| p.is_constant()).filter_map(|p| p.group) {
            if !groups.contains(&group) {
                groups.push(group);
            }
        }
        groups
    }

    pub fn constant_value(&self, group: &str, name: &str) -> Option<i64> {
        self.constants(group)
            .find(|c| c.name == name)
            .and_then(|c| c.constant_value())
    }

    /// First constant of `group` labeling `value`
    pub fn constant_name(&self, group: &str, value: i64) -> Option<&'static str> {
        self.constants(group)
            .find(|c| c.default_value == value)
            .map(|c| c.name)
    }

    /// Settings holding the default of every advertised selector.
    pub fn defaults(&self) -> EncoderSettings {
        let mut settings = EncoderSettings::unpopulated();
        for param in self.selectors() {
            if let Some(field) = param.storage_field {
                settings.store(field, param.default_value);
            }
        }
        settings
    }

    /// Render a stored value the way a user would type it.
    pub fn display_value(&self, param: &ParamDescriptor, value: i64) -> String {
        param
            .group
            .and_then(|group| self.constant_name(group, value))
            .map(str::to_string)
            .unwrap_or_else(|| value.to_string())
    }
}
