/// Option validation against the schema.
///
/// Values arrive as strings (integer literals or constant names), are
/// resolved against the selector's group, checked against its domain and
/// only then stored in the session settings.
use thiserror::Error;
use tracing::debug;

use super::types::ParamDescriptor;
use super::{PARAMS, Schema};
use crate::engine::settings::EncoderSettings;

/// Validation error types
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Option '{0}' not found")]
    UnknownParameter(String),

    #[error("Option '{name}' requires NVENC SDK {required}, built against SDK {built}")]
    Unavailable {
        name: String,
        required: u32,
        built: u32,
    },

    #[error("Value {value} for option '{param}' out of range [{min} - {max}]")]
    OutOfRange {
        param: String,
        value: i64,
        min: i64,
        max: i64,
    },

    #[error("Value '{value}' is not valid for option '{param}'; expected one of: {expected}")]
    NotInEnumeration {
        param: String,
        value: String,
        expected: String,
    },

    #[error("Unable to parse option value '{value}' for '{param}'")]
    InvalidValue { param: String, value: String },

    #[error("Malformed option '{0}', expected key=value")]
    Malformed(String),
}

impl Schema {
    /// Validate an already-numeric value for a selector.
    ///
    /// Every selector accepts its inclusive range. Values inside a closed
    /// selector's range that name no constant are left for the hardware
    /// session to refuse.
    pub fn validate(&self, param: &ParamDescriptor, value: i64) -> Result<(), ValidationError> {
        if !param.contains(value) {
            return Err(ValidationError::OutOfRange {
                param: param.name.to_string(),
                value,
                min: param.min,
                max: param.max,
            });
        }

        Ok(())
    }

    /// Turn a user-supplied string into a value for `param`.
    ///
    /// Named constants of the selector's group win over everything else, then
    /// integer literals, then the `default`/`min`/`max` keywords.
    pub fn resolve_value(&self, param: &ParamDescriptor, raw: &str) -> Result<i64, ValidationError> {
        let raw = raw.trim();

        if let Some(group) = param.group {
            if let Some(value) = self.constant_value(group, raw) {
                return Ok(value);
            }
        }

        if let Ok(value) = raw.parse::<i64>() {
            return Ok(value);
        }

        match raw {
            "default" => return Ok(param.default_value),
            "min" => return Ok(param.min),
            "max" => return Ok(param.max),
            _ => {}
        }

        if let Some(group) = param.group {
            // Known constant, just not for this SDK
            if let Some(gated) = PARAMS
                .iter()
                .find(|c| c.is_constant() && c.group == Some(group) && c.name == raw)
            {
                return Err(ValidationError::Unavailable {
                    name: format!("{}={}", param.name, raw),
                    required: gated.version_guard.unwrap_or_default(),
                    built: self.sdk().major,
                });
            }

            return Err(ValidationError::NotInEnumeration {
                param: param.name.to_string(),
                value: raw.to_string(),
                expected: self.expected_names(param),
            });
        }

        Err(ValidationError::InvalidValue {
            param: param.name.to_string(),
            value: raw.to_string(),
        })
    }

    /// Look up an advertised selector, telling apart unknown options from
    /// options the SDK does not provide.
    pub fn selector(&self, name: &str) -> Result<&ParamDescriptor, ValidationError> {
        if let Some(param) = self.get_param(name) {
            return Ok(param);
        }

        match super::get_param(name) {
            Some(gated) => Err(ValidationError::Unavailable {
                name: name.to_string(),
                required: gated.version_guard.unwrap_or_default(),
                built: self.sdk().major,
            }),
            None => Err(ValidationError::UnknownParameter(name.to_string())),
        }
    }

    /// Parse, validate and store one option. Returns the stored value.
    ///
    /// Synonyms share a field, so the last applied one wins.
    pub fn apply(
        &self,
        settings: &mut EncoderSettings,
        name: &str,
        raw: &str,
    ) -> Result<i64, ValidationError> {
        let param = self.selector(name)?;
        let value = self.resolve_value(param, raw)?;
        self.validate(param, value)?;

        let Some(field) = param.storage_field else {
            return Err(ValidationError::UnknownParameter(name.to_string()));
        };
        settings.store(field, value);
        debug!(option = name, value, "applied encoder option");

        Ok(value)
    }

    fn expected_names(&self, param: &ParamDescriptor) -> String {
        let group = param.group.unwrap_or(param.name);
        let mut names: Vec<String> = self.constants(group).map(|c| c.name.to_string()).collect();
        if let Some(sentinel) = param.sentinel {
            names.push(sentinel.to_string());
        }
        names.join(", ")
    }
}

/// Split a `key=value:key=value` option string into ordered pairs.
///
/// Empty segments are skipped; order is preserved so later entries override
/// earlier ones when applied.
pub fn parse_option_string(options: &str) -> Result<Vec<(String, String)>, ValidationError> {
    options
        .split(':')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(|segment| match segment.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() => {
                Ok((key.trim().to_string(), value.trim().to_string()))
            }
            _ => Err(ValidationError::Malformed(segment.to_string())),
        })
        .collect()
}
