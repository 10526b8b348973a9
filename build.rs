use std::collections::HashSet;
use std::env;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use serde::Deserialize;

const OPTIONS_TOML: &str = "src/engine/params/hevc-nvenc-options.toml";

/// SDK major version assumed when `NVENC_SDK_MAJOR` is not set.
const DEFAULT_SDK_MAJOR: u32 = 8;

fn main() {
    println!("cargo:rerun-if-changed={}", OPTIONS_TOML);
    println!("cargo:rerun-if-env-changed=NVENC_SDK_MAJOR");

    let sdk_major = match env::var("NVENC_SDK_MAJOR") {
        Ok(raw) => raw
            .trim()
            .parse::<u32>()
            .unwrap_or_else(|_| panic!("NVENC_SDK_MAJOR must be an integer, got '{}'", raw)),
        Err(_) => DEFAULT_SDK_MAJOR,
    };

    generate_params_code(sdk_major);
}

#[derive(Debug, Deserialize)]
struct Registry {
    meta: Meta,
    option: Vec<OptionSpec>,
}

#[derive(Debug, Deserialize)]
struct Meta {
    schema_version: String,
    class_name: String,
}

#[derive(Debug, Deserialize)]
struct OptionSpec {
    name: String,
    #[serde(default)]
    help: String,
    field: String,
    default: DefaultSpec,
    min: Option<i64>,
    max: Option<i64>,
    #[serde(default)]
    closed: bool,
    sentinel: Option<i64>,
    min_sdk: Option<u32>,
    #[serde(default)]
    constants: Vec<ConstSpec>,
}

#[derive(Debug, Deserialize)]
struct ConstSpec {
    name: String,
    #[serde(default)]
    help: String,
    value: i64,
    min_sdk: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DefaultSpec {
    Int(i64),
    Name(String),
}

/// Resolved numeric domain of a selector.
struct Domain {
    default: i64,
    min: i64,
    max: i64,
}

/// Validate the option table and work out every selector's domain.
///
/// Panics with a message naming the offending entry; a bad table must never
/// reach the compiled schema.
fn validate_registry(registry: &Registry) -> Vec<Domain> {
    assert!(
        !registry.meta.schema_version.is_empty(),
        "Missing schema_version in [meta]"
    );
    assert!(
        !registry.meta.class_name.is_empty(),
        "Missing class_name in [meta]"
    );
    assert!(!registry.option.is_empty(), "Must define at least one option");

    let mut names = HashSet::new();
    let mut domains = Vec::with_capacity(registry.option.len());

    for opt in &registry.option {
        assert!(
            names.insert(opt.name.as_str()),
            "Duplicate option name: {}",
            opt.name
        );
        assert!(!opt.field.is_empty(), "Option '{}' missing 'field'", opt.name);

        let mut const_names = HashSet::new();
        let mut const_values = HashSet::new();
        for c in &opt.constants {
            assert!(
                const_names.insert(c.name.as_str()),
                "Duplicate constant '{}' in group '{}'",
                c.name,
                opt.name
            );
            assert!(
                const_values.insert(c.value),
                "Constant '{}' in group '{}' reuses value {}",
                c.name,
                opt.name,
                c.value
            );
            if let (Some(opt_sdk), Some(c_sdk)) = (opt.min_sdk, c.min_sdk) {
                assert!(
                    c_sdk >= opt_sdk,
                    "Constant '{}' in group '{}' is visible before its selector",
                    c.name,
                    opt.name
                );
            }
        }

        let (min, max) = if opt.closed {
            assert!(
                opt.min.is_none() && opt.max.is_none(),
                "Closed option '{}' takes its range from its constants",
                opt.name
            );
            assert!(
                !opt.constants.is_empty(),
                "Closed option '{}' has no constants",
                opt.name
            );
            let values = opt
                .constants
                .iter()
                .map(|c| c.value)
                .chain(opt.sentinel);
            let min = values.clone().min().unwrap_or_default();
            let max = values.max().unwrap_or_default();
            (min, max)
        } else {
            assert!(
                opt.sentinel.is_none(),
                "Option '{}' declares a sentinel but is not closed",
                opt.name
            );
            let min = opt
                .min
                .unwrap_or_else(|| panic!("Option '{}' missing 'min'", opt.name));
            let max = opt
                .max
                .unwrap_or_else(|| panic!("Option '{}' missing 'max'", opt.name));
            assert!(
                min <= max,
                "Option '{}' has invalid range: min ({}) > max ({})",
                opt.name,
                min,
                max
            );
            for c in &opt.constants {
                assert!(
                    (min..=max).contains(&c.value),
                    "Constant '{}' of '{}' lies outside {}..={}",
                    c.name,
                    opt.name,
                    min,
                    max
                );
            }
            (min, max)
        };

        let default = match &opt.default {
            DefaultSpec::Int(v) => *v,
            DefaultSpec::Name(name) => opt
                .constants
                .iter()
                .find(|c| &c.name == name)
                .map(|c| {
                    assert!(
                        c.min_sdk.is_none() || c.min_sdk == opt.min_sdk,
                        "Default '{}' of '{}' is version-gated",
                        name,
                        opt.name
                    );
                    c.value
                })
                .unwrap_or_else(|| {
                    panic!("Default '{}' of '{}' is not one of its constants", name, opt.name)
                }),
        };
        assert!(
            (min..=max).contains(&default),
            "Default {} of '{}' lies outside {}..={}",
            default,
            opt.name,
            min,
            max
        );

        domains.push(Domain { default, min, max });
    }

    domains
}

/// `async_depth` -> `AsyncDepth`
fn field_variant(field: &str) -> String {
    field
        .split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

fn opt_u32(v: Option<u32>) -> String {
    match v {
        Some(v) => format!("Some({})", v),
        None => "None".to_string(),
    }
}

fn generate_params_code(sdk_major: u32) {
    let out_dir = env::var("OUT_DIR").expect("OUT_DIR is set by cargo");
    let dest_path = Path::new(&out_dir).join("params_generated.rs");

    let toml_content = fs::read_to_string(OPTIONS_TOML)
        .unwrap_or_else(|e| panic!("Failed to read {}: {}", OPTIONS_TOML, e));
    let registry: Registry = toml::from_str(&toml_content)
        .unwrap_or_else(|e| panic!("Failed to parse {}: {}", OPTIONS_TOML, e));

    let domains = validate_registry(&registry);

    let mut code = String::new();
    code.push_str("// AUTO-GENERATED by build.rs - DO NOT EDIT MANUALLY\n");
    code.push_str(&format!("// Generated from {}\n\n", OPTIONS_TOML));
    code.push_str("use crate::engine::params::types::*;\n");
    code.push_str("use crate::engine::settings::StorageField;\n\n");

    let _ = writeln!(
        code,
        "pub const SCHEMA_VERSION: &str = {:?};",
        registry.meta.schema_version
    );
    let _ = writeln!(
        code,
        "pub const CLASS_NAME: &str = {:?};",
        registry.meta.class_name
    );
    let _ = writeln!(code, "pub const BUILT_SDK_MAJOR: u32 = {};\n", sdk_major);

    code.push_str("pub static PARAMS: &[ParamDescriptor] = &[\n");
    let mut entries = 0usize;

    for (opt, domain) in registry.option.iter().zip(&domains) {
        let group = if opt.constants.is_empty() {
            "None".to_string()
        } else {
            format!("Some({:?})", opt.name)
        };
        let sentinel = match opt.sentinel {
            Some(v) => format!("Some({})", v),
            None => "None".to_string(),
        };

        code.push_str("    ParamDescriptor {\n");
        let _ = writeln!(code, "        name: {:?},", opt.name);
        let _ = writeln!(code, "        description: {:?},", opt.help);
        let _ = writeln!(
            code,
            "        storage_field: Some(StorageField::{}),",
            field_variant(&opt.field)
        );
        code.push_str("        kind: ParamKind::Integer,\n");
        let _ = writeln!(code, "        default_value: {},", domain.default);
        let _ = writeln!(code, "        min: {},", domain.min);
        let _ = writeln!(code, "        max: {},", domain.max);
        let _ = writeln!(code, "        group: {},", group);
        let _ = writeln!(code, "        closed: {},", opt.closed);
        let _ = writeln!(code, "        sentinel: {},", sentinel);
        let _ = writeln!(code, "        version_guard: {},", opt_u32(opt.min_sdk));
        code.push_str("    },\n");
        entries += 1;

        for c in &opt.constants {
            code.push_str("    ParamDescriptor {\n");
            let _ = writeln!(code, "        name: {:?},", c.name);
            let _ = writeln!(code, "        description: {:?},", c.help);
            code.push_str("        storage_field: None,\n");
            code.push_str("        kind: ParamKind::NamedConstant,\n");
            let _ = writeln!(code, "        default_value: {},", c.value);
            code.push_str("        min: 0,\n");
            code.push_str("        max: 0,\n");
            let _ = writeln!(code, "        group: Some({:?}),", opt.name);
            code.push_str("        closed: false,\n");
            code.push_str("        sentinel: None,\n");
            let _ = writeln!(
                code,
                "        version_guard: {},",
                opt_u32(c.min_sdk.or(opt.min_sdk))
            );
            code.push_str("    },\n");
            entries += 1;
        }
    }

    code.push_str("];\n");

    fs::write(&dest_path, code).expect("Failed to write generated code");

    println!(
        "cargo:warning=Generated {} option entries for NVENC SDK {}",
        entries, sdk_major
    );
}
