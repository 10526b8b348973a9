use std::sync::Arc;

use anyhow::{Context, Result, bail};
use serde::Serialize;

use hevc_nvenc::cli::{self, Commands};
use hevc_nvenc::config::Config;
use hevc_nvenc::engine::hardware::{self, DryRunBackend};
use hevc_nvenc::engine::params::{Schema, SdkVersion};
use hevc_nvenc::engine::{CodecContext, CodecRegistry, EncoderSession, PixelFormat, SessionParams};

fn main() -> Result<()> {
    let cli = cli::parse();
    let config = Config::load()?;

    let level = cli.log_level.as_deref().unwrap_or(&config.logging.level);
    let level: tracing::Level = level
        .parse()
        .with_context(|| format!("Invalid log level: {}", level))?;
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Options { sdk } => {
            let schema = match sdk {
                Some(major) => Schema::for_sdk(SdkVersion::new(major)),
                None => Schema::built().clone(),
            };
            print!("{}", schema.render_help());
        }
        Commands::Codecs => {
            for codec in CodecRegistry::builtin().iter() {
                let pix_fmts: Vec<&str> = codec.pix_fmts.iter().map(|f| f.name()).collect();
                println!("{:<12} {}", codec.name, codec.long_name);
                println!("    pixel formats: {}", pix_fmts.join(" "));
                println!("    capabilities:  {}", codec.capabilities.names().join(" "));
            }
        }
        Commands::Check {
            codec,
            json,
            options,
        } => run_check(&config, codec.as_deref(), &options, json)?,
        Commands::Devices => {
            if !hardware::nvidia_smi_available() {
                bail!("nvidia-smi not found; is the NVIDIA driver installed?");
            }
            let devices = hardware::detect_nvidia_gpus();
            if devices.is_empty() {
                println!("No NVIDIA GPUs found");
            }
            for (index, device) in devices.iter().enumerate() {
                match device.compute_capability {
                    Some((major, minor)) => {
                        println!("GPU #{}: {} (compute {}.{})", index, device.name, major, minor)
                    }
                    None => println!("GPU #{}: {}", index, device.name),
                }
            }
        }
        Commands::InitConfig => {
            let path = Config::config_path()?;
            if Config::exists() {
                println!("Config file exists: {}", path.display());
            } else {
                Config::ensure_default()?;
                println!("Created default config: {}", path.display());
            }
        }
    }

    Ok(())
}

#[derive(Serialize)]
struct CheckReport<'a> {
    codec: &'a str,
    context: &'a CodecContext,
    params: Option<&'a SessionParams>,
}

fn run_check(config: &Config, codec: Option<&str>, options: &str, json: bool) -> Result<()> {
    let name = codec.unwrap_or(&config.defaults.codec);
    let descriptor = CodecRegistry::builtin()
        .find_encoder(name)
        .with_context(|| format!("Unknown encoder '{}'", name))?;
    let pix_fmt = PixelFormat::from_name(&config.defaults.pix_fmt)
        .with_context(|| format!("Unknown pixel format '{}'", config.defaults.pix_fmt))?;

    let mut session = EncoderSession::new(descriptor, Arc::new(DryRunBackend::detect()));
    session.set_size(config.defaults.width, config.defaults.height)?;
    session.set_pixel_format(pix_fmt)?;
    session
        .set_options(&config.defaults.option_string())
        .context("Invalid default options in config file")?;
    session.set_options(options)?;
    session.open()?;

    if json {
        let report = CheckReport {
            codec: session.codec().name,
            context: session.context(),
            params: session.params(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        let schema = &session.codec().schema;
        println!("{} ({})", session.codec().name, schema.sdk());
        for selector in schema.selectors() {
            let Some(value) = selector
                .storage_field
                .and_then(|field| session.context().settings.get(field))
            else {
                continue;
            };
            println!("  {:<14} {}", selector.name, schema.display_value(selector, value));
        }
        if let Some(params) = session.params() {
            println!("{:#?}", params);
        }
    }

    session.close();
    Ok(())
}
