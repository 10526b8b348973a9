use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "hevc-nvenc")]
#[command(about = "NVIDIA NVENC HEVC encoder options and registration", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Log level (error, warn, info, debug, trace); overrides config
    #[arg(long, global = true)]
    pub log_level: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the private options of the encoder
    Options {
        /// NVENC SDK major version to describe (defaults to the one built against)
        #[arg(long)]
        sdk: Option<u32>,
    },

    /// List registered codecs
    Codecs,

    /// Resolve an option string the way opening a session would (dry run)
    Check {
        /// Codec name (defaults to config, then hevc_nvenc)
        #[arg(long)]
        codec: Option<String>,

        /// Print the resolved session as JSON
        #[arg(long)]
        json: bool,

        /// Options as key=value:key=value
        #[arg(value_name = "OPTIONS", default_value = "")]
        options: String,
    },

    /// List NVIDIA GPUs found by nvidia-smi
    Devices,

    /// Show config status and location, or create default config if missing
    InitConfig,
}

pub fn parse() -> Cli {
    Cli::parse()
}
