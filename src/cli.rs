use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use triposr_service::config::{RuntimeConfig, ServiceConfig};
use triposr_service::debug::LogConfig;
use triposr_service::domain::generation::{DevicePreference, ForegroundRatio, GenerationError};

#[derive(Parser, Debug)]
#[command(
    name = "triposr-service",
    version,
    about = "HTTP service that turns a single image into a GLB mesh with TripoSR",
    long_about = "HTTP service that turns a single image into a GLB mesh with TripoSR. \
                  The model and a rembg session are loaded once into a runtime worker."
)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true, env = "TRIPOSR_DEBUG")]
    pub debug: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load the model and serve the HTTP API
    Serve(ServeArgs),
    /// Show device and runtime information
    #[command(name = "info")]
    Info {
        #[command(flatten)]
        runtime: RuntimeArgs,
    },
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Port to bind the web server to
    #[arg(short, long, env = "TRIPOSR_PORT", default_value = "5000")]
    pub port: u16,
    /// Host to bind the web server to
    #[arg(short = 'H', long, env = "TRIPOSR_HOST", default_value = "0.0.0.0")]
    pub host: String,
    /// Fraction of the square image the foreground should fill
    #[arg(long, env = "TRIPOSR_FOREGROUND_RATIO", default_value = "0.85")]
    pub foreground_ratio: f32,
    /// Maximum request body size in bytes (unlimited when unset)
    #[arg(long, env = "TRIPOSR_BODY_LIMIT")]
    pub body_limit: Option<usize>,
    /// Directory for staging meshes before they are sent (defaults to the system temp dir)
    #[arg(long, env = "TRIPOSR_STAGING_DIR")]
    pub staging_dir: Option<PathBuf>,
    /// Write JSON logs to a daily rolling file instead of the console
    #[arg(long, env = "TRIPOSR_LOG_JSON")]
    pub log_json: bool,
    /// Directory for JSON log files
    #[arg(long, env = "TRIPOSR_LOG_DIR", default_value = "logs")]
    pub log_dir: PathBuf,
    #[command(flatten)]
    pub runtime: RuntimeArgs,
}

#[derive(Args, Debug)]
pub struct RuntimeArgs {
    /// Inference device: auto, cuda or cpu
    #[arg(long, env = "TRIPOSR_DEVICE", default_value = "auto")]
    pub device: DevicePreference,
    /// Python interpreter with TripoSR installed
    #[arg(long, env = "TRIPOSR_PYTHON", default_value = "python3")]
    pub python: PathBuf,
    /// TripoSR checkout containing the tsr package
    #[arg(long, env = "TRIPOSR_DIR", default_value = ".")]
    pub triposr_dir: PathBuf,
    /// Pretrained model name or path
    #[arg(long, env = "TRIPOSR_PRETRAINED_MODEL", default_value = "stabilityai/TripoSR")]
    pub pretrained_model: String,
    /// Evaluation chunk size for surface extraction
    #[arg(long, env = "TRIPOSR_CHUNK_SIZE", default_value = "8192")]
    pub chunk_size: u32,
    /// Use the mock gateway instead of the TripoSR runtime
    #[arg(long, env = "TRIPOSR_MOCK")]
    pub mock: bool,
}

impl From<RuntimeArgs> for RuntimeConfig {
    fn from(args: RuntimeArgs) -> Self {
        Self {
            python: args.python,
            triposr_dir: args.triposr_dir,
            pretrained_model: args.pretrained_model,
            chunk_size: args.chunk_size,
            device: args.device,
            mock: args.mock,
        }
    }
}

impl Cli {
    pub fn log_config(&self) -> LogConfig {
        match &self.command {
            Commands::Serve(args) if args.log_json => {
                let config = LogConfig::production(args.log_dir.clone());
                if self.debug { config.verbose() } else { config }
            }
            _ if self.debug => LogConfig::development(),
            _ => LogConfig::default(),
        }
    }
}

impl ServeArgs {
    pub fn into_config(self) -> Result<ServiceConfig, GenerationError> {
        Ok(ServiceConfig {
            host: self.host,
            port: self.port,
            foreground_ratio: ForegroundRatio::new(self.foreground_ratio)?,
            body_limit: self.body_limit,
            staging_dir: self.staging_dir,
            runtime: self.runtime.into(),
        })
    }
}
