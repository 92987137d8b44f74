use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::errors::CliError;
use crate::settings::Overrides;
use crate::tracing::{LogLevel, TracingFormat};

#[derive(Parser, Debug)]
#[command(name = "artifetch")]
#[command(about = "Resolve and fetch deployable artifacts from Nexus, S3 or plain HTTP")]
#[command(long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    #[arg(
        short = 'l',
        long,
        global = true,
        help = "Set logging level",
        default_value = "warn",
        value_enum
    )]
    pub level: LogLevel,

    #[arg(
        long = "log-format",
        global = true,
        help = "Log output format",
        default_value = "compact",
        value_enum
    )]
    pub log_format: TracingFormat,

    #[arg(long, global = true, help = "Output logs in JSON format")]
    pub json: bool,

    #[arg(long, global = true, help = "Settings file (default: <config dir>/artifetch/config.toml)")]
    pub config: Option<PathBuf>,

    #[arg(
        long,
        global = true,
        env = "ARTIFETCH_STORE_DIR",
        help = "Directory holding <scope>/<item>.json credential records"
    )]
    pub store_dir: Option<PathBuf>,

    #[arg(
        short = 'e',
        long,
        global = true,
        env = "ARTIFETCH_ENVIRONMENT",
        help = "Environment whose credential records apply"
    )]
    pub environment: Option<String>,

    #[arg(long, global = true, env = "ARTIFETCH_NODE", help = "Name of this node, for logs")]
    pub node: Option<String>,

    #[arg(long, global = true, help = "Accept invalid TLS certificates")]
    pub no_ssl_verify: bool,
}

impl GlobalArgs {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            store_dir: self.store_dir.clone(),
            environment: self.environment.clone(),
            node_name: self.node.clone(),
            no_ssl_verify: self.no_ssl_verify,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(about = "Fetch an artifact to a local file")]
    Fetch {
        #[arg(help = "Coordinate (group:artifact:version[:ext[:classifier]]), s3:// URI or http(s) URL")]
        location: String,
        #[arg(help = "File to write")]
        destination: PathBuf,
        #[arg(
            short = 'o',
            long = "option",
            value_name = "KEY=VALUE",
            help = "Transfer option; header.<name>=<value> adds an HTTP header",
            value_parser = parse_option
        )]
        options: Vec<(String, String)>,
    },
    #[command(about = "Print the concrete version a coordinate resolves to")]
    Resolve {
        #[arg(help = "Repository coordinate; a version of 'latest' is looked up")]
        coordinate: String,
    },
    #[command(about = "Print the version the deployment's current link points at (exit 2 if none)")]
    Current {
        #[arg(help = "Deployment directory containing the current link")]
        deploy_dir: PathBuf,
    },
    #[command(about = "Print a direct download URL for a coordinate")]
    Url {
        #[arg(help = "Repository coordinate; a version of 'latest' is looked up")]
        coordinate: String,
    },
}

fn parse_option(raw: &str) -> Result<(String, String), CliError> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(CliError::InvalidOption {
            option: raw.to_string(),
        }),
    }
}

pub fn parse() -> Cli {
    Cli::parse()
}
