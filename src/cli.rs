use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use trackscan::config::ConfigOverrides;
use trackscan::report::writer::is_timestamp;

#[derive(Parser)]
#[command(name = "trackscan")]
#[command(author, version, about = "Media library track scanner and classifier")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan directories, classify track composition and write reports
    Scan(ScanArgs),

    /// Probe a media file and display its tracks
    Probe {
        /// File to probe
        #[arg(required = true)]
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check that the probing tool is available
    CheckTools,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}

#[derive(Args, Debug, Default)]
pub struct ScanArgs {
    /// Root directories to scan (overrides `roots` in the config)
    pub roots: Vec<PathBuf>,

    /// Show what would be written without writing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Maximum rows per report file (0 = no splitting)
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Directory for report files
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Do not write CSV reports
    #[arg(long)]
    pub no_csv: bool,

    /// Allowed video languages, comma-separated (empty disables the check)
    #[arg(long, value_name = "LANGS")]
    pub lang_vid: Option<String>,

    /// Allowed audio languages, comma-separated (empty disables the check)
    #[arg(long, value_name = "LANGS")]
    pub lang_aud: Option<String>,

    /// Allowed subtitle languages, comma-separated (empty disables the check)
    #[arg(long, value_name = "LANGS")]
    pub lang_sub: Option<String>,

    /// Codec marker video tracks must contain
    #[arg(long)]
    pub target_codec: Option<String>,

    /// Per-file probe timeout in seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Run timestamp used in report file names (YYYY-MM-DD_HHMMSS,
    /// defaults to the current local time)
    #[arg(long, value_name = "STAMP", value_parser = parse_timestamp)]
    pub timestamp: Option<String>,
}

fn parse_timestamp(value: &str) -> Result<String, String> {
    if is_timestamp(value) {
        Ok(value.to_string())
    } else {
        Err(format!("'{}' is not a YYYY-MM-DD_HHMMSS timestamp", value))
    }
}

impl ScanArgs {
    pub fn into_overrides(self) -> ConfigOverrides {
        ConfigOverrides {
            roots: self.roots,
            dry_run: self.dry_run,
            batch_size: self.batch_size,
            output_dir: self.output_dir,
            no_csv: self.no_csv,
            lang_vid: self.lang_vid,
            lang_aud: self.lang_aud,
            lang_sub: self.lang_sub,
            target_codec: self.target_codec,
            timeout_secs: self.timeout_secs,
        }
    }
}
