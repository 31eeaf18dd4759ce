use std::path::PathBuf;

use binfold::{Axis, OverflowPolicy, PartitionConfig, DEFAULT_BUDGET};
use clap::ValueHint;

/// How log events are rendered on stderr.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default, clap::ValueEnum)]
pub enum LogFormat {
    Compact,
    Full,
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, clap::Parser)]
#[command(author, version, about)]
pub struct Cli {
    /// Logging output filters; comma-separated
    #[arg(
        short,
        long,
        default_value = "warn,binfold=info,hedron=info,glb_split=info",
        env = "GLB_SPLIT_LOG_FILTER"
    )]
    pub log_filter: String,
    /// Logging output format
    #[arg(long, value_enum, default_value = "pretty")]
    pub log_format: LogFormat,
    /// Directory in which to write output files; created if missing
    #[arg(short, long, default_value = "./", value_hint = ValueHint::DirPath)]
    pub output: PathBuf,
    /// Base name of output files [default: the input's file stem]
    #[arg(short, long)]
    pub name: Option<String>,
    /// Target size of each output, in bytes of vertex attribute data
    #[arg(short = 'm', long, default_value_t = DEFAULT_BUDGET)]
    pub threshold: u64,
    /// Axis along which to split oversized meshes
    #[arg(short, long, default_value_t = Axis::Y)]
    pub axis: Axis,
    /// Split meshes larger than the threshold in two, instead of giving each its own output
    #[arg(long)]
    pub split_oversized: bool,
    /// glTF or GLB file to split
    #[arg(required = true, value_hint = ValueHint::FilePath)]
    pub input: PathBuf,
}

impl Cli {
    pub fn partition_config(&self) -> PartitionConfig {
        PartitionConfig {
            budget: self.threshold,
            axis: self.axis,
            overflow: if self.split_oversized {
                OverflowPolicy::Split
            } else {
                OverflowPolicy::Absorb
            },
        }
    }

    /// Install the global subscriber, writing to stderr.
    pub fn init_logging(&self) {
        let offset = time::UtcOffset::current_local_offset().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "local time offset unavailable; logging in UTC");
            time::UtcOffset::UTC
        });
        let timer = tracing_subscriber::fmt::time::OffsetTime::new(
            offset,
            time::macros::format_description!("[hour]:[minute]:[second].[subsecond digits:3]"),
        );
        let builder = tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(self.log_filter.as_str())
            .with_timer(timer)
            .with_thread_names(true);

        match self.log_format {
            LogFormat::Compact => builder.compact().init(),
            LogFormat::Full => builder.init(),
            LogFormat::Pretty => builder.pretty().init(),
            LogFormat::Json => builder.json().init(),
        }
    }

    /// The base name of output files.
    pub fn output_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| {
            self.input
                .file_stem()
                .map_or_else(|| "output".to_owned(), |s| s.to_string_lossy().into_owned())
        })
    }
}
