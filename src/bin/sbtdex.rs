//! `sbtdex build <text-path> <d>` and `sbtdex query <comp-path> <pattern>` — a thin CLI shell
//! over the library's build/query data flow.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use sbtdex::config::{BlockSize, BuildConfig};
use sbtdex::pattern::PatternBuffer;
use sbtdex::{DnaIndex, build_from_path};

#[derive(Parser, Debug)]
#[command(name = "sbtdex", about = "Disk-resident genomic text index", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build every on-disk artifact for a FASTA-like text file.
    Build {
        /// Path to the input text.
        text_path: PathBuf,
        /// Super-symbol block width, 1-8.
        d: u8,
    },
    /// Search a previously built index for a pattern.
    Query {
        /// Path to the `.comp` file a prior `build` produced.
        comp_path: PathBuf,
        /// The ASCII pattern to search for.
        pattern: String,
        /// Super-symbol block width the index was built with.
        #[arg(long, default_value_t = 1)]
        d: u8,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match run(cli.command) {
        Ok(()) => ExitCode::from(0),
        Err(Failure::InvalidArgument(msg)) => {
            log::error!("{msg}");
            ExitCode::from(1)
        }
        Err(Failure::Io(err)) => {
            log::error!("{err}");
            ExitCode::from(2)
        }
    }
}

enum Failure {
    InvalidArgument(String),
    Io(sbtdex::error::DiskDexError),
}

fn run(command: Commands) -> Result<(), Failure> {
    match command {
        Commands::Build { text_path, d } => {
            let block_size = BlockSize::new(d)
                .map_err(|e| Failure::InvalidArgument(format!("invalid block size {d}: {e}")))?;
            let config = BuildConfig::new(block_size);
            let paths = build_from_path(&text_path, &config).map_err(Failure::Io)?;
            log::info!("built {}", paths.comp.display());
            log::info!("built {}", paths.sa.display());
            log::info!("built {}", paths.sbt.display());
            if !config.block_size.is_unblocked() {
                log::info!("built {}", paths.wt.display());
            }
            Ok(())
        }
        Commands::Query { comp_path, pattern, d } => {
            let block_size = BlockSize::new(d)
                .map_err(|e| Failure::InvalidArgument(format!("invalid block size {d}: {e}")))?;
            let config = BuildConfig::new(block_size);
            let text_path = strip_comp_extension(&comp_path)
                .ok_or_else(|| Failure::InvalidArgument(format!("{}: expected a `.comp` path", comp_path.display())))?;
            let index = DnaIndex::open(&text_path, &config).map_err(Failure::Io)?;
            let pattern_buf = PatternBuffer::from_ascii(&pattern);
            let result = index.query(&pattern_buf);
            if result.matched {
                println!(
                    "match: str_pos={} occurrences={} matched_len={}",
                    result.str_pos, result.occurrence_count, result.matched_len
                );
            } else {
                println!("no match (matched_len={})", result.matched_len);
            }
            Ok(())
        }
    }
}

fn strip_comp_extension(comp_path: &std::path::Path) -> Option<PathBuf> {
    let s = comp_path.as_os_str().to_str()?;
    s.strip_suffix(".comp").map(PathBuf::from)
}
