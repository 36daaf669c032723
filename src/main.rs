use clap::{Parser, Subcommand};
use fitcache::imaging::{ImageBackend, SelectedBackend, select_backend};
use fitcache::resize::Resizer;
use fitcache::{batch, config, output};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Requested bounding box. Either side may be omitted; not both.
#[derive(clap::Args, Clone, Copy)]
struct SizeArgs {
    /// Maximum output width in pixels
    #[arg(long, short = 'W', value_parser = clap::value_parser!(u32).range(1..))]
    width: Option<u32>,

    /// Maximum output height in pixels
    #[arg(long, short = 'H', value_parser = clap::value_parser!(u32).range(1..))]
    height: Option<u32>,
}

#[derive(Parser)]
#[command(name = "fitcache")]
#[command(version)]
#[command(about = "Aspect-fit JPEG resizing with an on-disk cache")]
#[command(long_about = "\
Aspect-fit JPEG resizing with an on-disk cache

Resized copies are written next to each source image, in a cache folder
(default .resized), named after the requested size:

  photos/
  ├── dawn.png
  └── .resized/
      ├── dawn-400x.jpg       # --width 400
      ├── dawn-x300.jpg       # --height 300
      └── dawn-400x300.jpg    # --width 400 --height 300

A file that already exists is returned as-is, without decoding the source.
Images are never enlarged. Set RUST_LOG=fitcache=debug for cache decisions.

Run 'fitcache gen-config' to print a documented config file.")]
struct Cli {
    /// Config file (missing file = defaults)
    #[arg(long, default_value = "fitcache.toml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resize one image and print the resulting path
    Resize {
        file: PathBuf,
        #[command(flatten)]
        size: SizeArgs,
    },
    /// Resize every image under a directory
    Batch {
        dir: PathBuf,
        #[command(flatten)]
        size: SizeArgs,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show which image backend would be used
    Backend,
    /// Print a stock config file with all options documented
    GenConfig,
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fitcache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Command::Resize { file, size } => {
            let (config, backend) = startup(&cli.config)?;
            let resizer = Resizer::new(&config.resize, backend);
            let path = resizer.resize(&file, size.width, size.height)?;
            println!("{}", path.display());
        }
        Command::Batch { dir, size, json } => {
            let (config, backend) = startup(&cli.config)?;
            init_thread_pool(&config.processing);
            let resizer = Resizer::new(&config.resize, backend);
            let report = batch::run_batch(&resizer, &dir, size.width, size.height);
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                output::print_batch_report(&report, &dir);
            }
            if report.failures > 0 {
                return Err(format!("{} image(s) failed to resize", report.failures).into());
            }
        }
        Command::Backend => {
            let (_, backend) = startup(&cli.config)?;
            println!("{}", backend.name());
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Load config and probe for a backend. Either failing aborts the command.
fn startup(
    config_path: &Path,
) -> Result<(config::Config, SelectedBackend), Box<dyn std::error::Error>> {
    let config = config::load_config(config_path)?;
    let backend = select_backend(config.backend.prefer)?;
    info!(backend = backend.name(), "selected image backend");
    Ok((config, backend))
}

/// Initialize the rayon thread pool based on processing config.
///
/// Capped at the number of available CPU cores.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
