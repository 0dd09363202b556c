use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tokio::signal;
use tokio::task;

use kiln::config::Config;
use kiln::image::{Manifest, ManifestProducer};
use kiln::log::{LogLevel, Logger};
use kiln::orchestration::{BuildSummary, Pipeline};
use kiln::{Error, Result};

/// Kiln - parallel container image builder with dependency-ordered pipelines
#[derive(Parser, Debug)]
#[command(name = "kiln")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to the config file (default: ~/.kiln/kiln.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short = 'd', long, global = true)]
    pub debug: bool,

    /// Suppress console output below errors
    #[arg(short = 'q', long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Build the images in a manifest, in dependency order
    Build {
        /// Image manifest file
        #[arg(short, long, default_value = "images.toml")]
        manifest: PathBuf,

        /// Build worker pool size
        #[arg(long)]
        threads: Option<usize>,

        /// Push worker pool size
        #[arg(long)]
        push_threads: Option<usize>,

        /// Additional attempts after the first failed run of a task
        #[arg(long)]
        retries: Option<u32>,

        /// Push images after a successful build
        #[arg(long)]
        push: bool,

        /// Summary output format
        #[arg(long, value_enum, default_value_t = Format::Plain)]
        format: Format,
    },

    /// List manifest images and their parents
    List {
        /// Image manifest file
        #[arg(short, long, default_value = "images.toml")]
        manifest: PathBuf,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum Format {
    Plain,
    Json,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        match err {
            Error::Interrupted => std::process::exit(130),
            _ => {
                eprintln!("kiln: {}", err);
                std::process::exit(1);
            }
        }
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => Config::default_path()?,
    };
    let mut config = Config::load(&config_path)?;

    let level = if cli.debug {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };
    if let Some(dir) = &config.logs_dir {
        std::fs::create_dir_all(dir)?;
    }
    let logger = Logger::new(level, cli.quiet, config.logs_dir.clone());

    match cli.command {
        Command::List { manifest } => {
            let manifest = Manifest::load(&manifest)?;
            for image in &manifest.images {
                match &image.parent {
                    Some(parent) => println!("{} <- {}", image.name, parent),
                    None => println!("{}", image.name),
                }
            }
            Ok(())
        }
        Command::Build {
            manifest,
            threads,
            push_threads,
            retries,
            push,
            format,
        } => {
            if let Some(threads) = threads {
                config.threads = threads;
            }
            if let Some(push_threads) = push_threads {
                config.push_threads = push_threads;
            }
            if let Some(retries) = retries {
                config.retries = retries;
            }
            config.push = config.push || push;
            config.validate()?;
            config.check_engine()?;

            let manifest = Manifest::load(&manifest)?;
            let producer =
                ManifestProducer::new(manifest, &config.engine, config.push, logger.clone());

            let pipeline = Pipeline::new(&config, logger.clone());
            let handle = pipeline.handle();
            let mut worker = task::spawn_blocking(move || {
                let mut producer = producer;
                pipeline.run(&mut producer)
            });

            let summary = tokio::select! {
                res = &mut worker => res.map_err(|e| Error::WorkerJoin(e.to_string()))??,
                _ = signal::ctrl_c() => {
                    logger.warn("Interrupt received; press Ctrl-C again to force exit");
                    handle.interrupt();
                    tokio::select! {
                        res = &mut worker => res.map_err(|e| Error::WorkerJoin(e.to_string()))??,
                        _ = signal::ctrl_c() => {
                            logger.warn("Force exit");
                            std::process::exit(130);
                        }
                    }
                }
            };

            print_summary(&summary, format)?;
            if !summary.all_succeeded() {
                return Err(Error::TaskFailed(format!(
                    "{} image(s) failed",
                    summary.failed.len()
                )));
            }
            Ok(())
        }
    }
}

fn print_summary(summary: &BuildSummary, format: Format) -> Result<()> {
    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(summary)?),
        Format::Plain => {
            for name in &summary.succeeded {
                println!("ok   {}", name);
            }
            for name in &summary.failed {
                println!("FAIL {}", name);
            }
        }
    }
    Ok(())
}
