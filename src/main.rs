mod args;
mod config;
mod encoder;
mod enricher;
mod error;
mod extractor;
mod features;
mod flow_table;
mod flows;
mod labeler;
mod merger;
mod nbaiot;
mod packet_features;
mod pcap;
mod protocols;
mod records;
mod subset;
mod table;

use std::path::Path;
use std::time::Instant;

use anyhow::{bail, Context};
use args::{Cli, Commands};
use clap::Parser;
use config::ConfigFile;
use env_logger::{Env, Target};
use error::RunReport;
use log::{debug, error, info};
use subset::SubsetMode;

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .target(Target::Stdout)
        .init();

    let cli = Cli::parse();

    let config = match load_config(cli.config_file.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!("Error loading configuration file: {:?}", e);
            std::process::exit(1);
        }
    };

    let start = Instant::now();
    match run(cli.command, config) {
        Ok(report) => {
            debug!("Final report: {:?}", report);
            info!(
                "Duration: {:.4} seconds",
                start.elapsed().as_secs_f64()
            );
        }
        Err(e) => {
            error!("{:#}", e);
            std::process::exit(1);
        }
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<ConfigFile> {
    let Some(path) = path else {
        return Ok(ConfigFile::default());
    };
    if !path.is_file() {
        bail!("configuration file {:?} does not exist", path);
    }
    let config: ConfigFile = confy::load_path(path)
        .with_context(|| format!("failed to parse configuration file {:?}", path))?;
    debug!("Loaded configuration from {:?}", path);
    Ok(config)
}

fn run(command: Commands, mut config: ConfigFile) -> anyhow::Result<RunReport> {
    let report = match command {
        Commands::Extract {
            pcap_dir,
            output_dir,
            active_timeout,
            idle_timeout,
        } => {
            if let Some(active_timeout) = active_timeout {
                config.extract.active_timeout = active_timeout;
            }
            if let Some(idle_timeout) = idle_timeout {
                config.extract.idle_timeout = idle_timeout;
            }
            extractor::run_extract(&pcap_dir, &output_dir, &config.extract)?
        }
        Commands::Enrich {
            input_dir,
            output_dir,
            profile,
        } => {
            if let Some(profile) = profile {
                config.enrich.profile = profile;
                config.enrich.selected_features = None;
            }
            enricher::run_enrich(&input_dir, &output_dir, &config.enrich)?
        }
        Commands::Nbaiot { input, output } => nbaiot::run_nbaiot(&input, &output, &config.nbaiot)?,
        Commands::Merge {
            input_dir,
            output,
            suffix,
        } => merger::run_merge(&input_dir, &output, &suffix)?,
        Commands::Encode {
            input_dir,
            output_dir,
        } => encoder::run_encode(&input_dir, &output_dir, &config.encode)?,
        Commands::Label { input, output } => labeler::run_label(&input, &output, &config.label)?,
        Commands::Subset {
            input,
            output,
            fraction,
            per_class,
            labels,
            seed,
        } => {
            if let Some(seed) = seed {
                config.subset.seed = seed;
            }
            let mode = match per_class {
                Some(cap) => SubsetMode::PerClass {
                    cap: cap.unwrap_or(config.subset.per_class),
                    labels,
                },
                None => SubsetMode::Fraction(fraction.unwrap_or(config.subset.fraction)),
            };
            subset::run_subset(&input, &output, &mode, &config.subset)?
        }
    };
    Ok(report)
}
