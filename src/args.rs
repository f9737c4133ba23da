use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::enricher::FeatureProfile;

#[derive(Debug, Parser)]
#[clap(author, version, about)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,

    /// TOML configuration file overriding the built-in defaults
    #[clap(long, global = true)]
    pub config_file: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Turn every labeled capture under a folder into a base flow CSV
    Extract {
        /// Folder walked recursively for .pcap/.pcapng files
        pcap_dir: PathBuf,

        /// Folder receiving one <capture>_base.csv per capture
        output_dir: PathBuf,

        /// The maximum time a flow is allowed to last in seconds
        #[clap(long)]
        active_timeout: Option<u64>,

        /// The maximum time with no packets for a flow in seconds
        #[clap(long)]
        idle_timeout: Option<u64>,
    },

    /// Compute statistical and wavelet features for every base flow CSV
    Enrich {
        input_dir: PathBuf,

        output_dir: PathBuf,

        /// Output column list to produce
        #[clap(long, value_enum)]
        profile: Option<FeatureProfile>,
    },

    /// Compute N-BaIoT style features per flow id
    Nbaiot { input: PathBuf, output: PathBuf },

    /// Concatenate every CSV of a folder sharing a name suffix
    Merge {
        input_dir: PathBuf,

        output: PathBuf,

        /// File name suffix selecting the files to merge
        #[clap(long, default_value = "_combined.csv")]
        suffix: String,
    },

    /// Min-max scale numeric columns and one-hot encode categorical ones
    Encode {
        input_dir: PathBuf,
        output_dir: PathBuf,
    },

    /// Map textual labels and connection states to integer codes
    Label { input: PathBuf, output: PathBuf },

    /// Draw a reproducible random or class-balanced subset
    Subset {
        input: PathBuf,

        output: PathBuf,

        /// Share of all rows to keep (default taken from the configuration)
        #[clap(long, group = "mode")]
        fraction: Option<f64>,

        /// Maximum number of rows kept per class; without a value the
        /// configured cap is used
        #[clap(long, group = "mode")]
        per_class: Option<Option<usize>>,

        /// Classes to keep in per-class mode (default: all)
        #[clap(long, num_args = 1.., requires = "per_class")]
        labels: Option<Vec<String>>,

        /// Seed of the random generator
        #[clap(long)]
        seed: Option<u64>,
    },
}
