use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "exomart")]
#[command(version, about = "Build a star-schema exoplanet data mart from NASA catalog CSVs")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load catalogs, build the star schema and write the table store
    Etl {
        /// Primary exoplanet catalog CSV
        primary: PathBuf,

        /// Supplementary publication-date catalog CSV (repeatable, joined in order)
        #[arg(short, long = "supplement")]
        supplements: Vec<PathBuf>,

        /// Store directory (fact at top level, dimensions/ below)
        #[arg(short, long, default_value = ".")]
        out: PathBuf,
    },

    /// Read the persisted store as views and write aggregate tables to results/
    Analyze {
        /// Store directory written by the etl stage
        #[arg(short, long, default_value = ".")]
        store: PathBuf,
    },

    /// Run both stages back to back (separate engine sessions)
    Run {
        /// Primary exoplanet catalog CSV
        primary: PathBuf,

        /// Supplementary publication-date catalog CSV (repeatable, joined in order)
        #[arg(short, long = "supplement")]
        supplements: Vec<PathBuf>,

        /// Store directory
        #[arg(short, long, default_value = ".")]
        out: PathBuf,
    },

    /// List all dimension and aggregate table names
    ListTables,
}

impl Cli {
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
