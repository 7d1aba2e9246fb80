use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::consts;

#[derive(Parser, Debug)]
#[command(name = "swbench")]
#[command(author, version, about = "Shopware load-test harness", long_about = None)]
pub struct Args {
    /// Log debug output
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the Locust load test for benchmarking Shopware based on configuration
    Run {
        /// Scenario configuration file
        #[arg(short, long, default_value = consts::DEFAULT_CONFIG_FILE)]
        config: PathBuf,

        /// Custom duration that overrides the one defined in the scenario configuration file
        #[arg(short, long)]
        duration: Option<String>,

        /// Directory containing locustfile.py, defaults to the current directory
        #[arg(short, long)]
        working_dir: Option<PathBuf>,

        /// Use the cached sitemap fixtures instead of downloading sitemap.xml
        #[arg(long, default_value_t = false)]
        skip_sitemap: bool,
    },
}
