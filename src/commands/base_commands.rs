use clap::{Parser, Subcommand};
use clap_complete::Shell;

#[derive(Parser)]
#[command(author, version, about)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Velocity, lead time, backlog, burn-down and current status of a project
    Overview {
        /// Path to Pivotal project config YAML
        #[arg(short, long)]
        config: String,
        /// Output YAML file
        #[arg(short, long)]
        output: String,
    },
    /// Weekly requested versus accepted stories per type
    Throughput {
        /// Path to Pivotal project config YAML
        #[arg(short, long)]
        config: String,
        /// Output YAML file
        #[arg(short, long)]
        output: String,
    },
    /// Open stories and how long they have been waiting
    Starvation {
        /// Path to Pivotal project config YAML
        #[arg(short, long)]
        config: String,
        /// Output YAML file
        #[arg(short, long)]
        output: String,
        /// Creation age bracket: 0 = under a week, 1 = 2-3 weeks, 2 = 3-4 weeks,
        /// 3 = 1-2 months, 4 = over 2 months; anything else shows all
        #[arg(short, long)]
        filter: Option<u32>,
    },
    /// Load of every developer, or the breakdown of a single one
    Developers {
        /// Path to Pivotal project config YAML
        #[arg(short, long)]
        config: String,
        /// Output YAML file
        #[arg(short, long)]
        output: String,
        /// Developer name (matched as a substring of the owner)
        #[arg(short, long)]
        developer: Option<String>,
    },
    /// Planned versus sidetracked and accumulated work per iteration
    Planning {
        /// Path to Pivotal project config YAML
        #[arg(short, long)]
        config: String,
        /// Output YAML file
        #[arg(short, long)]
        output: String,
        /// Iteration to follow up on, defaults to the current one
        #[arg(short, long)]
        iteration: Option<u32>,
    },
    /// Every story of the project
    All {
        /// Path to Pivotal project config YAML
        #[arg(short, long)]
        config: String,
        /// Output YAML file
        #[arg(short, long)]
        output: String,
    },
    /// Write every report of a project into one directory
    Reports {
        /// Path to Pivotal project config YAML
        #[arg(short, long)]
        config: String,
        /// Directory receiving one YAML file per report
        #[arg(short, long)]
        output_dir: String,
    },
    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}
