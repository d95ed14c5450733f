use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "dicegame-warehouse")]
#[command(version, about = "Build a star-schema warehouse and quality report from Dice Game CSV exports")]
pub struct Cli {
    /// Settings file (TOML); defaults to the per-user config file if present
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load, transform, analyze, validate and export
    Run {
        /// Directory containing the source CSV files
        input_dir: PathBuf,

        /// Output directory (defaults to `output.dir` from settings)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also write the warehouse tables to this SQLite database
        #[arg(long)]
        sqlite: Option<PathBuf>,

        /// Only export these warehouse tables (comma-separated)
        #[arg(short, long, value_delimiter = ',')]
        include: Option<Vec<String>>,

        /// Exclude these warehouse tables (comma-separated)
        #[arg(short, long, value_delimiter = ',')]
        exclude: Option<Vec<String>>,

        /// Show the terminal dashboard instead of log lines
        #[arg(long)]
        tui: bool,

        /// Exit with an error when the quality report fails
        #[arg(long)]
        fail_on_quality: bool,
    },

    /// Load, transform and validate without writing anything
    Check {
        /// Directory containing the source CSV files
        input_dir: PathBuf,
    },

    /// List source and warehouse tables with their keys
    ListTables,
}

impl Cli {
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run() {
        let cli = Cli::try_parse_from([
            "dicegame-warehouse",
            "run",
            "data",
            "--include",
            "payment_fact,user_dimension",
            "--fail-on-quality",
            "--config",
            "dice.toml",
        ])
        .unwrap();

        assert_eq!(cli.config, Some(PathBuf::from("dice.toml")));
        match cli.command {
            Commands::Run {
                input_dir,
                include,
                fail_on_quality,
                tui,
                ..
            } => {
                assert_eq!(input_dir, PathBuf::from("data"));
                assert_eq!(
                    include,
                    Some(vec!["payment_fact".to_string(), "user_dimension".to_string()])
                );
                assert!(fail_on_quality);
                assert!(!tui);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
