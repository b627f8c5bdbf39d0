//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueHint};

/// Organization tree explorer: browse, search and script a department hierarchy
#[derive(Parser, Debug)]
#[command(name = "orgtree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-d info, -dd debug, -ddd trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub debug: u8,

    /// Project directory holding .orgtree.toml (default: cwd)
    #[arg(short = 'C', long, global = true, value_hint = ValueHint::DirPath)]
    pub project_dir: Option<PathBuf>,

    /// Seed document to load (overrides seed_file from settings)
    #[arg(short, long, global = true, value_hint = ValueHint::FilePath)]
    pub seed: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the hierarchy as a tree
    Tree {
        /// Filter and expand for this search query
        #[arg(short, long)]
        query: Option<String>,
        /// Expand every department
        #[arg(short, long)]
        all: bool,
    },

    /// List departments matching a query, with their ancestor path
    Search {
        /// Case-insensitive substring
        query: String,
    },

    /// List all departments in preorder
    Flatten,

    /// List departments that can take a child
    Parents,

    /// Show aggregate statistics
    Stats,

    /// Run a TOML request script against the loaded hierarchy
    Apply {
        /// Script with [[request]] entries
        #[arg(value_hint = ValueHint::FilePath)]
        script: PathBuf,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Show config paths
    Path,

    /// Create config template
    Init {
        /// Create global config
        #[arg(short, long)]
        global: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    // https://docs.rs/clap/latest/clap/_derive/_tutorial/index.html#testing
    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn given_tree_with_query_when_parsing_then_flags_are_read() {
        let cli = Cli::try_parse_from(["orgtree", "-dd", "--seed", "org.toml", "tree", "-q", "react"])
            .unwrap();
        assert_eq!(cli.debug, 2);
        assert_eq!(cli.seed, Some(PathBuf::from("org.toml")));
        match cli.command {
            Some(Commands::Tree { query, all }) => {
                assert_eq!(query.as_deref(), Some("react"));
                assert!(!all);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
