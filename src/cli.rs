use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use anyhow::Result;

use crate::core::{Engine, ProjectOverrides};

#[derive(Parser)]
#[command(name = "reftree")]
#[command(about = "Per-file reference graph: who uses what you declare, and what you use")]
#[command(version)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Overrides for the `[project]` section of the config
#[derive(Args, Debug, Clone, Default)]
pub struct ProjectArgs {
    /// Root directory to analyze
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// File extension to collect, e.g. `ts`
    #[arg(short, long)]
    pub extension: Option<String>,
}

impl From<ProjectArgs> for ProjectOverrides {
    fn from(args: ProjectArgs) -> Self {
        Self {
            root: args.root,
            extension: args.extension,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print every file with its Dependencies and References
    Tree {
        #[command(flatten)]
        project: ProjectArgs,

        /// Print the JSON snapshot instead of the text tree
        #[arg(long)]
        json: bool,
    },

    /// Print the Dependencies and References of one file
    Show {
        /// File to show
        file: PathBuf,

        #[command(flatten)]
        project: ProjectArgs,
    },

    /// Write the graph as JSON
    Export {
        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        project: ProjectArgs,
    },

    /// Print graph and collection statistics
    Stats {
        #[command(flatten)]
        project: ProjectArgs,
    },

    /// Write a default Reftree.toml
    Init {
        /// Target directory (defaults to current directory)
        #[arg(short, long)]
        path: Option<PathBuf>,

        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },
}

impl Cli {
    pub async fn execute(self, engine: Engine) -> Result<()> {
        match self.command {
            Commands::Tree { project, json } => engine.tree(project.into(), json).await,
            Commands::Show { file, project } => engine.show(file, project.into()).await,
            Commands::Export { output, project } => engine.export(output, project.into()).await,
            Commands::Stats { project } => engine.stats(project.into()).await,
            Commands::Init { path, force } => engine.init(path, force).await,
        }
    }
}
