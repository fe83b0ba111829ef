use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "varhub", bin_name = "varhub", version, disable_help_subcommand = true)]
#[command(about = "Browse variable groups and secure files as a tree, a table or a matrix", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file to layer over the user config
    #[arg(long, global = true, value_name = "PATH", help_heading = "Options")]
    pub config: Option<PathBuf>,

    /// Verbose output (debug logs on stderr)
    #[arg(short, long, global = true, help_heading = "Options")]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Groups and secure files as a hierarchy
    Tree {
        #[command(flatten)]
        view: ViewArgs,

        /// Print only top-level rows
        #[arg(long)]
        collapsed: bool,
    },

    /// One row per variable
    Table {
        #[command(flatten)]
        view: ViewArgs,
    },

    /// One row per variable name, one column per group
    Matrix {
        #[command(flatten)]
        view: ViewArgs,
    },

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug, Clone, Copy)]
pub enum ConfigAction {
    /// Print a commented config template
    Gen,
    /// Print where the user config file is looked up
    Path,
}

#[derive(Args, Debug, Clone)]
pub struct ViewArgs {
    /// Library snapshot (JSON with variableGroups and secureFiles)
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Case-insensitive substring filter on names and values, secret ones included
    #[arg(short, long, value_name = "TEXT")]
    pub filter: Option<String>,

    /// Column to sort by: name, value, or (matrix only) a group name
    #[arg(short, long, value_name = "COLUMN")]
    pub sort: Option<String>,

    /// Sort descending
    #[arg(long, requires = "sort")]
    pub desc: bool,

    /// Set a value, adding the variable when missing (GROUP:NAME=VALUE)
    #[arg(long = "set", value_name = "GROUP:NAME=VALUE")]
    pub set: Vec<String>,

    /// Rename a variable (GROUP:NAME=NEW_NAME)
    #[arg(long = "rename", value_name = "GROUP:NAME=NEW")]
    pub rename: Vec<String>,

    /// Mark a variable deleted (GROUP:NAME; the matrix takes just NAME)
    #[arg(long = "delete", value_name = "GROUP:NAME")]
    pub delete: Vec<String>,

    /// Flip a variable between secret and plain (GROUP:NAME)
    #[arg(long = "toggle-secret", value_name = "GROUP:NAME")]
    pub toggle_secret: Vec<String>,

    /// Output format
    #[arg(long, value_enum, default_value_t = Output::Text)]
    pub output: Output,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Output {
    Text,
    Json,
}

pub fn parse_cli() -> Cli {
    Cli::parse()
}
