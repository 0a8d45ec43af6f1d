use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::matcher::TextMatchMode;

#[derive(Debug, Clone, Parser)]
#[command(name = "class-refs")]
#[command(about = "Find references to Java classes, fields, and methods in compiled class files")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Maven repository searched when no inputs are given.
    #[arg(long, value_name = "PATH", global = true)]
    pub m2: Option<PathBuf>,

    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Json, global = true)]
    pub format: OutputFormat,

    #[arg(short = 'o', long, value_name = "FILE", global = true)]
    pub output: Option<PathBuf>,

    /// Search threads (also `CLASS_REFS_THREADS`).
    #[arg(short = 'j', long, value_name = "N", global = true)]
    pub threads: Option<usize>,

    /// Log more (-v info, -vv debug, -vvv trace).
    #[arg(short = 'v', long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// References to a class: descriptors, instructions, handlers, annotations.
    Class {
        /// Internal (`com/Foo`) or dotted (`com.Foo`) class name. Omit to match every class.
        target: Option<String>,

        #[arg(short = 'm', long = "match", value_enum, default_value_t = TextMatchMode::Equal)]
        mode: TextMatchMode,

        /// `.class` files, jars, or directories.
        #[arg(value_name = "INPUT")]
        inputs: Vec<PathBuf>,
    },
    /// References to fields and methods. Unset targets match anything.
    Member {
        #[arg(long)]
        owner: Option<String>,

        #[arg(long)]
        name: Option<String>,

        #[arg(long = "desc", value_name = "DESCRIPTOR")]
        descriptor: Option<String>,

        /// Shorthand for `--owner/--name/--desc`, e.g. `com/Util.helper(I)Z`.
        #[arg(long, value_name = "OWNER.NAME[DESC]", conflicts_with_all = ["owner", "name"])]
        method: Option<String>,

        #[arg(short = 'm', long = "match", value_enum, default_value_t = TextMatchMode::Equal)]
        mode: TextMatchMode,

        #[arg(long, value_enum, value_name = "MODE")]
        owner_match: Option<TextMatchMode>,

        #[arg(long, value_enum, value_name = "MODE")]
        name_match: Option<TextMatchMode>,

        #[arg(long, value_enum, value_name = "MODE")]
        desc_match: Option<TextMatchMode>,

        #[arg(value_name = "INPUT")]
        inputs: Vec<PathBuf>,
    },
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Text,
}
