//! Command-line interface for ortho-solver.
//!
//! This module implements the CLI using clap. Available commands:
//!
//! - **reconcile**: Reconcile gene families against a species tree and write
//!   gene events and ortholog groups
//! - **label**: Label parallel trees directly, for checking the solvers
//!
//! ## Usage
//!
//! ```text
//! # Reconcile families using S{i}_S{j} pair files in ./pairs
//! ortho-solver reconcile tree.nwk families.txt --pairs-dir pairs \
//!     --gene-info gene_info.txt --ortho-groups groups.tsv
//!
//! # JSON summary for scripting
//! ortho-solver reconcile tree.nwk families.txt -o info.txt -g groups.tsv --format json
//!
//! # Label two layers against a three-species tree
//! ortho-solver label 11N1N 10N0N 11N1N --strategy tree-centric
//! ```

use clap::{Parser, Subcommand};

pub mod label;
pub mod reconcile;

#[derive(Parser)]
#[command(name = "ortho-solver")]
#[command(author = "Fulcrum Genomics")]
#[command(version)]
#[command(about = "Reconcile gene families with a species tree to call ortholog groups")]
#[command(
    long_about = "ortho-solver assigns ortholog groups across many species.\n\nFor each gene family it:\n- Merges genes into parallel layers by maximum-weight matching of pairwise ortholog scores\n- Labels ancestral presence on every layer with the fewest presence/absence changes\n- Calls gene births, duplications and losses, and reports the surviving ortholog groups"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Reconcile gene families and write events and ortholog groups
    Reconcile(reconcile::ReconcileArgs),

    /// Label parallel trees against a species tree
    Label(label::LabelArgs),
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Tsv,
}
