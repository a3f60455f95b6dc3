//! Loaders for the run's input files.
//!
//! - **Species tree**: one Newick line, or a raw postfix string over `{0,1,N}`
//! - **Ortholog pairs**: `S{i}_S{j}` files with `gene_i gene_j score` lines,
//!   optionally gzip-compressed
//! - **Gene families**: one family per line, gene names whitespace separated
//!
//! All loaders run before any family is processed; the resulting structures
//! are read-only afterwards.

pub mod families;
pub mod newick;
pub mod pairs;

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use flate2::read::GzDecoder;
use thiserror::Error;

use crate::core::species_tree::SpeciesTreeError;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid input format: {0}")]
    InvalidFormat(String),

    #[error("Invalid species tree: {0}")]
    Tree(#[from] SpeciesTreeError),
}

/// Open a text file, decompressing it if the name ends in `.gz`
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be opened.
pub fn open_text(path: &Path) -> Result<Box<dyn BufRead + Send>, ParseError> {
    let file = File::open(path)?;
    let gzipped = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("gz"));

    if gzipped {
        Ok(Box::new(BufReader::new(GzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}
