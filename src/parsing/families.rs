use std::collections::BTreeSet;
use std::io::BufRead;
use std::path::Path;

use crate::parsing::{open_text, ParseError};
use crate::utils::validation::is_valid_gene_name;

/// A set of genes to reconcile together
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneFamily {
    /// 0-based ordinal among the kept lines
    pub id: usize,
    pub genes: BTreeSet<String>,
}

/// Parse a family file: one family per line, blank lines and `#` comments
/// skipped.
///
/// # Errors
///
/// Returns `ParseError::Io` on read failure or `ParseError::InvalidFormat`
/// for a gene name containing control characters.
pub fn parse_families<R: BufRead>(reader: R) -> Result<Vec<GeneFamily>, ParseError> {
    let mut families = Vec::new();

    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut genes = BTreeSet::new();
        for gene in line.split_whitespace() {
            if !is_valid_gene_name(gene) {
                return Err(ParseError::InvalidFormat(format!(
                    "Invalid gene name on family line {}",
                    i + 1
                )));
            }
            genes.insert(gene.to_string());
        }

        families.push(GeneFamily {
            id: families.len(),
            genes,
        });
    }

    Ok(families)
}

/// Load a family file, gzip-compressed or not.
///
/// # Errors
///
/// Returns the errors of [`open_text`] and [`parse_families`].
pub fn load_families(path: &Path) -> Result<Vec<GeneFamily>, ParseError> {
    parse_families(open_text(path)?)
}
