//! Centralized validation and helper functions.

/// Maximum number of genes in a single component (DOS protection)
pub const MAX_COMPONENT_GENES: usize = 100_000;

/// Maximum number of species in the species tree
pub const MAX_SPECIES: usize = 1_000;

/// Largest ortholog pair score accepted from a pair file
pub const MAX_PAIR_SCORE: f64 = 1.0e9;

/// Validate a gene identifier: non-empty, no whitespace or control characters.
///
/// # Examples
///
/// ```
/// use ortho_solver::utils::validation::is_valid_gene_name;
///
/// assert!(is_valid_gene_name("S0_gene12"));
/// assert!(!is_valid_gene_name(""));
/// assert!(!is_valid_gene_name("two words"));
/// ```
#[must_use]
pub fn is_valid_gene_name(s: &str) -> bool {
    !s.is_empty() && !s.chars().any(|c| c.is_whitespace() || c.is_control())
}

/// Check a component's gene count against the limit.
///
/// Returns an error message if the component is too large, None if it can be
/// processed.
///
/// # Example
/// ```ignore
/// if let Some(msg) = check_gene_limit(genes.len()) {
///     return Err(...);
/// }
/// ```
#[must_use]
pub fn check_gene_limit(count: usize) -> Option<String> {
    if count > MAX_COMPONENT_GENES {
        Some(format!(
            "Too many genes: {count} exceeds maximum of {MAX_COMPONENT_GENES}"
        ))
    } else {
        None
    }
}

/// File name of the ortholog pair file between two species
#[must_use]
pub fn pair_file_name(i: usize, j: usize) -> String {
    format!("S{i}_S{j}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gene_names() {
        assert!(is_valid_gene_name("ENSG00000139618"));
        assert!(is_valid_gene_name("a|b.1"));
        assert!(!is_valid_gene_name("tab\there"));
        assert!(!is_valid_gene_name("nul\0"));
    }

    #[test]
    fn test_gene_limit() {
        assert!(check_gene_limit(0).is_none());
        assert!(check_gene_limit(MAX_COMPONENT_GENES).is_none());
        assert!(check_gene_limit(MAX_COMPONENT_GENES + 1).is_some());
    }

    #[test]
    fn test_pair_file_name() {
        assert_eq!(pair_file_name(0, 3), "S0_S3");
    }
}
