use std::io::BufRead;
use std::path::Path;

use crate::core::species_tree::{NodeKind, SpeciesTree, SpeciesTreeError};
use crate::parsing::{open_text, ParseError};
use crate::utils::validation::MAX_SPECIES;

/// A species tree together with the names of its leaves in species order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedSpeciesTree {
    pub tree: SpeciesTree,
    pub leaf_names: Vec<String>,
}

fn malformed(position: usize, reason: &str) -> SpeciesTreeError {
    SpeciesTreeError::Malformed {
        position,
        reason: reason.to_string(),
    }
}

/// Close the item ending at `position`: a pending leaf name, or an internal
/// node emitted at its `)`
fn finish_item(
    position: usize,
    name: &mut String,
    closed: &mut bool,
    kinds: &mut Vec<NodeKind>,
    leaf_names: &mut Vec<String>,
) -> Result<(), SpeciesTreeError> {
    if *closed {
        *closed = false;
    } else if name.is_empty() {
        return Err(malformed(position, "empty leaf name"));
    } else {
        kinds.push(NodeKind::Leaf);
        leaf_names.push(std::mem::take(name));
    }
    Ok(())
}

/// Parse a binary Newick tree such as `((A,B),C);`.
///
/// Leaves are numbered in order of appearance. Internal labels and branch
/// lengths are skipped. Anything after `;` is ignored.
///
/// # Errors
///
/// Returns `SpeciesTreeError::Malformed` for unbalanced parentheses, empty
/// leaves or nodes that do not have exactly two children, and
/// `SpeciesTreeError::Empty` if no leaf is found.
pub fn parse_newick(text: &str) -> Result<NamedSpeciesTree, SpeciesTreeError> {
    let mut kinds: Vec<NodeKind> = Vec::new();
    let mut leaf_names: Vec<String> = Vec::new();
    // Children seen so far for each open parenthesis
    let mut open: Vec<usize> = Vec::new();
    let mut name = String::new();
    // Inside an internal label or a branch length
    let mut skipping = false;
    // The item being read is an internal node that has already been emitted
    let mut closed = false;

    for (position, c) in text.char_indices() {
        match c {
            ';' => break,
            c if c.is_whitespace() => {}
            '(' => {
                if closed || !name.is_empty() {
                    return Err(malformed(position, "unexpected '('"));
                }
                open.push(0);
            }
            ',' | ')' => {
                finish_item(position, &mut name, &mut closed, &mut kinds, &mut leaf_names)?;
                skipping = false;
                let Some(count) = open.last_mut() else {
                    return Err(malformed(position, "unbalanced parentheses"));
                };
                *count += 1;
                if c == ')' {
                    if open.pop() != Some(2) {
                        return Err(malformed(position, "node must have exactly two children"));
                    }
                    kinds.push(NodeKind::Internal);
                    closed = true;
                    skipping = true;
                }
            }
            ':' => skipping = true,
            _ if skipping => {}
            _ => name.push(c),
        }
    }

    if !open.is_empty() {
        return Err(malformed(text.len(), "unbalanced parentheses"));
    }
    if !name.is_empty() {
        finish_item(text.len(), &mut name, &mut closed, &mut kinds, &mut leaf_names)?;
    }

    let tree = SpeciesTree::from_kinds(kinds)?;
    Ok(NamedSpeciesTree { tree, leaf_names })
}

/// Parse either a raw postfix string or a Newick tree.
///
/// Postfix leaves are named `S0`, `S1`, ... in species order.
///
/// # Errors
///
/// Returns the errors of [`SpeciesTree::from_postfix`] or [`parse_newick`].
pub fn parse_species_tree(text: &str) -> Result<NamedSpeciesTree, SpeciesTreeError> {
    let text = text.trim();
    if !text.is_empty() && text.chars().all(|c| matches!(c, '0' | '1' | 'N') || c.is_whitespace())
    {
        let tree = SpeciesTree::from_postfix(text)?;
        let leaf_names = (0..tree.species_count()).map(|k| format!("S{k}")).collect();
        return Ok(NamedSpeciesTree { tree, leaf_names });
    }
    parse_newick(text)
}

/// Load the species tree from the first non-empty line of a file.
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be read, `ParseError::Tree` if
/// the tree is malformed or has a different number of leaves than
/// `species_count`, and `ParseError::InvalidFormat` if it exceeds the species
/// limit.
pub fn load_species_tree(
    path: &Path,
    species_count: Option<usize>,
) -> Result<NamedSpeciesTree, ParseError> {
    let reader = open_text(path)?;
    let mut line = String::new();
    for next in reader.lines() {
        let next = next?;
        if !next.trim().is_empty() {
            line = next;
            break;
        }
    }

    let mut named = parse_species_tree(&line)?;
    if let Some(expected) = species_count {
        named.tree = named.tree.with_species_count(expected)?;
    }
    if named.tree.species_count() > MAX_SPECIES {
        return Err(ParseError::InvalidFormat(format!(
            "Species tree has {} leaves, maximum is {MAX_SPECIES}",
            named.tree.species_count()
        )));
    }
    Ok(named)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_newick() {
        let named = parse_newick("((A,B),C);").unwrap();
        assert_eq!(named.tree.to_string(), "11N1N");
        assert_eq!(named.leaf_names, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_labels_and_branch_lengths_are_skipped() {
        let named = parse_newick("((human:0.1,chimp:0.2)hominini:0.3, (mouse,rat)99)root;").unwrap();
        assert_eq!(named.tree.to_string(), "11N11NN");
        assert_eq!(named.leaf_names, vec!["human", "chimp", "mouse", "rat"]);
    }

    #[test]
    fn test_single_leaf() {
        let named = parse_newick("A;").unwrap();
        assert_eq!(named.tree.species_count(), 1);
        assert_eq!(named.leaf_names, vec!["A"]);
    }

    #[test]
    fn test_malformed_newick() {
        assert!(matches!(
            parse_newick("((A,B,C),D);"),
            Err(SpeciesTreeError::Malformed { .. })
        ));
        assert!(matches!(
            parse_newick("((A,B),C"),
            Err(SpeciesTreeError::Malformed { .. })
        ));
        assert!(matches!(
            parse_newick("(A,B));"),
            Err(SpeciesTreeError::Malformed { .. })
        ));
        assert!(matches!(
            parse_newick("(A,);"),
            Err(SpeciesTreeError::Malformed { .. })
        ));
        assert_eq!(parse_newick(";"), Err(SpeciesTreeError::Empty));
    }

    #[test]
    fn test_postfix_passthrough() {
        let named = parse_species_tree("11N1N").unwrap();
        assert_eq!(named.tree.species_count(), 3);
        assert_eq!(named.leaf_names, vec!["S0", "S1", "S2"]);
    }

    #[test]
    fn test_load_with_species_count() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tree.nwk");
        std::fs::write(&path, "\n((A,B),C);\n").unwrap();

        assert!(load_species_tree(&path, Some(3)).is_ok());
        assert!(matches!(
            load_species_tree(&path, Some(4)),
            Err(ParseError::Tree(SpeciesTreeError::SpeciesCountMismatch { .. }))
        ));
    }
}
