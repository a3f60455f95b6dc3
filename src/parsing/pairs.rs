use std::io::BufRead;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::core::orthology::OrthologyGraph;
use crate::parsing::{open_text, ParseError};
use crate::utils::validation::{is_valid_gene_name, pair_file_name, MAX_PAIR_SCORE};

/// One scored orthologous pair from an `S{i}_S{j}` file
#[derive(Debug, Clone, PartialEq)]
pub struct OrthologPair {
    pub gene_a: String,
    pub gene_b: String,
    pub score: f64,
}

/// Parse `gene_a gene_b score` lines.
///
/// Blank lines are skipped. `source` names the input in error messages.
///
/// # Errors
///
/// Returns `ParseError::Io` on read failure, or `ParseError::InvalidFormat`
/// for a line with fewer than three fields, an invalid gene name, or a score
/// that is not a finite number in `0..=MAX_PAIR_SCORE`.
pub fn parse_pairs<R: BufRead>(reader: R, source: &str) -> Result<Vec<OrthologPair>, ParseError> {
    let mut pairs = Vec::new();

    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let line_num = i + 1;

        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.is_empty() {
            continue;
        }
        if fields.len() < 3 {
            return Err(ParseError::InvalidFormat(format!(
                "{source} line {line_num} has fewer than 3 fields"
            )));
        }

        let (gene_a, gene_b) = (fields[0], fields[1]);
        if !is_valid_gene_name(gene_a) || !is_valid_gene_name(gene_b) {
            return Err(ParseError::InvalidFormat(format!(
                "{source} line {line_num} has an invalid gene name"
            )));
        }

        let score: f64 = fields[2].parse().map_err(|_| {
            ParseError::InvalidFormat(format!(
                "Invalid score on {source} line {line_num}: '{}'",
                fields[2]
            ))
        })?;
        if !score.is_finite() || score < 0.0 {
            return Err(ParseError::InvalidFormat(format!(
                "Score on {source} line {line_num} must be a non-negative number, got {score}"
            )));
        }
        if score > MAX_PAIR_SCORE {
            return Err(ParseError::InvalidFormat(format!(
                "Score on {source} line {line_num} exceeds maximum of {MAX_PAIR_SCORE}, got {score}"
            )));
        }

        pairs.push(OrthologPair {
            gene_a: gene_a.to_string(),
            gene_b: gene_b.to_string(),
            score,
        });
    }

    Ok(pairs)
}

/// Locate the pair file for species `i` and `j`, preferring the plain file
fn find_pair_file(dir: &Path, i: usize, j: usize) -> Option<PathBuf> {
    let plain = dir.join(pair_file_name(i, j));
    if plain.is_file() {
        return Some(plain);
    }
    let gz = dir.join(format!("{}.gz", pair_file_name(i, j)));
    gz.is_file().then_some(gz)
}

/// Read one pair file; `None` if it does not exist
fn read_pair_file(dir: &Path, i: usize, j: usize) -> Result<Option<Vec<OrthologPair>>, ParseError> {
    let Some(path) = find_pair_file(dir, i, j) else {
        return Ok(None);
    };
    let reader = open_text(&path)?;
    parse_pairs(reader, &path.display().to_string()).map(Some)
}

/// Load every `S{i}_S{j}` file (`i < j < species_count`) under `dir`.
///
/// Files are read in parallel on the current rayon pool and merged in
/// `(i, j)` order, so the resulting graph does not depend on scheduling.
/// Missing or empty files are reported as warnings.
///
/// # Errors
///
/// Returns the first parse error in `(i, j)` order.
pub fn load_pair_directory(dir: &Path, species_count: usize) -> Result<OrthologyGraph, ParseError> {
    let species_pairs: Vec<(usize, usize)> = (0..species_count)
        .flat_map(|i| (i + 1..species_count).map(move |j| (i, j)))
        .collect();

    let loaded: Vec<Result<Option<Vec<OrthologPair>>, ParseError>> = species_pairs
        .par_iter()
        .map(|&(i, j)| read_pair_file(dir, i, j))
        .collect();

    let mut graph = OrthologyGraph::new();
    for (&(i, j), result) in species_pairs.iter().zip(loaded) {
        let name = pair_file_name(i, j);
        match result? {
            None => warn!("Cannot open pair file {name}"),
            Some(pairs) if pairs.is_empty() => warn!("No data loaded from pair file {name}"),
            Some(pairs) => {
                debug!("Loaded {} pairs from {name}", pairs.len());
                for pair in pairs {
                    graph.add_pair(&pair.gene_a, i, &pair.gene_b, j, pair.score);
                }
            }
        }
    }

    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pairs() {
        let text = "a1 b1 12.5\n\na2\tb2\t3\n";
        let pairs = parse_pairs(text.as_bytes(), "S0_S1").unwrap();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].gene_a, "a1");
        assert_eq!(pairs[1].gene_b, "b2");
        assert!((pairs[0].score - 12.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_parse_pairs_errors() {
        let err = parse_pairs("a b\n".as_bytes(), "S0_S1").unwrap_err();
        assert!(err.to_string().contains("line 1"));

        let err = parse_pairs("a b 1\na b x\n".as_bytes(), "S0_S1").unwrap_err();
        assert!(err.to_string().contains("line 2"));

        assert!(parse_pairs("a b -1\n".as_bytes(), "S0_S1").is_err());
        assert!(parse_pairs("a b NaN\n".as_bytes(), "S0_S1").is_err());
    }

    #[test]
    fn test_parse_pairs_score_limit() {
        let at_limit = format!("a b {MAX_PAIR_SCORE}\n");
        assert_eq!(parse_pairs(at_limit.as_bytes(), "S0_S1").unwrap().len(), 1);

        let err = parse_pairs("a b 1\nc d 1e19\n".as_bytes(), "S0_S1").unwrap_err();
        assert!(matches!(err, ParseError::InvalidFormat(_)));
        assert!(err.to_string().contains("line 2"));
        assert!(err.to_string().contains("exceeds maximum"));
    }

    #[test]
    fn test_load_directory_with_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("S0_S1"), "a b 10\n").unwrap();
        std::fs::write(dir.path().join("S1_S2"), "b c 5\n").unwrap();

        let graph = load_pair_directory(dir.path(), 3).unwrap();
        assert_eq!(graph.gene_count(), 3);
        assert_eq!(graph.pair_count(), 2);
        assert_eq!(graph.species_of("c"), Some(2));
        assert_eq!(graph.score("b", "a"), Some(10.0));
    }

    #[test]
    fn test_load_gzipped_pair_file() {
        use flate2::write::GzEncoder;
        use flate2::Compression;
        use std::io::Write;

        let dir = tempfile::tempdir().unwrap();
        let file = std::fs::File::create(dir.path().join("S0_S1.gz")).unwrap();
        let mut encoder = GzEncoder::new(file, Compression::default());
        encoder.write_all(b"x y 7\n").unwrap();
        encoder.finish().unwrap();

        let graph = load_pair_directory(dir.path(), 2).unwrap();
        assert_eq!(graph.score("x", "y"), Some(7.0));
    }
}
