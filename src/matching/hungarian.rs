//! Maximum-weight perfect matching on a square bipartite graph.
//!
//! Kuhn–Munkres in the equality-subgraph formulation: rows start labeled with
//! their best edge, columns with zero, and only *tight* edges
//! (`label(row) + label(col) == weight`) may be used. Alternating trees are
//! grown from a free row over tight edges; when the tree stalls the labels are
//! shifted by the smallest slack, which keeps every matched edge tight and
//! exposes at least one new tight edge into the unvisited columns.
//!
//! Slack per column is maintained incrementally, so one augmentation costs
//! O(N²) and the whole solve O(N³).

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MatchError {
    #[error("Cost matrix row {row} has {found} columns, expected {expected}")]
    NotSquare {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("Negative weight {weight} at ({row}, {col})")]
    NegativeWeight { row: usize, col: usize, weight: i64 },

    #[error("Weight at ({row}, {col}) exceeds the limit of {limit} for a {n}x{n} matrix")]
    WeightOverflow {
        row: usize,
        col: usize,
        n: usize,
        limit: i64,
    },
}

/// Largest cell weight accepted in an `n`×`n` matrix.
///
/// Label updates and the matching total stay within `i64` as long as every
/// cell is at most this.
#[must_use]
pub fn max_cell_weight(n: usize) -> i64 {
    let n = i64::try_from(n.max(1)).unwrap_or(i64::MAX);
    i64::MAX / 4 / n
}

/// Dense N×N matrix of non-negative integer weights, row-major
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CostMatrix {
    n: usize,
    weights: Vec<i64>,
}

impl CostMatrix {
    /// An all-zero N×N matrix
    #[must_use]
    pub fn zeros(n: usize) -> Self {
        Self {
            n,
            weights: vec![0; n * n],
        }
    }

    /// Build from explicit rows.
    ///
    /// # Errors
    ///
    /// Returns `MatchError::NotSquare` if any row length differs from the row
    /// count, `MatchError::NegativeWeight` for a negative entry, or
    /// `MatchError::WeightOverflow` for an entry above [`max_cell_weight`].
    pub fn from_rows(rows: &[Vec<i64>]) -> Result<Self, MatchError> {
        let n = rows.len();
        let mut weights = Vec::with_capacity(n * n);
        for (row, values) in rows.iter().enumerate() {
            if values.len() != n {
                return Err(MatchError::NotSquare {
                    row,
                    expected: n,
                    found: values.len(),
                });
            }
            for (col, &weight) in values.iter().enumerate() {
                if weight < 0 {
                    return Err(MatchError::NegativeWeight { row, col, weight });
                }
                if weight > max_cell_weight(n) {
                    return Err(MatchError::WeightOverflow {
                        row,
                        col,
                        n,
                        limit: max_cell_weight(n),
                    });
                }
                weights.push(weight);
            }
        }
        Ok(Self { n, weights })
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.n
    }

    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> i64 {
        self.weights[row * self.n + col]
    }

    /// Add a non-negative amount to one cell.
    ///
    /// # Errors
    ///
    /// Returns `MatchError::WeightOverflow` if the cell would exceed
    /// [`max_cell_weight`]; the cell is left unchanged.
    pub fn add(&mut self, row: usize, col: usize, amount: i64) -> Result<(), MatchError> {
        let limit = max_cell_weight(self.n);
        let cell = &mut self.weights[row * self.n + col];
        match cell.checked_add(amount.max(0)) {
            Some(sum) if sum <= limit => {
                *cell = sum;
                Ok(())
            }
            _ => Err(MatchError::WeightOverflow {
                row,
                col,
                n: self.n,
                limit,
            }),
        }
    }
}

/// An optimal assignment: `assignment[row] == col`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matching {
    pub assignment: Vec<usize>,
    pub total_weight: i64,
}

/// Solve the maximum-weight perfect matching for `matrix`.
///
/// Ties resolve to the first tight edge found scanning rows, then columns, in
/// index order. Any optimum is correct; callers must not rely on which one.
#[must_use]
pub fn max_weight_matching(matrix: &CostMatrix) -> Matching {
    let n = matrix.size();
    if n == 0 {
        return Matching {
            assignment: Vec::new(),
            total_weight: 0,
        };
    }

    let mut solver = Solver::new(matrix);
    solver.seed_greedy();
    while let Some(root) = solver.first_free_row() {
        solver.augment_from(root);
    }

    let assignment: Vec<usize> = solver
        .row_match
        .iter()
        .map(|col| col.unwrap_or_default())
        .collect();
    let total_weight = assignment
        .iter()
        .enumerate()
        .map(|(row, &col)| matrix.get(row, col))
        .sum();

    Matching {
        assignment,
        total_weight,
    }
}

struct Solver<'a> {
    matrix: &'a CostMatrix,
    n: usize,
    row_label: Vec<i64>,
    col_label: Vec<i64>,
    row_match: Vec<Option<usize>>,
    col_match: Vec<Option<usize>>,
}

impl<'a> Solver<'a> {
    fn new(matrix: &'a CostMatrix) -> Self {
        let n = matrix.size();
        let row_label = (0..n)
            .map(|row| (0..n).map(|col| matrix.get(row, col)).max().unwrap_or(0))
            .collect();
        Self {
            matrix,
            n,
            row_label,
            col_label: vec![0; n],
            row_match: vec![None; n],
            col_match: vec![None; n],
        }
    }

    fn slack(&self, row: usize, col: usize) -> i64 {
        self.row_label[row] + self.col_label[col] - self.matrix.get(row, col)
    }

    /// Initial matching from tight edges, first free column per row
    fn seed_greedy(&mut self) {
        for row in 0..self.n {
            for col in 0..self.n {
                if self.col_match[col].is_none() && self.slack(row, col) == 0 {
                    self.row_match[row] = Some(col);
                    self.col_match[col] = Some(row);
                    break;
                }
            }
        }
    }

    fn first_free_row(&self) -> Option<usize> {
        self.row_match.iter().position(Option::is_none)
    }

    /// Grow an alternating tree from `root` until an augmenting path is found,
    /// then flip it. `root` is matched afterwards.
    fn augment_from(&mut self, root: usize) {
        let n = self.n;
        let mut in_s = vec![false; n];
        let mut in_t = vec![false; n];
        let mut rows_in_s = vec![root];
        // Tree parent of each column: the S row that reaches it by a tight edge
        let mut col_parent = vec![root; n];
        let mut min_slack: Vec<i64> = (0..n).map(|col| self.slack(root, col)).collect();
        in_s[root] = true;

        loop {
            let next = (0..n).find(|&col| !in_t[col] && min_slack[col] == 0);
            let Some(col) = next else {
                // Neighborhood of S equals T: shift labels by the smallest slack
                let alpha = (0..n)
                    .filter(|&col| !in_t[col])
                    .map(|col| min_slack[col])
                    .min()
                    .unwrap_or(0);
                for &row in &rows_in_s {
                    self.row_label[row] -= alpha;
                }
                for col in 0..n {
                    if in_t[col] {
                        self.col_label[col] += alpha;
                    } else {
                        min_slack[col] -= alpha;
                    }
                }
                continue;
            };

            match self.col_match[col] {
                None => {
                    self.flip_path(root, col, &col_parent);
                    return;
                }
                Some(row) => {
                    in_t[col] = true;
                    if !in_s[row] {
                        in_s[row] = true;
                        rows_in_s.push(row);
                        for c in 0..n {
                            let s = self.slack(row, c);
                            if !in_t[c] && s < min_slack[c] {
                                min_slack[c] = s;
                                col_parent[c] = row;
                            }
                        }
                    }
                }
            }
        }
    }

    /// Flip matched/unmatched edges along the path ending at free `col`
    fn flip_path(&mut self, root: usize, mut col: usize, col_parent: &[usize]) {
        loop {
            let row = col_parent[col];
            let previous = self.row_match[row];
            self.row_match[row] = Some(col);
            self.col_match[col] = Some(row);
            match previous {
                Some(prev_col) if row != root => col = prev_col,
                _ => return,
            }
        }
    }
}
