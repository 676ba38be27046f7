//! Aggregation-based coarsening.
//!
//! Fine-level nodes are grouped into disjoint aggregates using a strength-of-connection
//! graph (Vaněk, Mandel & Brezina, "Algebraic multigrid by smoothed aggregation for
//! second and fourth order elliptic problems", Computing 56, 1996):
//!
//! 1. node j is strongly coupled to i when `|a_ij| ≥ ε · sqrt(|a_ii · a_jj|)`;
//! 2. every free node whose whole strong neighborhood is still free seeds an aggregate;
//! 3. leftover nodes join the aggregate holding most of their strong neighbors;
//! 4. whatever remains is grouped with its still-free neighbors into new aggregates.
//!
//! Nodes without any off-diagonal nonzero are not aggregated at all.

use crate::error::AmgError;
use crate::matrix::sparse::CsrMatrix;

/// Strength threshold on the finest level; it halves on every coarser level.
pub const BASE_STRENGTH_THRESHOLD: f64 = 0.08;

/// Strength threshold for level `k`: `0.08 · 0.5^k`.
pub fn strength_threshold(level: usize) -> f64 {
    BASE_STRENGTH_THRESHOLD * 0.5f64.powi(level as i32)
}

/// Disjoint partition of (a subset of) the fine nodes.
#[derive(Debug, Clone)]
pub struct Aggregates {
    /// Members of every aggregate, in the order they were added.
    pub members: Vec<Vec<usize>>,
    /// Aggregate of every fine node; `None` for nodes left out.
    pub node_to_agg: Vec<Option<usize>>,
    /// Strongly coupled neighbors of every fine node, the node itself included.
    pub neighborhoods: Vec<Vec<usize>>,
    /// Position of every row's diagonal in the matrix' CSR arrays.
    pub diag: Vec<usize>,
}

impl Aggregates {
    /// Partition the rows of `a` with strength threshold `eps`.
    pub fn build(a: &CsrMatrix<f64>, eps: f64) -> Result<Self, AmgError> {
        let diag = a.find_diagonal()?;
        if let Some(i) = (0..diag.len()).find(|&i| a.values()[diag[i]] == 0.0) {
            return Err(AmgError::ZeroPivot(i));
        }
        let neighborhoods = strong_neighborhoods(a, &diag, eps);
        let n = a.nrows();

        let mut free = aggregable_nodes(a);
        let mut members: Vec<Vec<usize>> = Vec::new();
        let mut node_to_agg: Vec<Option<usize>> = vec![None; n];

        // Seed aggregates from fully free neighborhoods.
        for i in 0..n {
            if free[i] && neighborhoods[i].iter().all(|&j| free[j]) {
                let id = members.len();
                for &j in &neighborhoods[i] {
                    free[j] = false;
                    node_to_agg[j] = Some(id);
                }
                members.push(neighborhoods[i].clone());
            }
        }

        // Attach leftovers to the seed aggregate with the largest overlap. Overlaps are
        // counted against the seeds only and ties go to the lowest aggregate id.
        let seeds = node_to_agg.clone();
        let mut overlap = vec![0usize; members.len()];
        for i in 0..n {
            if !free[i] {
                continue;
            }
            let touched: Vec<usize> = neighborhoods[i].iter().filter_map(|&j| seeds[j]).collect();
            for &k in &touched {
                overlap[k] += 1;
            }
            let mut best: Option<(usize, usize)> = None;
            for &k in &touched {
                let better = match best {
                    None => true,
                    Some((count, id)) => overlap[k] > count || (overlap[k] == count && k < id),
                };
                if better {
                    best = Some((overlap[k], k));
                }
            }
            for &k in &touched {
                overlap[k] = 0;
            }
            if let Some((_, k)) = best {
                members[k].push(i);
                node_to_agg[i] = Some(k);
                free[i] = false;
            }
        }

        // Group what is left with its free neighbors.
        for i in 0..n {
            if !free[i] {
                continue;
            }
            let group: Vec<usize> = neighborhoods[i].iter().copied().filter(|&j| free[j]).collect();
            if group.is_empty() {
                continue;
            }
            let id = members.len();
            for &j in &group {
                free[j] = false;
                node_to_agg[j] = Some(id);
            }
            members.push(group);
        }

        Ok(Self { members, node_to_agg, neighborhoods, diag })
    }

    /// Number of aggregates, i.e. the size of the next coarser level.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Fine nodes that belong to no aggregate.
    pub fn unaggregated(&self) -> usize {
        self.node_to_agg.iter().filter(|k| k.is_none()).count()
    }
}

/// Strongly coupled neighbors of every row, diagonal included.
fn strong_neighborhoods(a: &CsrMatrix<f64>, diag: &[usize], eps: f64) -> Vec<Vec<usize>> {
    let values = a.values();
    (0..a.nrows())
        .map(|i| {
            let a_ii = values[diag[i]];
            a.row(i)
                .filter(|&(j, a_ij)| a_ij.abs() >= eps * (a_ii * values[diag[j]]).abs().sqrt())
                .map(|(j, _)| j)
                .collect()
        })
        .collect()
}

/// Rows with at least one nonzero off-diagonal entry.
fn aggregable_nodes(a: &CsrMatrix<f64>) -> Vec<bool> {
    (0..a.nrows())
        .map(|i| a.row(i).any(|(j, v)| j != i && v != 0.0))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn laplacian_1d(n: usize) -> CsrMatrix<f64> {
        let mut t = Vec::new();
        for i in 0..n {
            t.push((i, i, 2.0));
            if i > 0 {
                t.push((i, i - 1, -1.0));
            }
            if i + 1 < n {
                t.push((i, i + 1, -1.0));
            }
        }
        CsrMatrix::from_triplets(n, n, t)
    }

    fn assert_partition(aggs: &Aggregates, n: usize) {
        let mut seen = vec![false; n];
        for (k, agg) in aggs.members.iter().enumerate() {
            for &i in agg {
                assert!(!seen[i], "node {i} in two aggregates");
                seen[i] = true;
                assert_eq!(aggs.node_to_agg[i], Some(k));
            }
        }
        for i in 0..n {
            assert_eq!(seen[i], aggs.node_to_agg[i].is_some());
        }
    }

    #[test]
    fn threshold_halves_per_level() {
        assert_eq!(strength_threshold(0), 0.08);
        assert_eq!(strength_threshold(2), 0.02);
    }

    #[test]
    fn chain_aggregates() {
        let a = laplacian_1d(10);
        let aggs = Aggregates::build(&a, strength_threshold(0)).unwrap();
        // seeds at nodes 0, 3, 6 and 9
        assert_eq!(
            aggs.members,
            vec![vec![0, 1], vec![2, 3, 4], vec![5, 6, 7], vec![8, 9]]
        );
        assert_partition(&aggs, 10);
        assert_eq!(aggs.unaggregated(), 0);
    }

    #[test]
    fn chain_of_64_gives_22_aggregates() {
        let aggs = Aggregates::build(&laplacian_1d(64), strength_threshold(0)).unwrap();
        assert_eq!(aggs.len(), 22);
        assert_partition(&aggs, 64);
    }

    #[test]
    fn isolated_nodes_are_left_out() {
        // node 2 only has a diagonal entry
        let a = CsrMatrix::from_triplets(
            4,
            4,
            vec![
                (0, 0, 2.0), (0, 1, -1.0),
                (1, 0, -1.0), (1, 1, 2.0), (1, 3, -1.0),
                (2, 2, 5.0),
                (3, 1, -1.0), (3, 3, 2.0),
            ],
        );
        let aggs = Aggregates::build(&a, 0.08).unwrap();
        assert_eq!(aggs.node_to_agg[2], None);
        assert_eq!(aggs.unaggregated(), 1);
        assert_partition(&aggs, 4);
    }

    #[test]
    fn diagonal_matrix_has_no_aggregates() {
        let a = CsrMatrix::from_triplets(3, 3, vec![(0, 0, 1.0), (1, 1, 1.0), (2, 2, 1.0)]);
        let aggs = Aggregates::build(&a, 0.08).unwrap();
        assert!(aggs.is_empty());
    }

    #[test]
    fn weak_couplings_are_ignored() {
        // |a_01| = 0.01 < 0.08 * sqrt(1 * 1)
        let a = CsrMatrix::from_triplets(
            2,
            2,
            vec![(0, 0, 1.0), (0, 1, 0.01), (1, 0, 0.01), (1, 1, 1.0)],
        );
        let aggs = Aggregates::build(&a, 0.08).unwrap();
        assert_eq!(aggs.neighborhoods, vec![vec![0], vec![1]]);
        assert_eq!(aggs.members, vec![vec![0], vec![1]]);
    }

    fn graph_laplacian(n: usize, edges: &[(usize, usize)]) -> CsrMatrix<f64> {
        let mut degree = vec![1.0; n];
        let mut t = Vec::new();
        for &(i, j) in edges {
            t.push((i, j, -1.0));
            t.push((j, i, -1.0));
            degree[i] += 1.0;
            degree[j] += 1.0;
        }
        t.extend(degree.iter().enumerate().map(|(i, &d)| (i, i, d)));
        CsrMatrix::from_triplets(n, n, t)
    }

    #[test]
    fn enlargement_prefers_largest_overlap() {
        // two triangles seeded by nodes 0 and 3; node 6 touches 1 and 4, 5
        let edges = [(0, 1), (0, 2), (1, 2), (3, 4), (3, 5), (4, 5), (1, 6), (4, 6), (5, 6)];
        let aggs = Aggregates::build(&graph_laplacian(7, &edges), 0.08).unwrap();
        assert_eq!(aggs.members, vec![vec![0, 1, 2], vec![3, 4, 5, 6]]);
        assert_partition(&aggs, 7);
    }

    #[test]
    fn enlargement_tie_goes_to_lowest_id() {
        let edges = [(0, 1), (0, 2), (1, 2), (3, 4), (3, 5), (4, 5), (1, 6), (4, 6)];
        let aggs = Aggregates::build(&graph_laplacian(7, &edges), 0.08).unwrap();
        assert_eq!(aggs.members, vec![vec![0, 1, 2, 6], vec![3, 4, 5]]);
    }

    #[test]
    fn zero_diagonal() {
        let a = CsrMatrix::from_triplets(
            2,
            2,
            vec![(0, 0, 1.0), (0, 1, -1.0), (1, 0, -1.0), (1, 1, 0.0)],
        );
        assert_eq!(Aggregates::build(&a, 0.08).unwrap_err(), AmgError::ZeroPivot(1));
    }

    #[test]
    fn missing_diagonal() {
        let a = CsrMatrix::from_triplets(2, 2, vec![(0, 0, 1.0), (1, 0, 1.0)]);
        assert_eq!(
            Aggregates::build(&a, 0.08).unwrap_err(),
            AmgError::MissingDiagonal { row: 1 }
        );
    }
}
