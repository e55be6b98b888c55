//! Smoothed-aggregation algebraic multigrid preconditioner.
//!
//! The setup phase coarsens the matrix level by level until it has at most
//! `min` rows or no aggregates can be formed:
//!
//! 1. **Aggregation.** Strong neighbourhoods
//!    `N_i = {j : a_ij^2 >= eps^2 |a_ii a_jj|}` with
//!    `eps = coupling_threshold * coupling_decay^level` seed disjoint
//!    aggregates, which are then enlarged and finally completed from the
//!    remaining free nodes. A level on which every node stays alone is
//!    passed through unchanged so the smaller threshold gets another try.
//! 2. **Interpolation.** The tentative 0/1 prolongation is smoothed by one
//!    damped Jacobi step on the filtered matrix, and the coarse operator is
//!    the Galerkin product `I^T A I`. With `omega = 0` the tentative
//!    prolongation is used directly and the coarse operator is summed
//!    aggregate by aggregate.
//! 3. The coarsest matrix is densified and LU-factored once.
//!
//! Each application runs one cycle from a zero guess: SSOR pre-smoothing,
//! restriction, `gamma` recursive visits of the next level (V-cycle for 1,
//! W-cycle for 2), prolongation and SSOR post-smoothing.
//!
//! # Example
//!
//! ```rust
//! use ruvector_krylov::amg::AmgPreconditioner;
//! use ruvector_krylov::config::AmgConfig;
//! use ruvector_krylov::traits::Preconditioner;
//! use ruvector_krylov::types::CsrMatrix;
//!
//! let n = 100;
//! let mut entries = Vec::new();
//! for i in 0..n {
//!     entries.push((i, i, 2.0));
//!     if i > 0 { entries.push((i, i - 1, -1.0)); }
//!     if i + 1 < n { entries.push((i, i + 1, -1.0)); }
//! }
//! let a = CsrMatrix::<f64>::from_coo(n, n, entries);
//!
//! let mut amg = AmgPreconditioner::new(AmgConfig { min: 10, ..Default::default() }).unwrap();
//! amg.set_matrix(&a).unwrap();
//! assert!(amg.levels() > 1);
//!
//! let mut x = vec![0.0; n];
//! amg.apply(&vec![1.0; n], &mut x);
//! ```

use tracing::{debug, trace};

use crate::config::{AmgConfig, SsorConfig};
use crate::csc::CscMatrix;
use crate::dense::{DenseLu, DenseMatrix};
use crate::error::{PreconditionerError, SolverError};
use crate::ssor::SsorPreconditioner;
use crate::traits::{LinearOperator, Matrix, Preconditioner};
use crate::types::CsrMatrix;
use crate::validation::{square_csr_snapshot, validate_relaxation};

/// Pass-through levels tolerated before a non-coarsening hierarchy is cut
/// back to its last productive level.
const MAX_STALLED_LEVELS: usize = 8;

// ---------------------------------------------------------------------------
// Hierarchy records
// ---------------------------------------------------------------------------

/// A level above the coarsest one.
#[derive(Debug, Clone)]
struct Level {
    /// Galerkin operator of this level.
    matrix: CsrMatrix<f64>,
    /// Interpolation from the next coarser level to this one.
    interpolation: CscMatrix,
    pre_smoother: SsorPreconditioner,
    post_smoother: SsorPreconditioner,
    /// Solution, right-hand side and residual of this level.
    u: Vec<f64>,
    f: Vec<f64>,
    r: Vec<f64>,
}

/// Bottom of the recursion: a dense direct solve.
#[derive(Debug, Clone)]
struct CoarseLevel {
    lu: DenseLu,
    u: Vec<f64>,
    f: Vec<f64>,
}

/// Algebraic multigrid preconditioner.
#[derive(Debug, Clone)]
pub struct AmgPreconditioner {
    config: AmgConfig,
    levels: Vec<Level>,
    coarsest: Option<CoarseLevel>,
}

impl AmgPreconditioner {
    /// Unbound preconditioner.
    ///
    /// # Errors
    ///
    /// [`ParameterOutOfRange`](crate::error::ValidationError::ParameterOutOfRange)
    /// when a smoother relaxation
    /// factor lies outside `[0, 2]`.
    pub fn new(config: AmgConfig) -> Result<Self, SolverError> {
        validate_relaxation("omega_pre_forward", config.omega_pre_forward)?;
        validate_relaxation("omega_pre_reverse", config.omega_pre_reverse)?;
        validate_relaxation("omega_post_forward", config.omega_post_forward)?;
        validate_relaxation("omega_post_reverse", config.omega_post_reverse)?;
        Ok(Self {
            config,
            levels: Vec::new(),
            coarsest: None,
        })
    }

    /// Current configuration.
    pub fn config(&self) -> &AmgConfig {
        &self.config
    }

    /// Number of levels in the hierarchy, including the coarsest; zero
    /// before `set_matrix`.
    pub fn levels(&self) -> usize {
        match self.coarsest {
            Some(_) => self.levels.len() + 1,
            None => 0,
        }
    }

    /// Number of rows on every level, finest first.
    pub fn level_sizes(&self) -> Vec<usize> {
        let mut sizes: Vec<usize> = self.levels.iter().map(|l| l.matrix.rows).collect();
        if let Some(coarse) = &self.coarsest {
            sizes.push(coarse.lu.size());
        }
        sizes
    }

    /// Interpolation operator from level `level + 1` to level `level`.
    pub fn interpolation(&self, level: usize) -> Option<&CscMatrix> {
        self.levels.get(level).map(|l| &l.interpolation)
    }

    fn smoother_configs(&self) -> (SsorConfig, SsorConfig) {
        (
            SsorConfig {
                omega_forward: self.config.omega_pre_forward,
                omega_reverse: self.config.omega_pre_reverse,
                reverse: true,
            },
            SsorConfig {
                omega_forward: self.config.omega_post_forward,
                omega_reverse: self.config.omega_post_reverse,
                reverse: true,
            },
        )
    }

    fn run(&mut self, b: &[f64], x: &mut [f64], transpose: bool) {
        let n = self.level_sizes().first().copied().unwrap_or_else(|| {
            panic!("amg: set_matrix must be called before apply")
        });
        assert_eq!(b.len(), n, "amg: b length mismatch");
        assert_eq!(x.len(), n, "amg: x length mismatch");

        {
            let (f, u) = self.level_vectors(0);
            f.copy_from_slice(b);
            u.fill(0.0);
        }
        self.cycle(0, transpose);
        let (_, u) = self.level_vectors(0);
        x.copy_from_slice(u);
    }

    /// Right-hand side and solution vectors of `level`.
    fn level_vectors(&mut self, level: usize) -> (&mut [f64], &mut [f64]) {
        if level < self.levels.len() {
            let l = &mut self.levels[level];
            (&mut l.f, &mut l.u)
        } else {
            match self.coarsest.as_mut() {
                Some(c) => (&mut c.f, &mut c.u),
                None => panic!("amg: set_matrix must be called before apply"),
            }
        }
    }

    fn cycle(&mut self, k: usize, transpose: bool) {
        if k == self.levels.len() {
            if let Some(coarse) = self.coarsest.as_mut() {
                coarse.u.copy_from_slice(&coarse.f);
                if transpose {
                    coarse.lu.trans_solve(&mut coarse.u);
                } else {
                    coarse.lu.solve(&mut coarse.u);
                }
            }
            return;
        }

        let nu1 = self.config.nu1;
        let nu2 = self.config.nu2;
        let gamma = self.config.gamma;

        // Pre-smooth, then restrict the residual to a zero-guess coarse
        // problem.
        {
            let (fine, rest) = self.levels.split_at_mut(k + 1);
            let level = &mut fine[k];
            for _ in 0..nu1 {
                level.pre_smoother.relax(&level.f, &mut level.u);
            }
            level.r.copy_from_slice(&level.f);
            level.matrix.mult_add(-1.0, &level.u, &mut level.r);

            let (f, u) = match (rest.first_mut(), self.coarsest.as_mut()) {
                (Some(next), _) => (&mut next.f, &mut next.u),
                (None, Some(coarse)) => (&mut coarse.f, &mut coarse.u),
                (None, None) => return,
            };
            level.interpolation.trans_mult(&level.r, f);
            u.fill(0.0);
        }

        for _ in 0..gamma {
            self.cycle(k + 1, transpose);
        }

        // Prolong the correction, then post-smooth.
        let (fine, rest) = self.levels.split_at_mut(k + 1);
        let level = &mut fine[k];
        let coarse_u: &[f64] = match (rest.first(), self.coarsest.as_ref()) {
            (Some(next), _) => &next.u,
            (None, Some(coarse)) => &coarse.u,
            (None, None) => return,
        };
        level.interpolation.mult_add(1.0, coarse_u, &mut level.u);
        for _ in 0..nu2 {
            level.post_smoother.relax(&level.f, &mut level.u);
        }
    }
}

impl Preconditioner for AmgPreconditioner {
    fn set_matrix(&mut self, a: &dyn Matrix) -> Result<(), SolverError> {
        let mut current = square_csr_snapshot(a)?;
        if current.rows == 0 {
            return Err(PreconditionerError::EmptyMatrix.into());
        }

        self.levels.clear();
        self.coarsest = None;

        let (pre, post) = self.smoother_configs();
        let mut eps = self.config.coupling_threshold;
        // Consecutive levels on which every aggregate was a single node.
        let mut stalled = 0;

        while current.rows > self.config.min {
            let level = self.levels.len();
            let aggregation = Aggregation::build(&current, eps);
            let num_aggregates = aggregation.aggregates.len();

            if num_aggregates == 0 {
                debug!(level, rows = current.rows, "no aggregates, stopping hierarchy build");
                break;
            }

            let (interpolation, coarse) = if num_aggregates == current.rows {
                // Every coupling is weak at this threshold: pass the operator
                // through unchanged and retry with a smaller one.
                stalled += 1;
                if stalled > MAX_STALLED_LEVELS {
                    let first = self.levels.len() + 1 - stalled;
                    if let Some(fine) = self.levels.drain(first..).next() {
                        current = fine.matrix;
                    }
                    debug!(
                        level = first,
                        rows = current.rows,
                        eps,
                        "coarsening stalled, stopping hierarchy build"
                    );
                    break;
                }
                (
                    tentative_interpolation(&current, &aggregation),
                    aggregated_operator(&current, &aggregation),
                )
            } else {
                stalled = 0;
                if self.config.omega != 0.0 {
                    let interpolation =
                        smoothed_interpolation(&current, &aggregation, self.config.omega);
                    let coarse = galerkin(&current, &interpolation);
                    (interpolation, coarse)
                } else {
                    (
                        tentative_interpolation(&current, &aggregation),
                        aggregated_operator(&current, &aggregation),
                    )
                }
            };

            trace!(
                level,
                fine = current.rows,
                coarse = coarse.rows,
                nnz = coarse.nnz(),
                eps,
                "built multigrid level"
            );

            let n = current.rows;
            let pre_smoother = SsorPreconditioner::for_matrix(&current, pre.clone())?;
            let post_smoother = SsorPreconditioner::for_matrix(&current, post.clone())?;
            self.levels.push(Level {
                matrix: current,
                interpolation,
                pre_smoother,
                post_smoother,
                u: vec![0.0; n],
                f: vec![0.0; n],
                r: vec![0.0; n],
            });

            current = coarse;
            eps *= self.config.coupling_decay;
        }

        let n = current.rows;
        let lu = DenseLu::factor(&DenseMatrix::from_csr(&current))?;
        self.coarsest = Some(CoarseLevel {
            lu,
            u: vec![0.0; n],
            f: vec![0.0; n],
        });

        debug!(
            levels = self.levels(),
            sizes = ?self.level_sizes(),
            "multigrid hierarchy built"
        );
        Ok(())
    }

    fn apply(&mut self, b: &[f64], x: &mut [f64]) {
        self.run(b, x, false);
    }

    fn trans_apply(&mut self, b: &[f64], x: &mut [f64]) {
        self.run(b, x, true);
    }
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Partition of the nodes of one level into aggregates.
#[derive(Debug, Clone)]
struct Aggregation {
    /// Strong neighbourhood of every node, sorted, including the node.
    neighborhoods: Vec<Vec<usize>>,
    /// Members of every aggregate.
    aggregates: Vec<Vec<usize>>,
    /// Aggregate of every node; `None` for nodes that were never free.
    owner: Vec<Option<usize>>,
}

impl Aggregation {
    fn build(a: &CsrMatrix<f64>, eps: f64) -> Self {
        let n = a.rows;
        let diag: Vec<f64> = (0..n).map(|i| a.get(i, i)).collect();
        let eps2 = eps * eps;

        let mut neighborhoods = Vec::with_capacity(n);
        let mut free = vec![false; n];
        for i in 0..n {
            let mut strong = Vec::new();
            let mut has_diag = false;
            for (j, &v) in a.row_entries(i) {
                if j == i {
                    has_diag = true;
                    strong.push(j);
                    continue;
                }
                if v != 0.0 {
                    free[i] = true;
                }
                if v * v >= eps2 * (diag[i] * diag[j]).abs() {
                    strong.push(j);
                }
            }
            if !has_diag {
                let pos = strong.partition_point(|&j| j < i);
                strong.insert(pos, i);
            }
            neighborhoods.push(strong);
        }

        let mut aggregates: Vec<Vec<usize>> = Vec::new();
        let mut owner: Vec<Option<usize>> = vec![None; n];

        // Seed aggregates from neighbourhoods that are entirely free.
        for i in 0..n {
            if free[i] && neighborhoods[i].iter().all(|&j| free[j]) {
                let id = aggregates.len();
                for &j in &neighborhoods[i] {
                    free[j] = false;
                    owner[j] = Some(id);
                }
                aggregates.push(neighborhoods[i].clone());
            }
        }
        let seeded = owner.clone();

        // Attach free nodes to the seeded aggregate they overlap most.
        let mut counts = vec![0usize; aggregates.len()];
        let mut hit: Vec<usize> = Vec::new();
        for i in 0..n {
            if !free[i] {
                continue;
            }
            for &j in &neighborhoods[i] {
                if let Some(id) = seeded[j] {
                    if counts[id] == 0 {
                        hit.push(id);
                    }
                    counts[id] += 1;
                }
            }
            hit.sort_unstable();
            let mut best: Option<(usize, usize)> = None;
            for &id in &hit {
                if best.map_or(true, |(_, c)| counts[id] > c) {
                    best = Some((id, counts[id]));
                }
                counts[id] = 0;
            }
            hit.clear();

            if let Some((id, _)) = best {
                aggregates[id].push(i);
                owner[i] = Some(id);
                free[i] = false;
            }
        }

        // Remaining free nodes form aggregates with their free neighbours.
        for i in 0..n {
            if !free[i] {
                continue;
            }
            let id = aggregates.len();
            let members: Vec<usize> = neighborhoods[i]
                .iter()
                .copied()
                .filter(|&j| free[j])
                .collect();
            for &j in &members {
                free[j] = false;
                owner[j] = Some(id);
            }
            aggregates.push(members);
        }

        for members in &mut aggregates {
            members.sort_unstable();
        }

        Self {
            neighborhoods,
            aggregates,
            owner,
        }
    }
}

// ---------------------------------------------------------------------------
// Interpolation and coarse operators
// ---------------------------------------------------------------------------

/// Piecewise-constant prolongation: `P(i, owner(i)) = 1`.
fn tentative_interpolation(a: &CsrMatrix<f64>, agg: &Aggregation) -> CscMatrix {
    let entries = agg
        .owner
        .iter()
        .enumerate()
        .filter_map(|(i, c)| c.map(|c| (i, c, 1.0)));
    CscMatrix::from_coo(a.rows, agg.aggregates.len(), entries)
}

/// `P = (I - omega D_F^{-1} A_F) P_tent` over the filtered matrix `A_F`,
/// which keeps strong off-diagonals and folds weak ones into the diagonal.
fn smoothed_interpolation(a: &CsrMatrix<f64>, agg: &Aggregation, omega: f64) -> CscMatrix {
    let n = a.rows;
    let mut entries: Vec<(usize, usize, f64)> = Vec::new();

    for i in 0..n {
        let strong = &agg.neighborhoods[i];

        let mut filtered_diag = 0.0f64;
        for (j, &v) in a.row_entries(i) {
            if j == i {
                filtered_diag += v;
            } else if strong.binary_search(&j).is_err() {
                filtered_diag -= v;
            }
        }

        if let Some(c) = agg.owner[i] {
            entries.push((i, c, 1.0));
        }
        if filtered_diag == 0.0 {
            continue;
        }
        let scale = omega / filtered_diag;

        if let Some(c) = agg.owner[i] {
            entries.push((i, c, -scale * filtered_diag));
        }
        for (j, &v) in a.row_entries(i) {
            if j == i || strong.binary_search(&j).is_err() {
                continue;
            }
            if let Some(c) = agg.owner[j] {
                entries.push((i, c, -scale * v));
            }
        }
    }

    CscMatrix::from_coo(n, agg.aggregates.len(), entries)
}

/// Galerkin operator `I^T A I`.
fn galerkin(a: &CsrMatrix<f64>, interpolation: &CscMatrix) -> CsrMatrix<f64> {
    let ai = sparse_matmul(a, &interpolation.to_csr_matrix());
    sparse_matmul(&interpolation.transpose_csr(), &ai)
}

/// Coarse operator of the unsmoothed prolongation:
/// `Ac[owner(i)][owner(j)] += a_ij`.
fn aggregated_operator(a: &CsrMatrix<f64>, agg: &Aggregation) -> CsrMatrix<f64> {
    let nc = agg.aggregates.len();
    let mut entries = Vec::with_capacity(a.nnz());
    for i in 0..a.rows {
        let Some(ci) = agg.owner[i] else { continue };
        for (j, &v) in a.row_entries(i) {
            if let Some(cj) = agg.owner[j] {
                entries.push((ci, cj, v));
            }
        }
    }
    CsrMatrix::<f64>::from_coo(nc, nc, entries)
}

/// Sparse-sparse matrix multiplication: `C = A * B` (both in CSR).
///
/// Uses a dense accumulator per row for collecting partial sums, then
/// compresses into CSR. The accumulator is cleared between rows rather
/// than reallocated. Exact zeros produced by cancellation are dropped.
fn sparse_matmul(a: &CsrMatrix<f64>, b: &CsrMatrix<f64>) -> CsrMatrix<f64> {
    assert_eq!(
        a.cols, b.rows,
        "sparse_matmul: dimension mismatch {}x{} * {}x{}",
        a.rows, a.cols, b.rows, b.cols
    );

    let m = a.rows;
    let n = b.cols;
    let mut row_ptr = Vec::with_capacity(m + 1);
    let mut col_indices = Vec::new();
    let mut values = Vec::new();

    let mut acc = vec![0.0f64; n];
    let mut touched = vec![false; n];
    let mut nz_cols: Vec<usize> = Vec::new();

    row_ptr.push(0);

    for i in 0..m {
        for (k, &a_val) in a.row_entries(i) {
            for (j, &b_val) in b.row_entries(k) {
                if !touched[j] {
                    touched[j] = true;
                    nz_cols.push(j);
                }
                acc[j] += a_val * b_val;
            }
        }

        nz_cols.sort_unstable();
        for &j in &nz_cols {
            let v = acc[j];
            if v != 0.0 || j == i {
                col_indices.push(j);
                values.push(v);
            }
            acc[j] = 0.0;
            touched[j] = false;
        }
        nz_cols.clear();
        row_ptr.push(col_indices.len());
    }

    CsrMatrix {
        row_ptr,
        col_indices,
        values,
        rows: m,
        cols: n,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use approx::assert_relative_eq;

    fn laplacian_1d(n: usize) -> CsrMatrix<f64> {
        let mut entries = Vec::new();
        for i in 0..n {
            entries.push((i, i, 2.0));
            if i > 0 {
                entries.push((i, i - 1, -1.0));
            }
            if i + 1 < n {
                entries.push((i, i + 1, -1.0));
            }
        }
        CsrMatrix::<f64>::from_coo(n, n, entries)
    }

    fn dense(a: &CsrMatrix<f64>) -> Vec<Vec<f64>> {
        (0..a.rows)
            .map(|i| (0..a.cols).map(|j| a.get(i, j)).collect())
            .collect()
    }

    #[test]
    fn aggregation_of_path_graph() {
        let a = laplacian_1d(6);
        let agg = Aggregation::build(&a, 0.08);
        assert_eq!(agg.aggregates, vec![vec![0, 1], vec![2, 3, 4, 5]]);
        assert_eq!(
            agg.owner,
            vec![Some(0), Some(0), Some(1), Some(1), Some(1), Some(1)]
        );
        assert_eq!(agg.neighborhoods[0], vec![0, 1]);
        assert_eq!(agg.neighborhoods[3], vec![2, 3, 4]);
    }

    #[test]
    fn weak_couplings_leave_singletons() {
        // Off-diagonals far below eps * sqrt(a_ii a_jj).
        let a = CsrMatrix::<f64>::from_coo(
            3,
            3,
            vec![
                (0, 0, 10.0),
                (0, 1, 1e-4),
                (1, 0, 1e-4),
                (1, 1, 10.0),
                (2, 2, 10.0),
            ],
        );
        let agg = Aggregation::build(&a, 0.08);
        assert_eq!(agg.aggregates, vec![vec![0], vec![1]]);
        assert_eq!(agg.owner[2], None);
    }

    #[test]
    fn unsmoothed_coarse_operator_sums_blocks() {
        let a = laplacian_1d(6);
        let agg = Aggregation::build(&a, 0.08);
        let coarse = aggregated_operator(&a, &agg);
        assert_eq!(dense(&coarse), vec![vec![2.0, -1.0], vec![-1.0, 2.0]]);

        // Same as the Galerkin product with the tentative prolongation.
        let p = tentative_interpolation(&a, &agg);
        assert_eq!(dense(&galerkin(&a, &p)), dense(&coarse));
    }

    #[test]
    fn galerkin_matches_dense_triple_product() {
        let a = laplacian_1d(9);
        let agg = Aggregation::build(&a, 0.08);
        let p = smoothed_interpolation(&a, &agg, 2.0 / 3.0);
        let coarse = galerkin(&a, &p);

        let pd = dense(&p.to_csr_matrix());
        let ad = dense(&a);
        let nc = p.cols;
        for c in 0..nc {
            for d in 0..nc {
                let mut sum = 0.0;
                for i in 0..a.rows {
                    for j in 0..a.rows {
                        sum += pd[i][c] * ad[i][j] * pd[j][d];
                    }
                }
                assert_relative_eq!(coarse.get(c, d), sum, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn smoothed_prolongation_preserves_constants() {
        // A zero-row-sum operator annihilates constants, so P * 1 = 1.
        let n = 12;
        let mut entries = Vec::new();
        for i in 0..n {
            let mut diag = 0.0;
            if i > 0 {
                entries.push((i, i - 1, -1.0));
                diag += 1.0;
            }
            if i + 1 < n {
                entries.push((i, i + 1, -1.0));
                diag += 1.0;
            }
            entries.push((i, i, diag));
        }
        let a = CsrMatrix::<f64>::from_coo(n, n, entries);
        let agg = Aggregation::build(&a, 0.08);
        let p = smoothed_interpolation(&a, &agg, 2.0 / 3.0);

        let ones = vec![1.0; p.cols];
        let mut y = vec![0.0; n];
        p.mult(&ones, &mut y);
        for v in y {
            assert_relative_eq!(v, 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn small_matrix_gives_single_level() {
        let a = laplacian_1d(10);
        let mut amg = AmgPreconditioner::new(AmgConfig::default()).unwrap();
        amg.set_matrix(&a).unwrap();
        assert_eq!(amg.levels(), 1);
        assert_eq!(amg.level_sizes(), vec![10]);

        // A single level is an exact solve.
        let x_true: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let mut b = vec![0.0; 10];
        a.mult(&x_true, &mut b);
        let mut x = vec![0.0; 10];
        amg.apply(&b, &mut x);
        for i in 0..10 {
            assert_relative_eq!(x[i], x_true[i], epsilon = 1e-10);
        }
    }

    #[test]
    fn builds_multiple_levels() {
        let a = laplacian_1d(200);
        let mut amg = AmgPreconditioner::new(AmgConfig {
            min: 10,
            ..Default::default()
        })
        .unwrap();
        amg.set_matrix(&a).unwrap();

        let sizes = amg.level_sizes();
        assert!(sizes.len() > 2, "{sizes:?}");
        assert_eq!(sizes[0], 200);
        assert!(sizes.windows(2).all(|w| w[1] < w[0]), "{sizes:?}");
        assert_eq!(amg.interpolation(0).unwrap().rows, 200);
    }

    #[test]
    fn cycle_reduces_error() {
        let n = 150;
        let a = laplacian_1d(n);
        let mut amg = AmgPreconditioner::new(AmgConfig {
            min: 10,
            ..Default::default()
        })
        .unwrap();
        amg.set_matrix(&a).unwrap();

        // Stationary iteration x += M^{-1}(b - A x).
        let b = vec![1.0; n];
        let mut x = vec![0.0; n];
        let mut r = vec![0.0; n];
        let mut z = vec![0.0; n];
        let mut norms = Vec::new();
        for _ in 0..6 {
            r.copy_from_slice(&b);
            a.mult_add(-1.0, &x, &mut r);
            norms.push(crate::vector::norm2(&r));
            amg.apply(&r, &mut z);
            crate::vector::axpy(1.0, &z, &mut x);
        }
        assert!(norms[5] < 0.5 * norms[0], "{norms:?}");
    }

    #[test]
    fn transpose_matches_apply_for_symmetric_w_cycle() {
        let a = laplacian_1d(120);
        let mut amg = AmgPreconditioner::new(AmgConfig {
            min: 8,
            gamma: 2,
            ..Default::default()
        })
        .unwrap();
        amg.set_matrix(&a).unwrap();

        let b: Vec<f64> = (0..120).map(|i| ((i * 7) % 5) as f64 - 2.0).collect();
        let mut x1 = vec![0.0; 120];
        let mut x2 = vec![0.0; 120];
        amg.apply(&b, &mut x1);
        amg.trans_apply(&b, &mut x2);
        for i in 0..120 {
            assert_relative_eq!(x1[i], x2[i], epsilon = 1e-9, max_relative = 1e-9);
        }
    }

    #[test]
    fn setup_errors() {
        let mut amg = AmgPreconditioner::new(AmgConfig::default()).unwrap();
        let empty = CsrMatrix::<f64>::from_coo(0, 0, Vec::new());
        assert!(matches!(
            amg.set_matrix(&empty),
            Err(SolverError::Preconditioner(PreconditionerError::EmptyMatrix))
        ));

        let rect = CsrMatrix::<f64>::from_coo(2, 3, vec![(0, 0, 1.0)]);
        assert!(matches!(
            amg.set_matrix(&rect),
            Err(SolverError::InvalidInput(ValidationError::NotSquare { .. }))
        ));

        assert!(AmgPreconditioner::new(AmgConfig {
            omega_post_forward: 2.5,
            ..Default::default()
        })
        .is_err());
    }

    #[test]
    fn diagonal_matrix_never_coarsens() {
        let n = 60;
        let a = CsrMatrix::<f64>::from_coo(n, n, (0..n).map(|i| (i, i, 1.0 + i as f64)));
        let mut amg = AmgPreconditioner::new(AmgConfig::default()).unwrap();
        amg.set_matrix(&a).unwrap();
        assert_eq!(amg.levels(), 1);
    }

    fn tridiagonal(n: usize, lower: f64, diag: f64, upper: f64) -> CsrMatrix<f64> {
        let mut entries = Vec::new();
        for i in 0..n {
            entries.push((i, i, diag));
            if i > 0 {
                entries.push((i, i - 1, lower));
            }
            if i + 1 < n {
                entries.push((i, i + 1, upper));
            }
        }
        CsrMatrix::<f64>::from_coo(n, n, entries)
    }

    #[test]
    fn weak_fine_couplings_still_coarsen() {
        // |a_ij| / a_ii = 0.01: nothing is strong until eps has decayed.
        let a = tridiagonal(400, -1.0, 100.0, -1.0);
        let mut amg = AmgPreconditioner::new(AmgConfig::default()).unwrap();
        amg.set_matrix(&a).unwrap();

        let sizes = amg.level_sizes();
        assert!(sizes.len() >= 3, "{sizes:?}");
        assert_eq!(sizes[0], 400);
        assert!(*sizes.last().unwrap() < 400, "{sizes:?}");
        for level in 0..sizes.len() - 1 {
            let p = amg.interpolation(level).unwrap();
            assert_eq!((p.rows, p.cols), (sizes[level], sizes[level + 1]));
        }

        // Still a convergent stationary iteration.
        let x_true: Vec<f64> = (0..400).map(|i| ((i % 9) as f64 - 4.0) / 4.0).collect();
        let mut b = vec![0.0; 400];
        a.mult(&x_true, &mut b);
        let mut x = vec![0.0; 400];
        let mut r = b.clone();
        let mut dx = vec![0.0; 400];
        for _ in 0..10 {
            amg.apply(&r, &mut dx);
            for (xi, d) in x.iter_mut().zip(&dx) {
                *xi += d;
            }
            r.copy_from_slice(&b);
            a.mult_add(-1.0, &x, &mut r);
        }
        let err: f64 = x.iter().zip(&x_true).map(|(p, q)| (p - q).abs()).fold(0.0, f64::max);
        assert!(err < 1e-8, "{err}");
    }

    #[test]
    fn decoupled_matrix_is_cut_back_to_fine_level() {
        // Couplings stay weak for every threshold the decay can reach.
        let a = tridiagonal(60, -1e-9, 1.0, -1e-9);
        let mut amg = AmgPreconditioner::new(AmgConfig::default()).unwrap();
        amg.set_matrix(&a).unwrap();
        assert_eq!(amg.level_sizes(), vec![60]);
    }

    #[test]
    fn single_level_transpose_solves_with_a_transpose() {
        let a = tridiagonal(6, -1.5, 4.0, -0.5);
        let mut amg = AmgPreconditioner::new(AmgConfig::default()).unwrap();
        amg.set_matrix(&a).unwrap();
        assert_eq!(amg.levels(), 1);

        let b = [1.0, -2.0, 0.5, 3.0, 0.0, -1.0];
        let mut x = vec![0.0; 6];
        let mut xt = vec![0.0; 6];
        amg.apply(&b, &mut x);
        amg.trans_apply(&b, &mut xt);

        let mut ax = vec![0.0; 6];
        let mut atx = vec![0.0; 6];
        a.mult(&x, &mut ax);
        a.trans_mult(&xt, &mut atx);
        for i in 0..6 {
            assert_relative_eq!(ax[i], b[i], epsilon = 1e-12);
            assert_relative_eq!(atx[i], b[i], epsilon = 1e-12);
        }
        assert!(x.iter().zip(&xt).any(|(p, q)| (p - q).abs() > 1e-3));
    }

    #[test]
    fn unsmoothed_cycle_transpose_is_adjoint_on_nonsymmetric_matrix() {
        // Without smoothing sweeps the cycle is P A_c^{-1} P^T, so the
        // transpose cycle must be its exact adjoint.
        let n = 60;
        let a = tridiagonal(n, -1.3, 2.0, -0.7);
        let mut amg = AmgPreconditioner::new(AmgConfig {
            nu1: 0,
            nu2: 0,
            min: 8,
            ..Default::default()
        })
        .unwrap();
        amg.set_matrix(&a).unwrap();
        assert!(amg.levels() >= 2, "{:?}", amg.level_sizes());

        let u: Vec<f64> = (0..n).map(|i| ((i * 5) % 7) as f64 - 3.0).collect();
        let v: Vec<f64> = (0..n).map(|i| ((i * 3) % 11) as f64 - 5.0).collect();
        let mut mu = vec![0.0; n];
        let mut mtv = vec![0.0; n];
        let mut mv = vec![0.0; n];
        amg.apply(&u, &mut mu);
        amg.trans_apply(&v, &mut mtv);
        amg.apply(&v, &mut mv);

        let lhs: f64 = v.iter().zip(&mu).map(|(p, q)| p * q).sum();
        let rhs: f64 = mtv.iter().zip(&u).map(|(p, q)| p * q).sum();
        assert_relative_eq!(lhs, rhs, max_relative = 1e-10);
        assert!(mv.iter().zip(&mtv).any(|(p, q)| (p - q).abs() > 1e-6));
    }
}
