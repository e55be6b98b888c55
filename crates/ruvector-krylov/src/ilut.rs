//! Dual-threshold incomplete LU factorization (ILUT).
//!
//! Row `i` is expanded into a dense work row and eliminated against the
//! already-factored rows `k < i`, in increasing `k`. Multipliers at or below
//! `tau * ||a_i||_2` are dropped instead of eliminated. The row is then
//! compacted: entries at or below the same threshold go, and of the rest
//! only the `nl + fill` largest lower and `nu + fill` largest upper entries
//! stay, where `nl`/`nu` count the original row's entries in each triangle.
//! The diagonal always stays.

use std::collections::BTreeSet;

use tracing::debug;

use crate::config::IlutConfig;
use crate::error::{PreconditionerError, SolverError};
use crate::traits::{Matrix, Preconditioner};
use crate::triangular::LuFactor;
use crate::types::CsrMatrix;
use crate::validation::square_csr_snapshot;
use crate::vector::norm2;

/// ILUT preconditioner.
#[derive(Debug, Clone, Default)]
pub struct IlutPreconditioner {
    config: IlutConfig,
    factor: Option<LuFactor>,
}

/// One row of the factor under construction, sorted by column.
#[derive(Debug, Clone, Default)]
struct SparseRow {
    cols: Vec<usize>,
    vals: Vec<f64>,
    diag: usize,
}

impl IlutPreconditioner {
    /// Unbound preconditioner.
    pub fn new(config: IlutConfig) -> Self {
        Self {
            config,
            factor: None,
        }
    }

    /// Current configuration.
    pub fn config(&self) -> &IlutConfig {
        &self.config
    }

    /// The factor computed by the last `set_matrix`.
    pub fn factor(&self) -> Option<&LuFactor> {
        self.factor.as_ref()
    }

    fn bound(&self) -> &LuFactor {
        self.factor
            .as_ref()
            .unwrap_or_else(|| panic!("ilut: set_matrix must be called before apply"))
    }
}

impl Preconditioner for IlutPreconditioner {
    fn set_matrix(&mut self, a: &dyn Matrix) -> Result<(), SolverError> {
        let factor = factor_ilut(&square_csr_snapshot(a)?, self.config.tau, self.config.fill)?;
        debug!(
            rows = factor.matrix().rows,
            nnz = factor.matrix().nnz(),
            "ilut factor built"
        );
        self.factor = Some(factor);
        Ok(())
    }

    fn apply(&mut self, b: &[f64], x: &mut [f64]) {
        self.bound().solve(b, x);
    }

    fn trans_apply(&mut self, b: &[f64], x: &mut [f64]) {
        self.bound().trans_solve(b, x);
    }
}

fn factor_ilut(a: &CsrMatrix<f64>, tau: f64, fill: usize) -> Result<LuFactor, PreconditionerError> {
    let n = a.rows;

    let mut rows: Vec<SparseRow> = Vec::with_capacity(n);
    for i in 0..n {
        let diag = a
            .diagonal_index(i)
            .ok_or(PreconditionerError::MissingDiagonal { row: i })?;
        let start = a.row_ptr[i];
        let end = a.row_ptr[i + 1];
        rows.push(SparseRow {
            cols: a.col_indices[start..end].to_vec(),
            vals: a.values[start..end].to_vec(),
            diag: diag - start,
        });
    }
    if n > 0 && rows[0].vals[rows[0].diag] == 0.0 {
        return Err(PreconditionerError::ZeroPivot { row: 0 });
    }

    // Dense work row and the list of its touched columns.
    let mut w = vec![0.0f64; n];
    let mut touched = vec![false; n];
    let mut nz: Vec<usize> = Vec::new();
    let mut lower: BTreeSet<usize> = BTreeSet::new();

    for i in 1..n {
        let (done, rest) = rows.split_at_mut(i);
        let row_i = &mut rest[0];

        let taui = tau * norm2(&row_i.vals);
        let nl = row_i.diag;
        let nu = row_i.cols.len() - row_i.diag - 1;

        for (&c, &v) in row_i.cols.iter().zip(&row_i.vals) {
            w[c] = v;
            touched[c] = true;
            nz.push(c);
            if c < i {
                lower.insert(c);
            }
        }

        while let Some(k) = lower.pop_first() {
            let row_k = &done[k];
            let pivot = row_k.vals[row_k.diag];
            if pivot == 0.0 {
                return Err(PreconditionerError::ZeroPivot { row: k });
            }

            let lik = w[k] / pivot;
            if lik.abs() <= taui {
                w[k] = 0.0;
                continue;
            }
            w[k] = lik;

            for idx in (row_k.diag + 1)..row_k.cols.len() {
                let j = row_k.cols[idx];
                if !touched[j] {
                    touched[j] = true;
                    nz.push(j);
                }
                w[j] -= lik * row_k.vals[idx];
                if j < i {
                    lower.insert(j);
                }
            }
        }

        *row_i = gather(&w, &nz, i, taui, nl + fill, nu + fill);
        if row_i.vals[row_i.diag] == 0.0 {
            return Err(PreconditionerError::ZeroPivot { row: i });
        }

        for &c in &nz {
            w[c] = 0.0;
            touched[c] = false;
        }
        nz.clear();
    }

    // Pack into one CSR matrix.
    let mut row_ptr = Vec::with_capacity(n + 1);
    let mut col_indices = Vec::new();
    let mut values = Vec::new();
    let mut diag_ind = Vec::with_capacity(n);
    row_ptr.push(0);
    for row in rows {
        diag_ind.push(col_indices.len() + row.diag);
        col_indices.extend_from_slice(&row.cols);
        values.extend_from_slice(&row.vals);
        row_ptr.push(col_indices.len());
    }

    Ok(LuFactor::new(
        CsrMatrix {
            row_ptr,
            col_indices,
            values,
            rows: n,
            cols: n,
        },
        diag_ind,
    ))
}

/// Compact the dense work row `w` of row `i` back into sparse form.
fn gather(
    w: &[f64],
    nz: &[usize],
    i: usize,
    taui: f64,
    lower_budget: usize,
    upper_budget: usize,
) -> SparseRow {
    let mut lower: Vec<usize> = Vec::new();
    let mut upper: Vec<usize> = Vec::new();
    let mut sorted_nz = nz.to_vec();
    sorted_nz.sort_unstable();
    for &c in &sorted_nz {
        if c == i || w[c].abs() <= taui {
            continue;
        }
        if c < i {
            lower.push(c);
        } else {
            upper.push(c);
        }
    }

    // Stable: equal magnitudes keep column order.
    lower.sort_by(|&p, &q| w[q].abs().total_cmp(&w[p].abs()));
    upper.sort_by(|&p, &q| w[q].abs().total_cmp(&w[p].abs()));
    lower.truncate(lower_budget);
    upper.truncate(upper_budget);
    lower.sort_unstable();
    upper.sort_unstable();

    let mut cols = Vec::with_capacity(lower.len() + 1 + upper.len());
    cols.extend_from_slice(&lower);
    cols.push(i);
    cols.extend_from_slice(&upper);
    let vals = cols.iter().map(|&c| w[c]).collect();

    SparseRow {
        cols,
        vals,
        diag: lower.len(),
    }
}
