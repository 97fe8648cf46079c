//! Sparse matrix representation and the linear operator interface.
//!
//! The constraint-coupling operator `D` has at most twelve non-zeros per
//! contact, so it is stored as a CSR matrix with one row per contact
//! (i.e. `Dᵀ`); both products `Dᵀ v` and `D γ` are taken from that layout.

use serde::{Deserialize, Serialize};

/// A linear map `y = A x` over flat `f64` vectors.
///
/// Mobility operators (force → velocity over 6 DOF per particle) and the
/// constraint maps implement this trait so the resolver never needs to
/// know whether an operator is assembled or matrix-free.
///
/// # Panics
///
/// Implementations panic if `x.len() != cols()` or `y.len() != rows()`;
/// callers validate dimensions once at the boundary.
pub trait LinearOperator: Send + Sync {
    /// Number of rows (length of the output).
    fn rows(&self) -> usize;

    /// Number of columns (length of the input).
    fn cols(&self) -> usize;

    /// Computes `y = A x`, overwriting `y`.
    fn apply(&self, x: &[f64], y: &mut [f64]);
}

/// Row-compressed sparse matrix.
///
/// Entries of row `i` live at `offsets[i]..offsets[i + 1]` in `columns`
/// and `values`, sorted by column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsrMatrix {
    pub rows: usize,
    pub cols: usize,
    pub offsets: Vec<usize>,
    pub columns: Vec<usize>,
    pub values: Vec<f64>,
}

impl CsrMatrix {
    /// Stored entries, duplicates included.
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Assembles `(row, col, value)` triplets.
    ///
    /// Duplicates stay separate entries; every product sums them.
    pub fn from_triplets(rows: usize, cols: usize, triplets: &[(usize, usize, f64)]) -> Self {
        let mut order: Vec<usize> = (0..triplets.len()).collect();
        order.sort_by_key(|&k| (triplets[k].0, triplets[k].1));

        let mut offsets = vec![0usize; rows + 1];
        for &(r, _, _) in triplets {
            offsets[r + 1] += 1;
        }
        for i in 0..rows {
            offsets[i + 1] += offsets[i];
        }

        let columns = order.iter().map(|&k| triplets[k].1).collect();
        let values = order.iter().map(|&k| triplets[k].2).collect();
        Self {
            rows,
            cols,
            offsets,
            columns,
            values,
        }
    }

    /// Entries of row `i` as `(col, value)` pairs.
    pub fn row(&self, i: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        let range = self.offsets[i]..self.offsets[i + 1];
        self.columns[range.clone()]
            .iter()
            .copied()
            .zip(self.values[range].iter().copied())
    }

    /// Computes `y = Aᵀ x`, overwriting `y`.
    pub fn apply_transpose(&self, x: &[f64], y: &mut [f64]) {
        assert_eq!(x.len(), self.rows, "transpose input length");
        assert_eq!(y.len(), self.cols, "transpose output length");
        y.fill(0.0);
        for (i, &xi) in x.iter().enumerate() {
            if xi == 0.0 {
                continue;
            }
            for (c, v) in self.row(i) {
                y[c] += v * xi;
            }
        }
    }
}

impl LinearOperator for CsrMatrix {
    fn rows(&self) -> usize {
        self.rows
    }

    fn cols(&self) -> usize {
        self.cols
    }

    fn apply(&self, x: &[f64], y: &mut [f64]) {
        assert_eq!(x.len(), self.cols, "input length");
        assert_eq!(y.len(), self.rows, "output length");
        for (i, yi) in y.iter_mut().enumerate() {
            *yi = self.row(i).map(|(c, v)| v * x[c]).sum();
        }
    }
}
