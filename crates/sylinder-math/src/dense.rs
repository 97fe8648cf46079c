//! Dense operator backed by `faer`.
//!
//! Used for small systems where assembling the full mobility matrix is
//! affordable, and to materialize any [`LinearOperator`] for inspection
//! (e.g. checking that a Schur complement is symmetric).

use faer::Mat;

use crate::sparse::LinearOperator;

/// Dense `rows × cols` operator stored as a `faer::Mat<f64>`.
#[derive(Debug, Clone)]
pub struct DenseOperator {
    matrix: Mat<f64>,
}

impl DenseOperator {
    /// Builds a dense operator from an entry function.
    pub fn from_fn(rows: usize, cols: usize, f: impl FnMut(usize, usize) -> f64) -> Self {
        Self {
            matrix: Mat::from_fn(rows, cols, f),
        }
    }

    /// Materializes an operator by applying it to every unit vector.
    pub fn from_operator(op: &dyn LinearOperator) -> Self {
        let rows = op.rows();
        let cols = op.cols();
        let mut matrix = Mat::<f64>::zeros(rows, cols);
        let mut unit = vec![0.0; cols];
        let mut column = vec![0.0; rows];
        for j in 0..cols {
            unit[j] = 1.0;
            op.apply(&unit, &mut column);
            for (i, &v) in column.iter().enumerate() {
                matrix[(i, j)] = v;
            }
            unit[j] = 0.0;
        }
        Self { matrix }
    }

    /// Entry `(i, j)`.
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.matrix[(i, j)]
    }

    /// Largest absolute asymmetry `|A_ij - A_ji|`.
    pub fn asymmetry(&self) -> f64 {
        let n = self.matrix.nrows().min(self.matrix.ncols());
        let mut worst = 0.0_f64;
        for i in 0..n {
            for j in (i + 1)..n {
                worst = worst.max((self.matrix[(i, j)] - self.matrix[(j, i)]).abs());
            }
        }
        worst
    }
}

impl LinearOperator for DenseOperator {
    fn rows(&self) -> usize {
        self.matrix.nrows()
    }

    fn cols(&self) -> usize {
        self.matrix.ncols()
    }

    fn apply(&self, x: &[f64], y: &mut [f64]) {
        assert_eq!(x.len(), self.matrix.ncols(), "input length");
        assert_eq!(y.len(), self.matrix.nrows(), "output length");
        let rhs = Mat::<f64>::from_fn(x.len(), 1, |i, _| x[i]);
        let out = &self.matrix * &rhs;
        for (i, yi) in y.iter_mut().enumerate() {
            *yi = out[(i, 0)];
        }
    }
}
