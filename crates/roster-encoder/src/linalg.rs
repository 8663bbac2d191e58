//! Small dense matrix type used by the encoder layers
//!
//! Row-major, `f64`. Only the handful of operations the layers need.

use rand::Rng;

/// Row-major dense matrix
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    /// All-zero matrix
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Build from rows; all rows must have the same length
    pub fn from_rows(rows: &[Vec<f64>]) -> Option<Self> {
        let cols = rows.first().map(Vec::len).unwrap_or(0);
        if rows.iter().any(|r| r.len() != cols) {
            return None;
        }
        Some(Self {
            rows: rows.len(),
            cols,
            data: rows.iter().flatten().copied().collect(),
        })
    }

    /// Glorot-uniform initialized matrix
    pub fn glorot<R: Rng>(rows: usize, cols: usize, rng: &mut R) -> Self {
        let limit = (6.0 / (rows + cols).max(1) as f64).sqrt();
        let data = (0..rows * cols).map(|_| rng.gen_range(-limit..limit)).collect();
        Self { rows, cols, data }
    }

    /// Number of rows
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Row slice
    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    /// Mutable row slice
    pub fn row_mut(&mut self, i: usize) -> &mut [f64] {
        &mut self.data[i * self.cols..(i + 1) * self.cols]
    }

    /// Element at `(i, j)`
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.cols + j]
    }

    /// Rows as owned vectors
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        (0..self.rows).map(|i| self.row(i).to_vec()).collect()
    }

    /// Matrix product `self × other`
    ///
    /// Callers guarantee `self.cols == other.rows`.
    pub fn matmul(&self, other: &Matrix) -> Matrix {
        debug_assert_eq!(self.cols, other.rows);
        let mut out = Matrix::zeros(self.rows, other.cols);
        for i in 0..self.rows {
            let lhs = self.row(i);
            let dst = out.row_mut(i);
            for (k, a) in lhs.iter().enumerate() {
                if *a == 0.0 {
                    continue;
                }
                for (d, b) in dst.iter_mut().zip(other.row(k)) {
                    *d += a * b;
                }
            }
        }
        out
    }

    /// Element-wise sum; shapes must match
    pub fn add(&mut self, other: &Matrix) {
        debug_assert_eq!((self.rows, self.cols), (other.rows, other.cols));
        for (a, b) in self.data.iter_mut().zip(&other.data) {
            *a += b;
        }
    }

    /// Add `bias` to every row
    pub fn add_row_vector(&mut self, bias: &[f64]) {
        for i in 0..self.rows {
            for (v, b) in self.row_mut(i).iter_mut().zip(bias) {
                *v += b;
            }
        }
    }

    /// Apply `f` to every element
    pub fn map_inplace(&mut self, f: impl Fn(f64) -> f64) {
        for v in &mut self.data {
            *v = f(*v);
        }
    }

    /// Horizontal concatenation of matrices with equal row counts
    pub fn hstack(parts: &[&Matrix]) -> Matrix {
        let rows = parts.first().map(|m| m.rows).unwrap_or(0);
        let cols = parts.iter().map(|m| m.cols).sum();
        let mut out = Matrix::zeros(rows, cols);
        for i in 0..rows {
            let mut offset = 0;
            for part in parts {
                out.row_mut(i)[offset..offset + part.cols].copy_from_slice(part.row(i));
                offset += part.cols;
            }
        }
        out
    }

    /// Scale each row to unit L2 norm
    ///
    /// Rows with norm below 1e-12 are left as they are.
    pub fn l2_normalize_rows(&mut self) {
        for i in 0..self.rows {
            let row = self.row_mut(i);
            let norm = row.iter().map(|v| v * v).sum::<f64>().sqrt();
            if norm > 1e-12 {
                for v in row.iter_mut() {
                    *v /= norm;
                }
            }
        }
    }

    /// Mean of squared row norms
    pub fn mean_squared_norm(&self) -> f64 {
        if self.rows == 0 {
            return 0.0;
        }
        self.data.iter().map(|v| v * v).sum::<f64>() / self.rows as f64
    }

    /// Whether every element is finite
    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|v| v.is_finite())
    }

    pub(crate) fn data_mut(&mut self) -> &mut [f64] {
        &mut self.data
    }

    pub(crate) fn data(&self) -> &[f64] {
        &self.data
    }
}

/// Dot product of two equal-length slices
pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Row-wise mean over neighbor lists: `out_i = mean_{j ∈ N(i)} x_j`
///
/// Nodes without neighbors get a zero row.
pub fn mean_aggregate(x: &Matrix, neighbors: &[Vec<usize>]) -> Matrix {
    let mut out = Matrix::zeros(x.rows(), x.cols());
    for (i, list) in neighbors.iter().enumerate() {
        if list.is_empty() {
            continue;
        }
        let scale = 1.0 / list.len() as f64;
        let dst = out.row_mut(i);
        for j in list {
            for (d, v) in dst.iter_mut().zip(x.row(*j)) {
                *d += v * scale;
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_matmul() {
        let a = Matrix::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        let b = Matrix::from_rows(&[vec![5.0], vec![6.0]]).unwrap();
        let c = a.matmul(&b);
        assert_eq!(c.to_rows(), vec![vec![17.0], vec![39.0]]);
    }

    #[test]
    fn test_ragged_rows_rejected() {
        assert!(Matrix::from_rows(&[vec![1.0], vec![1.0, 2.0]]).is_none());
    }

    #[test]
    fn test_hstack() {
        let a = Matrix::from_rows(&[vec![1.0], vec![2.0]]).unwrap();
        let b = Matrix::from_rows(&[vec![3.0, 4.0], vec![5.0, 6.0]]).unwrap();
        let c = Matrix::hstack(&[&a, &b]);
        assert_eq!(c.to_rows(), vec![vec![1.0, 3.0, 4.0], vec![2.0, 5.0, 6.0]]);
    }

    #[test]
    fn test_l2_normalize_keeps_zero_rows() {
        let mut m = Matrix::from_rows(&[vec![3.0, 4.0], vec![0.0, 0.0]]).unwrap();
        m.l2_normalize_rows();
        assert_eq!(m.to_rows(), vec![vec![0.6, 0.8], vec![0.0, 0.0]]);
    }

    #[test]
    fn test_mean_aggregate() {
        let x = Matrix::from_rows(&[vec![1.0], vec![3.0], vec![5.0]]).unwrap();
        let neighbors = vec![vec![1, 2], vec![], vec![0]];
        let out = mean_aggregate(&x, &neighbors);
        assert_eq!(out.to_rows(), vec![vec![4.0], vec![0.0], vec![1.0]]);
    }

    #[test]
    fn test_glorot_deterministic_and_bounded() {
        let a = Matrix::glorot(4, 8, &mut StdRng::seed_from_u64(7));
        let b = Matrix::glorot(4, 8, &mut StdRng::seed_from_u64(7));
        assert_eq!(a, b);

        let limit = (6.0f64 / 12.0).sqrt();
        assert!(a.data().iter().all(|v| v.abs() <= limit));
    }
}
