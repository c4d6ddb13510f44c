//! Small dense matrices and LU with partial pivoting.
//!
//! Sized by the Anderson memory depth, never by the problem size, so the
//! storage is a plain row-major `Vec` and the factorization is the textbook
//! Doolittle elimination with row interchanges (Golub & Van Loan, Alg. 3.4.1).

use crate::core::traits::Scalar;
use crate::error::NlError;

/// Row-major `n × n` matrix.
#[derive(Clone, Debug, PartialEq)]
pub struct DenseMatrix<S> {
    n: usize,
    data: Vec<S>,
}

impl<S: Scalar> DenseMatrix<S> {
    pub fn zeros(n: usize) -> Self {
        DenseMatrix {
            n,
            data: vec![S::zero(); n * n],
        }
    }

    /// Build from a generator `f(i, j)`.
    pub fn from_fn(n: usize, mut f: impl FnMut(usize, usize) -> S) -> Self {
        let mut data = Vec::with_capacity(n * n);
        for i in 0..n {
            for j in 0..n {
                data.push(f(i, j));
            }
        }
        DenseMatrix { n, data }
    }

    pub fn dim(&self) -> usize {
        self.n
    }

    fn max_modulus(&self) -> f64 {
        self.data.iter().map(|v| v.modulus()).fold(0.0, f64::max)
    }

    /// Compute y = A · x.
    pub fn mul_vec(&self, x: &[S]) -> Vec<S> {
        assert_eq!(self.n, x.len(), "Input vector x has incorrect length");
        (0..self.n)
            .map(|i| {
                self.data[i * self.n..(i + 1) * self.n]
                    .iter()
                    .zip(x)
                    .fold(S::zero(), |acc, (a, b)| acc + *a * *b)
            })
            .collect()
    }
}

impl<S> std::ops::Index<(usize, usize)> for DenseMatrix<S> {
    type Output = S;
    fn index(&self, (i, j): (usize, usize)) -> &S {
        &self.data[i * self.n + j]
    }
}

impl<S> std::ops::IndexMut<(usize, usize)> for DenseMatrix<S> {
    fn index_mut(&mut self, (i, j): (usize, usize)) -> &mut S {
        &mut self.data[i * self.n + j]
    }
}

/// In-place `P A = L U` factorization.
///
/// `L` (unit diagonal) and `U` share the storage of the input matrix;
/// `perm[k]` is the original row now sitting in row `k`.
#[derive(Clone, Debug)]
pub struct LuFactor<S> {
    lu: DenseMatrix<S>,
    perm: Vec<usize>,
}

impl<S: Scalar> LuFactor<S> {
    /// Factor `a`, failing with `SingularSystem` on a degenerate pivot.
    ///
    /// A pivot is degenerate when its modulus is at most `n·ε·max|a_ij|`
    /// after the row interchange (an all-zero matrix fails at column 0).
    pub fn new(mut a: DenseMatrix<S>) -> Result<Self, NlError<S>> {
        let n = a.n;
        let threshold = n as f64 * f64::EPSILON * a.max_modulus();
        let mut perm: Vec<usize> = (0..n).collect();

        for k in 0..n {
            let (p, pmax) = (k..n)
                .map(|i| (i, a[(i, k)].modulus()))
                .fold((k, -1.0), |best, cur| if cur.1 > best.1 { cur } else { best });
            if pmax <= threshold || pmax == 0.0 {
                return Err(NlError::SingularSystem { pivot: k });
            }
            if p != k {
                for j in 0..n {
                    a.data.swap(k * n + j, p * n + j);
                }
                perm.swap(k, p);
            }
            let pivot = a[(k, k)];
            for i in (k + 1)..n {
                let l = a[(i, k)] / pivot;
                a[(i, k)] = l;
                for j in (k + 1)..n {
                    let ukj = a[(k, j)];
                    a[(i, j)] -= l * ukj;
                }
            }
        }
        Ok(LuFactor { lu: a, perm })
    }

    /// Solve `A x = b` with the stored factors.
    pub fn solve(&self, b: &[S]) -> Vec<S> {
        let n = self.lu.n;
        assert_eq!(n, b.len(), "Right-hand side has incorrect length");
        let mut x: Vec<S> = self.perm.iter().map(|&p| b[p]).collect();
        // forward substitution, unit lower triangle
        for i in 0..n {
            for j in 0..i {
                let lij = self.lu[(i, j)];
                let xj = x[j];
                x[i] -= lij * xj;
            }
        }
        for i in (0..n).rev() {
            for j in (i + 1)..n {
                let uij = self.lu[(i, j)];
                let xj = x[j];
                x[i] -= uij * xj;
            }
            x[i] = x[i] / self.lu[(i, i)];
        }
        x
    }
}

/// Solve the small system `a x = b` by LU with partial pivoting.
pub fn lu_solve<S: Scalar>(a: DenseMatrix<S>, b: &[S]) -> Result<Vec<S>, NlError<S>> {
    if a.dim() != b.len() {
        return Err(NlError::DimensionMismatch {
            expected: a.dim(),
            found: b.len(),
        });
    }
    Ok(LuFactor::new(a)?.solve(b))
}
