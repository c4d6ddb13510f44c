//! Anderson mixing and the small dense LU behind it.
//!
//! The LU is checked against faer's partial-pivoting factorization on random
//! matrices; mixing is exercised on random memories and on a complex affine
//! map whose fixed point Anderson recovers exactly.

use approx::assert_abs_diff_eq;
use faer::linalg::solvers::SolveCore;
use faer::Mat;
use num_complex::Complex64;
use picard::{
    anderson_coefficients, lu_solve, Assembly, DenseMatrix, LinearSolver, MatVec, NlError, NonlinearProblem,
    PicardSolver, RingBuffer, SolveStats, ToleranceKind,
};
use rand::Rng;

#[test]
fn lu_matches_faer_on_random_system() {
    let n = 8;
    let mut rng = rand::thread_rng();
    let data: Vec<f64> = (0..n * n).map(|_| rng.r#gen::<f64>() - 0.5).collect();
    // diagonal shift keeps the draw comfortably nonsingular
    let entry = |i: usize, j: usize| data[i * n + j] + if i == j { 2.0 } else { 0.0 };
    let b: Vec<f64> = (0..n).map(|_| rng.r#gen()).collect();

    let dense = DenseMatrix::from_fn(n, entry);
    let x = lu_solve(dense.clone(), &b).unwrap();
    for (ax, bi) in dense.mul_vec(&x).iter().zip(&b) {
        assert_abs_diff_eq!(*ax, *bi, epsilon = 1e-12);
    }

    let a = Mat::from_fn(n, n, entry);
    let mut x_direct = b.clone();
    let lu = faer::linalg::solvers::PartialPivLu::new(a.as_ref());
    let x_mat = faer::MatMut::from_column_major_slice_mut(&mut x_direct, n, 1);
    lu.solve_in_place_with_conj(faer::Conj::No, x_mat);
    for i in 0..n {
        assert_abs_diff_eq!(x[i], x_direct[i], epsilon = 1e-10);
    }
}

#[test]
fn rank_deficient_matrix_is_singular() {
    // third row = first + second
    let a = DenseMatrix::from_fn(3, |i, j| match i {
        0 => [2.0, 1.0, 3.0][j],
        1 => [2.0, -1.0, 1.0][j],
        _ => [4.0, 0.0, 4.0][j],
    });
    assert!(matches!(lu_solve(a, &[1.0, 2.0, 3.0]), Err(NlError::SingularSystem { .. })));
}

#[test]
fn random_memories_give_affine_weights() {
    let mut rng = rand::thread_rng();
    for depth in 2..=6 {
        let mut memory = RingBuffer::<Vec<f64>>::with_capacity::<f64>(depth).unwrap();
        // more iterates than slots exercises eviction
        for _ in 0..depth + 2 {
            memory.push((0..12).map(|_| rng.r#gen::<f64>()).collect());
        }
        let coeffs = anderson_coefficients(&memory).unwrap();
        assert_eq!(coeffs.len(), depth - 1);
        assert_abs_diff_eq!(coeffs.iter().sum::<f64>(), 1.0, epsilon = 1e-9);
    }
}

#[test]
fn two_vector_memory_weight_is_exactly_one() {
    let mut memory = RingBuffer::<Vec<f64>>::with_capacity::<f64>(2).unwrap();
    memory.push(vec![1.0, 2.0, 3.0]);
    memory.push(vec![-4.0, 0.5, 9.0]);
    assert_eq!(anderson_coefficients(&memory).unwrap(), vec![1.0]);
}

/// Identity Jacobian over complex vectors.
struct ComplexIdentity;

impl MatVec<Vec<Complex64>> for ComplexIdentity {
    fn matvec(&self, x: &Vec<Complex64>, y: &mut Vec<Complex64>) {
        y.copy_from_slice(x);
    }
}

struct PassThrough;

impl LinearSolver<ComplexIdentity, Vec<Complex64>> for PassThrough {
    type Error = std::convert::Infallible;

    fn solve(
        &mut self,
        _a: &ComplexIdentity,
        b: &Vec<Complex64>,
        x: &mut Vec<Complex64>,
    ) -> Result<SolveStats<f64>, Self::Error> {
        x.copy_from_slice(b);
        Ok(SolveStats {
            iterations: 0,
            final_residual: 0.0,
            converged: true,
        })
    }
}

/// `z ← a·z + b` with a complex contraction `a`.
struct ComplexAffine {
    a: Complex64,
    b: Vec<Complex64>,
}

impl NonlinearProblem<Complex64> for ComplexAffine {
    type Jacobian = ComplexIdentity;

    fn problem_size(&self) -> usize {
        self.b.len()
    }

    fn assemble(
        &mut self,
        z: &[Complex64],
        with_jacobian: bool,
    ) -> Result<Assembly<Complex64, ComplexIdentity>, NlError<Complex64>> {
        let residual = z.iter().zip(&self.b).map(|(zi, bi)| self.a * zi + bi).collect();
        Ok(Assembly::new(residual, with_jacobian.then_some(ComplexIdentity)))
    }
}

fn complex_solve(anderson: bool) -> (Vec<Complex64>, usize) {
    let problem = ComplexAffine {
        a: Complex64::new(0.0, 0.5),
        b: vec![Complex64::new(1.0, 1.0), Complex64::new(-0.5, 0.0)],
    };
    let mut solver = PicardSolver::new(problem, PassThrough);
    solver
        .set_tolerance(1e-10, ToleranceKind::SolutionChangeAbsolute)
        .set_max_iterations(100)
        .use_anderson_acceleration(anderson)
        .set_num_last_vectors_used(3);
    let z = solver.solve(&[Complex64::new(0.0, 0.0); 2]).unwrap();
    (z, solver.iterations())
}

#[test]
fn complex_fixed_point_with_and_without_anderson() {
    // z* = b / (1 − a)
    let one_minus_a = Complex64::new(1.0, -0.5);
    let expected = [Complex64::new(1.0, 1.0) / one_minus_a, Complex64::new(-0.5, 0.0) / one_minus_a];
    assert_abs_diff_eq!(expected[0].re, 0.4, epsilon = 1e-14);
    assert_abs_diff_eq!(expected[0].im, 1.2, epsilon = 1e-14);

    let (plain, plain_iters) = complex_solve(false);
    let (mixed, mixed_iters) = complex_solve(true);
    for (z, e) in plain.iter().zip(&expected) {
        assert_abs_diff_eq!(z.re, e.re, epsilon = 1e-9);
        assert_abs_diff_eq!(z.im, e.im, epsilon = 1e-9);
    }
    for (z, e) in mixed.iter().zip(&expected) {
        assert_abs_diff_eq!(z.re, e.re, epsilon = 1e-12);
        assert_abs_diff_eq!(z.im, e.im, epsilon = 1e-12);
    }
    assert!(plain_iters > 30);
    assert_eq!(mixed_iters, 3);
}
