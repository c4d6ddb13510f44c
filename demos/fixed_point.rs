use faer::Mat;
use picard::{
    Assembly, LogSink, LuSolver, NlError, NonlinearProblem, PicardSolver, SolverLogger, ToleranceKind,
};

/// -(k(u) u')' = f on (0,1), u(0) = u(1) = 0, with k(u) = 1 + u².
struct Diffusion {
    n: usize,
    load: f64,
}

impl NonlinearProblem<f64> for Diffusion {
    type Jacobian = Mat<f64>;

    fn problem_size(&self) -> usize {
        self.n
    }

    fn assemble(&mut self, u: &[f64], with_jacobian: bool) -> Result<Assembly<f64, Mat<f64>>, NlError> {
        let n = self.n;
        let h2 = (1.0 / (n as f64 + 1.0)).powi(2);
        let node = |i: usize| if i == 0 || i > n { 0.0 } else { u[i - 1] };
        // k between nodes i-1 and i (1-based, boundary nodes 0 and n+1)
        let k = |i: usize| {
            let m = 0.5 * (node(i - 1) + node(i));
            1.0 + m * m
        };
        let jacobian = with_jacobian.then(|| {
            Mat::from_fn(n, n, |r, c| {
                let i = r + 1;
                if r == c {
                    (k(i) + k(i + 1)) / h2
                } else if c + 1 == r {
                    -k(i) / h2
                } else if c == r + 1 {
                    -k(i + 1) / h2
                } else {
                    0.0
                }
            })
        });
        Ok(Assembly::new(vec![self.load; n], jacobian))
    }
}

fn main() {
    let n = 40;
    for anderson in [false, true] {
        let logger = SolverLogger::new(if anderson { "anderson" } else { "plain" }).with_sink(LogSink::stderr());
        let mut solver = PicardSolver::new(Diffusion { n, load: 40.0 }, LuSolver::new()).with_logger(logger);
        solver
            .set_tolerance(1e-10, ToleranceKind::SolutionChangeRelative)
            .set_max_iterations(100)
            .use_anderson_acceleration(anderson)
            .set_num_last_vectors_used(4);

        match solver.solve(&vec![0.0; n]) {
            Ok(u) => {
                let peak = u.iter().cloned().fold(f64::MIN, f64::max);
                println!(
                    "anderson {anderson}: {} iterations, peak u = {peak:.6}",
                    solver.iterations()
                );
                println!("  change norms   = {:?}", solver.change_norms());
                println!("  damping        = {:?}", solver.damping_factors());
            }
            Err(e) => {
                println!("anderson {anderson}: {e}");
                if let Some(nc) = e.non_convergence() {
                    println!("  damping history = {:?}", nc.damping_factors);
                }
            }
        }
    }
}
