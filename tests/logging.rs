//! Solver messages reaching an injected log sink.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use faer::Mat;
use picard::{Assembly, LogSink, LuSolver, NlError, NonlinearProblem, PicardSolver, SolverLogger, ToleranceKind};

#[derive(Clone, Default)]
struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl SharedBuf {
    fn text(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// `x ← 0.5 x + 1` with a dense identity Jacobian.
struct Halving;

impl NonlinearProblem<f64> for Halving {
    type Jacobian = Mat<f64>;

    fn problem_size(&self) -> usize {
        1
    }

    fn assemble(&mut self, x: &[f64], with_jacobian: bool) -> Result<Assembly<f64, Mat<f64>>, NlError> {
        Ok(Assembly::new(vec![0.5 * x[0] + 1.0], with_jacobian.then(|| Mat::from_fn(1, 1, |_, _| 1.0))))
    }
}

#[test]
fn convergence_is_reported_to_the_sink() {
    let buf = SharedBuf::default();
    let logger = SolverLogger::new("halving").with_sink(LogSink::new(buf.clone()));
    let mut solver = PicardSolver::new(Halving, LuSolver::new()).with_logger(logger);
    solver.set_tolerance(1e-8, ToleranceKind::SolutionChangeAbsolute).set_max_iterations(50);
    solver.solve(&[0.0]).unwrap();

    let text = buf.text();
    let lines: Vec<&str> = text.lines().collect();
    assert!(lines[0].starts_with("INFO  halving: Picard iteration: 1 unknowns"), "{}", lines[0]);
    assert!(lines.iter().any(|l| l.starts_with("DEBUG halving: iteration 1: damping 1")));
    let last = lines.last().unwrap();
    assert!(
        last.starts_with(&format!("INFO  halving: converged after {} iterations", solver.iterations())),
        "{last}"
    );
}

#[test]
fn exhausted_iterations_are_reported_as_warning() {
    let buf = SharedBuf::default();
    let logger = SolverLogger::new("short").with_sink(LogSink::new(buf.clone()));
    let mut solver = PicardSolver::new(Halving, LuSolver::new()).with_logger(logger);
    solver.set_tolerance(1e-12, ToleranceKind::SolutionChangeAbsolute).set_max_iterations(3);
    assert!(solver.solve(&[0.0]).is_err());

    let text = buf.text();
    let last = text.lines().last().unwrap();
    assert!(last.starts_with("WARN  short: no convergence within 3 iterations"), "{last}");
}

#[test]
fn file_sink_appends_unless_erased() {
    let path = std::env::temp_dir().join(format!("picard-log-{}.txt", std::process::id()));
    let _ = std::fs::remove_file(&path);

    let logger = SolverLogger::new("file").with_sink(LogSink::file(&path, true).unwrap());
    logger.info(format_args!("first"));
    let logger = SolverLogger::new("file").with_sink(LogSink::file(&path, false).unwrap());
    logger.info(format_args!("second"));
    let appended = std::fs::read_to_string(&path).unwrap();
    assert_eq!(appended.lines().collect::<Vec<_>>(), vec!["INFO  file: first", "INFO  file: second"]);

    let logger = SolverLogger::new("file").with_sink(LogSink::file(&path, true).unwrap());
    logger.info(format_args!("third"));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "INFO  file: third\n");
    let _ = std::fs::remove_file(&path);
}
