/// Receives progress updates from a running pipeline.
///
/// Called once per state transition and once per completed product, with
/// the number of finished units, the number expected and a status line.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, completed: usize, total: usize, status: &str);
}

impl<F> ProgressReporter for F
where
    F: Fn(usize, usize, &str) + Send + Sync,
{
    fn report(&self, completed: usize, total: usize, status: &str) {
        self(completed, total, status)
    }
}

/// Writes progress to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogProgress;

impl ProgressReporter for LogProgress {
    fn report(&self, completed: usize, total: usize, status: &str) {
        if total > 0 {
            ::log::info!("[{}/{}] {}", completed, total, status);
        } else {
            ::log::info!("{}", status);
        }
    }
}

/// Discards progress
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn report(&self, _completed: usize, _total: usize, _status: &str) {}
}
