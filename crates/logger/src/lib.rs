use std::fmt::Display;

use parking_lot::Mutex;

pub trait Logger: Clone {
    fn log(&self, message: impl Display);
    fn warn(&self, message: impl Display) {
        self.log(format!("WARN: {}", message));
    }
    fn debug(&self, message: impl Display) {
        self.log(format!("DEBUG: {}", message));
    }
}

// Forward every method, not just `log`, so overrides like StdioLogger's
// verbose gate still apply behind additional layers of reference.
impl<T: Logger> Logger for &T {
    fn log(&self, message: impl Display) {
        (*self).log(message);
    }
    fn warn(&self, message: impl Display) {
        (*self).warn(message);
    }
    fn debug(&self, message: impl Display) {
        (*self).debug(message);
    }
}

pub struct StdioLogger {
    zero_time: std::time::Instant,
    verbose: bool,
}
impl Logger for &StdioLogger {
    fn log(&self, message: impl Display) {
        let delta_time = std::time::Instant::now().duration_since(self.zero_time);
        println!("[{:.04}] {}", delta_time.as_secs_f64(), message);
    }

    // Debug messages only print when the logger was built verbose.
    fn debug(&self, message: impl Display) {
        if self.verbose {
            self.log(format!("DEBUG: {}", message));
        }
    }
}
impl StdioLogger {
    pub fn new(verbose: bool) -> Self {
        Self {
            zero_time: std::time::Instant::now(),
            verbose,
        }
    }
}
impl Default for StdioLogger {
    fn default() -> Self {
        Self::new(false)
    }
}

/// Captures log lines in memory so tests can assert on them.
pub struct MemoryLogger {
    lines: Mutex<Vec<String>>,
}

impl Logger for &MemoryLogger {
    fn log(&self, message: impl Display) {
        self.lines.lock().push(format!("{}", message));
    }
}
impl MemoryLogger {
    pub fn new() -> Self {
        Self {
            lines: Mutex::new(Vec::new()),
        }
    }

    /// Snapshot of everything logged so far.
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    pub fn has_line_containing(&self, needle: &str) -> bool {
        self.lines.lock().iter().any(|line| line.contains(needle))
    }
}
impl Default for MemoryLogger {
    fn default() -> Self {
        Self::new()
    }
}
