//! Dual-stream logger: a machine-readable log stream plus a human-readable
//! error stream, as injected observers with a lifetime spanning one run
//! (spec §9 -- explicitly not process-wide state).
//!
//! Generalizes the teacher's single-stream `Logger` (verbosity-gated,
//! optional log file, `eprintln!` fallback) into the two channels the
//! engine emits to.

use std::fs::File;
use std::io::Write;

/// A simple logger, extended to carry separate log/error channels.
#[derive(Debug)]
pub struct Logger {
    verbosity: u32,
    log_file: Option<File>,
}

impl Logger {
    /// Create a new logger.
    pub fn new(verbosity: u32, log_file: Option<File>) -> Self
    {
        Self { verbosity, log_file }
    }

    /// Emit a machine-readable tagged line to the log stream (and the
    /// log file, if present). Tags follow `tag:field:field: reason`.
    pub fn log_line(&mut self, level: u32, line: &str)
    {
        if self.verbosity < level {
            return;
        }

        if let Some(log_file) = &mut self.log_file {
            writeln!(log_file, "{}", line).unwrap_or_else(|_| {
                eprintln!("error: couldn't write into the log file")
            });
        } else {
            eprintln!("{}", line);
        }
    }

    /// Emit a human-readable message to the error stream. Always shown,
    /// regardless of verbosity.
    pub fn error(&mut self, msg: &str)
    {
        eprintln!("error: {}", msg);

        if let Some(log_file) = &mut self.log_file {
            let _ = writeln!(log_file, "error: {}", msg);
        }
    }

    /// Convenience for the engine's `error:<i>:<disk>:<sub>: <reason>` tag.
    pub fn block_error(&mut self, index: u64, disk: &str, sub: &str, reason: &str)
    {
        self.log_line(1, &format!("error:{}:{}:{}: {}", index, disk, sub, reason));
    }

    /// Convenience for the engine's `parity_error:<i>:<level>: Write error` tag.
    pub fn parity_error(&mut self, index: u64, level: usize)
    {
        self.log_line(1, &format!("parity_error:{}:{}: Write error", index, level));
    }

    pub fn summary(&mut self, error_readwrite: u64, error_data: u64, ok: bool)
    {
        self.log_line(0, &format!("summary:error_readwrite:{}", error_readwrite));
        self.log_line(0, &format!("summary:error_data:{}", error_data));
        self.log_line(0, &format!("summary:exit:{}", if ok { "ok" } else { "error" }));
    }
}

#[cfg(test)]
mod tests {
    use super::Logger;

    #[test]
    fn summary_does_not_panic_without_a_log_file()
    {
        let mut logger = Logger::new(2, None);
        logger.summary(0, 0, true);
        logger.block_error(5, "disk0", "read", "missing file");
        logger.parity_error(5, 0);
    }
}
