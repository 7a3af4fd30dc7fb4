//! Destinations for rendered log lines.

use std::io::{self, Write};

/// A destination for rendered log lines.
///
/// Implementations serialize their own writes so concurrent callers never
/// interleave partial lines.
pub trait LogSink: Send + Sync {
    /// Append one line. The sink adds the line terminator.
    fn write_line(&self, line: &str) -> io::Result<()>;

    /// Short name used in diagnostics.
    fn name(&self) -> &str;
}

/// Writes lines to standard output.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleSink;

impl LogSink for ConsoleSink {
    fn write_line(&self, line: &str) -> io::Result<()> {
        let mut out = io::stdout().lock();
        writeln!(out, "{line}")?;
        out.flush()
    }

    fn name(&self) -> &str {
        "console"
    }
}
