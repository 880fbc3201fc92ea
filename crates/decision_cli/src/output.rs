use std::io::{self, Write};

use serde::Serialize;

/// Serialize `value` as a single line of JSON.
pub fn to_json_line(value: &impl Serialize) -> serde_json::Result<String> {
    serde_json::to_string(value)
}

/// Write one line to stdout and flush it so a parent process reading the
/// pipe sees the complete response immediately.
pub fn emit_line(line: &str) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    writeln!(handle, "{line}")?;
    handle.flush()
}
