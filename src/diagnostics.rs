//! Shared diagnostics: uniform error prefixes and stderr warnings.

/// Format a fatal error message with the uniform tool prefix.
pub fn error_message(msg: impl AsRef<str>) -> String {
    format!("cigen: {}", msg.as_ref())
}

/// Print a non-fatal warning to stderr. Warnings never abort a run.
pub fn warn(msg: impl AsRef<str>) {
    eprintln!("WARN: {}", msg.as_ref());
}
