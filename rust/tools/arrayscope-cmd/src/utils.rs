//! Common utilities for arrayscope-cmd

use tracing::Level;

/// Maps the `-v` count to the most verbose level that is reported.
/// `-vv` and above enable allocation tracing.
pub fn verbosity_level(verbose: u8) -> Level {
    match verbose {
        0 | 1 => Level::WARN,
        _ => Level::TRACE,
    }
}

/// Installs a stderr `fmt` subscriber filtered by the `-v` count.
pub fn init_logging(verbose: u8) {
    let level = verbosity_level(verbose);
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
    tracing::debug!(%level, "logging enabled");
}

/// Formats a byte count in human-readable format
pub fn format_size(size: usize) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = size as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", size as u64, UNITS[unit_index])
    } else {
        format!("{:.2} {}", size, UNITS[unit_index])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(56), "56 B");
        assert_eq!(format_size(1024), "1.00 KB");
        assert_eq!(format_size(1536), "1.50 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.00 MB");
    }

    #[test]
    fn test_verbosity_level() {
        assert_eq!(verbosity_level(0), Level::WARN);
        assert_eq!(verbosity_level(1), Level::WARN);
        assert_eq!(verbosity_level(2), Level::TRACE);
        assert_eq!(verbosity_level(5), Level::TRACE);
    }

    #[test]
    fn test_double_verbose_enables_allocation_tracing() {
        init_logging(2);
        assert!(tracing::enabled!(Level::TRACE));
    }
}
