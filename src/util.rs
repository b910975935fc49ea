const UNITS: [&str; 6] = ["B", "KiB", "MiB", "GiB", "TiB", "PiB"];

/// Format a capacity given in kilobytes as a human-readable binary size.
///
/// Uses the largest unit whose value is at least 1, with one decimal:
/// `1048576` KB → `"1.0 GiB"`. Kilobytes are 1024 bytes, as vSphere counts them.
pub fn pretty_size_kb(kb: u64) -> String {
    pretty_size(kb.saturating_mul(1024))
}

/// Format a byte count as a human-readable binary size.
pub fn pretty_size(bytes: u64) -> String {
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1} {}", UNITS[unit])
}
