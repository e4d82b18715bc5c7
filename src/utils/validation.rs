/// Longest name written to disk, in bytes
pub const MAX_FILENAME_LEN: usize = 255;

/// Name used when sanitization leaves nothing behind
pub const FALLBACK_FILENAME: &str = "upload";

/// Device names Windows refuses to create as regular files
const RESERVED_DEVICE_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3",
];

/// Sanitizes a client-supplied filename so it can be joined onto a directory
/// path safely.
///
/// Path separators are treated as whitespace, whitespace runs collapse to a
/// single `_`, and anything outside `[A-Za-z0-9._-]` is dropped. Leading and
/// trailing dots and underscores are stripped, which also defeats `..`
/// traversal. The result is never empty.
pub fn sanitize_filename(filename: &str) -> String {
    let spaced: String = filename
        .chars()
        .filter(|c| c.is_ascii())
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();

    let joined = spaced.split_ascii_whitespace().collect::<Vec<_>>().join("_");

    let kept: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();

    let mut name = kept.trim_matches(|c| c == '.' || c == '_').to_string();

    let stem = name.split('.').next().unwrap_or("").to_ascii_uppercase();
    if RESERVED_DEVICE_NAMES.contains(&stem.as_str()) {
        name.insert(0, '_');
    }

    if name.len() > MAX_FILENAME_LEN {
        name.truncate(MAX_FILENAME_LEN);
    }

    if name.is_empty() {
        if !filename.is_empty() {
            tracing::warn!(
                "Filename {:?} sanitized to nothing, using '{}'",
                filename,
                FALLBACK_FILENAME
            );
        }
        return FALLBACK_FILENAME.to_string();
    }

    name
}
