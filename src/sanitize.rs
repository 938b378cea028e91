//! Map arbitrary input paths to safe log-file names.
//!
//! Log files are named after the model being converted, so the user-supplied
//! path has to be reduced to something every common file system accepts.
//! The rules follow Windows, which is the most restrictive target:
//!
//! 1. keep only the last path segment
//! 2. replace `< > : " / \ | ? *` and control characters
//! 3. trim surrounding whitespace
//! 4. prefix reserved device names (`CON`, `NUL`, `COM1`, …)
//! 5. synthesise a name when nothing is left
//! 6. cap the length at 255 characters, keeping the extension

use once_cell::sync::Lazy;
use regex::Regex;

/// Maximum file-name length accepted by common file systems.
pub const MAX_FILENAME_LEN: usize = 255;

/// Replacement used when the caller does not pick one.
pub const DEFAULT_REPLACEMENT: char = '_';

static RE_INVALID_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[<>:"/\\|?*\x00-\x1F]"#).unwrap());

static RE_RESERVED_NAMES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(CON|PRN|AUX|NUL|COM[1-9]|LPT[1-9])(\..*)?$").unwrap());

/// Convert `path` to a valid file name.
///
/// The result is never empty, at most [`MAX_FILENAME_LEN`] characters long
/// and free of reserved characters.
///
/// ```rust
/// use xeoservices::sanitize::to_valid_filename;
///
/// assert_eq!(to_valid_filename("models/tower?.ifc", '_'), "tower_.ifc");
/// assert_eq!(to_valid_filename("CON.txt", '_'), "_CON.txt");
/// ```
pub fn to_valid_filename(path: &str, replacement: char) -> String {
    sanitize_name(basename(path), replacement)
}

/// Apply rules 2–6 to a single name without extracting a basename first.
pub fn sanitize_name(name: &str, replacement: char) -> String {
    let replacement = effective_replacement(replacement);
    let mut buf = [0u8; 4];
    let replacement_str: &str = replacement.encode_utf8(&mut buf);

    let replaced = RE_INVALID_CHARS.replace_all(name, replacement_str);
    let mut filename = replaced.trim().to_string();

    if RE_RESERVED_NAMES.is_match(&filename) {
        filename.insert(0, replacement);
    }

    if filename.is_empty() {
        filename = format!("file{}{}", replacement, chrono::Utc::now().timestamp_millis());
    }

    truncate_preserving_extension(filename)
}

/// Last path segment, treating both `/` and `\` as separators.
fn basename(path: &str) -> &str {
    let trimmed = path.trim_end_matches(['/', '\\']);
    trimmed.rsplit(['/', '\\']).next().unwrap_or("")
}

/// A replacement that is itself reserved would defeat the sanitiser.
fn effective_replacement(replacement: char) -> char {
    let mut buf = [0u8; 4];
    if RE_INVALID_CHARS.is_match(replacement.encode_utf8(&mut buf)) {
        DEFAULT_REPLACEMENT
    } else {
        replacement
    }
}

/// Extension including the dot; a leading dot (`.env`) is not an extension.
fn extension(filename: &str) -> &str {
    match filename.rfind('.') {
        Some(idx) if idx > 0 => &filename[idx..],
        _ => "",
    }
}

fn truncate_preserving_extension(filename: String) -> String {
    let total = filename.chars().count();
    if total <= MAX_FILENAME_LEN {
        return filename;
    }

    let ext = extension(&filename);
    let ext_len = ext.chars().count();
    if ext_len >= MAX_FILENAME_LEN {
        return filename.chars().take(MAX_FILENAME_LEN).collect();
    }

    let base = &filename[..filename.len() - ext.len()];
    let mut truncated: String = base.chars().take(MAX_FILENAME_LEN - ext_len).collect();
    truncated.push_str(ext);
    truncated
}
