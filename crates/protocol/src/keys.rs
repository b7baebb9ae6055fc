//! Object-key derivation shared by control-plane implementations.
//!
//! Keys look like `{name}/{stem}-{millis}.{ext}`: the uploader's name is
//! the prefix, the timestamp makes repeated uploads of the same file
//! land on distinct keys.

/// Replaces every run of characters outside `[A-Za-z0-9._-]` with `_`.
pub fn sanitize(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_run = false;
    for c in input.chars() {
        if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
            out.push(c);
            in_run = false;
        } else if !in_run {
            out.push('_');
            in_run = true;
        }
    }
    out
}

/// Derives the object key for a new session.
///
/// An empty `name` becomes `unknown`. The extension is the last
/// `.`-separated segment of `file_name`, so a name without a dot is its
/// own extension; an empty segment falls back to `bin`.
pub fn derive_object_key(name: &str, file_name: &str, millis: i64) -> String {
    let name = if name.is_empty() { "unknown" } else { name };
    let ext = file_name
        .rsplit('.')
        .next()
        .filter(|ext| !ext.is_empty())
        .unwrap_or("bin");
    let stem = match file_name.rsplit_once('.') {
        Some((stem, ext)) if !ext.is_empty() => stem,
        _ => file_name,
    };
    format!("{}/{}-{millis}.{ext}", sanitize(name), sanitize(stem))
}
