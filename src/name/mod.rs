//! Host path → archive entry name.
//!
//! Entry names use `/` separators, carry no drive specifier and no leading
//! separator; directory names end in `/`.
//!
//! Dot segments (`./`, `../`) are passed through as they are.  Nothing in
//! this module protects against path traversal; code that extracts entries
//! must check names itself.

use crate::error::{Error, Result};

/// Longest entry name, in bytes, a container can record.
pub const MAX_ENTRY_NAME_LEN: usize = 0xFFFF;

// ── EntryNameTransform ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryNameTransform {
    /// Stored with `/` separators.
    root: Option<String>,
}

impl EntryNameTransform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names starting with `root` (ignoring case and separator style) have
    /// that prefix removed before anything else happens.
    pub fn with_root(root: impl Into<String>) -> Self {
        let root = root.into().replace('\\', "/");
        Self { root: if root.is_empty() { None } else { Some(root) } }
    }

    pub fn root(&self) -> Option<&str> {
        self.root.as_deref()
    }

    /// Entry name for a file.
    ///
    /// # Errors
    /// [`Error::PathTooLong`] if the name exceeds [`MAX_ENTRY_NAME_LEN`].
    pub fn transform_file(&self, path: &str) -> Result<String> {
        let name = self.transform(path);
        if name.len() > MAX_ENTRY_NAME_LEN {
            return Err(Error::PathTooLong { len: name.len(), max: MAX_ENTRY_NAME_LEN });
        }
        Ok(name)
    }

    /// Entry name for a directory: the file form plus a trailing `/`.
    ///
    /// # Errors
    /// [`Error::InvalidArgument`] when nothing is left of the path, and
    /// [`Error::PathTooLong`] as for [`transform_file`](Self::transform_file).
    pub fn transform_directory(&self, path: &str) -> Result<String> {
        let mut name = self.transform_file(path)?;
        if name.is_empty() {
            return Err(Error::InvalidArgument(format!("no directory name left in {path:?}")));
        }
        name.push('/');
        Ok(name)
    }

    fn transform(&self, path: &str) -> String {
        let slashed = path.replace('\\', "/");
        let mut rest = slashed.as_str();
        if let Some(root) = &self.root {
            if let Some(stripped) = strip_prefix_ignore_case(rest, root) {
                rest = stripped;
            }
        }

        // A network share keeps only its final segment.
        let body = match split_share(rest) {
            Some(tail) => tail.rsplit('/').find(|s| !s.is_empty()).unwrap_or(""),
            None       => strip_drive(rest),
        };

        let mut name = String::with_capacity(body.len());
        for segment in body.split('/').filter(|s| !s.is_empty()) {
            if !name.is_empty() {
                name.push('/');
            }
            name.extend(segment.chars().map(|c| if is_disallowed(c) { '_' } else { c }));
        }
        name
    }
}

// ── Validation ───────────────────────────────────────────────────────────────

/// Check that `name` can be stored as is.
///
/// A colon is only accepted as the second character (a drive specifier).
/// The rejected brackets are `<` and `>`; square brackets are ordinary
/// name characters.  Transform output always passes.
pub fn validate_name(name: &str) -> Result<()> {
    if name.len() > MAX_ENTRY_NAME_LEN {
        return Err(Error::PathTooLong { len: name.len(), max: MAX_ENTRY_NAME_LEN });
    }
    if name.starts_with('/') {
        return Err(Error::InvalidArgument("entry name must not start with '/'".into()));
    }
    for (i, c) in name.chars().enumerate() {
        let bad = match c {
            ':' => i != 1,
            _   => is_disallowed(c),
        };
        if bad {
            return Err(Error::InvalidArgument(format!(
                "character {c:?} at position {i} is not allowed in an entry name"
            )));
        }
    }
    Ok(())
}

pub fn is_valid_name(name: &str) -> bool {
    validate_name(name).is_ok()
}

/// Tidy a host path that is used as an entry name directly.
///
/// Unlike [`EntryNameTransform`], a network share only loses its
/// `//host/share/` root and the rest of the path is kept.
pub fn clean_name(path: &str) -> String {
    let slashed = path.replace('\\', "/");
    let rest = match split_share(&slashed) {
        Some(tail) => tail,
        None       => strip_drive(&slashed),
    };
    rest.trim_start_matches('/').to_string()
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn is_disallowed(c: char) -> bool {
    c.is_control() || matches!(c, '"' | '<' | '>' | '|' | ':' | '*' | '?')
}

/// For `//host/share[/tail]`, the tail; `None` when there is no share.
fn split_share(path: &str) -> Option<&str> {
    let mut parts = path.strip_prefix("//")?.splitn(3, '/');
    let host  = parts.next()?;
    let share = parts.next()?;
    if host.is_empty() || share.is_empty() {
        return None;
    }
    Some(parts.next().unwrap_or(""))
}

/// Drop `X:` and one separator after it.
fn strip_drive(path: &str) -> &str {
    let bytes = path.as_bytes();
    if bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' {
        let rest = &path[2..];
        return rest.strip_prefix('/').unwrap_or(rest);
    }
    path
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let mut chars = s.char_indices();
    for p in prefix.chars() {
        let (_, c) = chars.next()?;
        if !c.to_lowercase().eq(p.to_lowercase()) {
            return None;
        }
    }
    let end = chars.next().map_or(s.len(), |(i, _)| i);
    Some(&s[end..])
}
