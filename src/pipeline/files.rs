//! Relative file pattern computation.
//!
//! Manifest `src` attributes are relative to the directory holding the
//! manifest. Rooted patterns are rewritten relative to that directory by
//! walking up to the deepest common ancestor and back down.

/// Raised when a pattern cannot be expressed relative to the base directory.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    #[error("\"{pattern}\" shares no common ancestor with \"{base}\"")]
    NoCommonAncestor { base: String, pattern: String },
}

/// Split a path on either separator, dropping empty segments.
pub fn segments(path: &str) -> Vec<&str> {
    path.split(['/', '\\'])
        .filter(|segment| !segment.is_empty())
        .collect()
}

/// Number of leading segments two paths share, compared ASCII
/// case-insensitively.
pub fn common_ancestor(left: &[&str], right: &[&str]) -> usize {
    left.iter()
        .zip(right)
        .take_while(|(a, b)| a.eq_ignore_ascii_case(b))
        .count()
}

/// Whether the path starts with a drive designator such as `C:`.
pub fn is_drive_rooted(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

pub fn is_rooted(path: &str) -> bool {
    path.starts_with(['/', '\\']) || is_drive_rooted(path)
}

/// Rewrite `pattern` relative to `base_dir`, using `/` separators.
///
/// A pattern that is not rooted is returned as is. A rooted pattern without
/// a drive that shares no segment with the base is also returned as is;
/// with a drive it is an error.
pub fn relative_pattern(base_dir: &str, pattern: &str) -> Result<String, PathError> {
    let target = segments(pattern);
    if !is_rooted(pattern) {
        return Ok(target.join("/"));
    }

    let Some((file_name, directory)) = target.split_last() else {
        return Ok(pattern.to_string());
    };
    let base = segments(base_dir);
    let ancestor = common_ancestor(&base, directory);

    if ancestor == 0 {
        if is_drive_rooted(pattern) {
            return Err(PathError::NoCommonAncestor {
                base: base_dir.to_string(),
                pattern: pattern.to_string(),
            });
        }
        return Ok(pattern.replace('\\', "/"));
    }

    let mut relative: Vec<&str> = vec![".."; base.len() - ancestor];
    relative.extend(&directory[ancestor..]);
    relative.push(file_name);
    Ok(relative.join("/"))
}
