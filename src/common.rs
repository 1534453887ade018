//! Small helpers shared by the extractor and the scanner.

use std::path::Path;

/// Safely extract a slice from source bytes with bounds checking.
///
/// Returns `None` if the range is inverted or exceeds the source length.
///
/// # Example
/// ```
/// use callmap::common::safe_slice;
/// let source = b"hello world";
/// assert_eq!(safe_slice(source, 0, 5), Some(&b"hello"[..]));
/// assert_eq!(safe_slice(source, 10, 20), None);
/// ```
pub fn safe_slice(source: &[u8], start: usize, end: usize) -> Option<&[u8]> {
    if start <= end && end <= source.len() {
        Some(&source[start..end])
    } else {
        None
    }
}

/// Source text covered by a tree-sitter node, if it is valid UTF-8.
pub fn node_text<'s>(node: &tree_sitter::Node<'_>, source: &'s [u8]) -> Option<&'s str> {
    let bytes = safe_slice(source, node.start_byte(), node.end_byte())?;
    std::str::from_utf8(bytes).ok()
}

/// Path of `path` relative to `root`, or `path` itself when outside it.
pub fn relative_to<'p>(path: &'p Path, root: &Path) -> &'p Path {
    path.strip_prefix(root).unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_slice_bounds() {
        let source = b"abc";
        assert_eq!(safe_slice(source, 0, 3), Some(&b"abc"[..]));
        assert_eq!(safe_slice(source, 2, 1), None);
        assert_eq!(safe_slice(source, 0, 4), None);
    }

    #[test]
    fn test_relative_to() {
        let root = Path::new("/src");
        assert_eq!(relative_to(Path::new("/src/a/b.php"), root), Path::new("a/b.php"));
        assert_eq!(relative_to(Path::new("/other/b.php"), root), Path::new("/other/b.php"));
    }
}
