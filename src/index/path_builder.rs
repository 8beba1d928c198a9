//! Path Builder
//!
//! Joins a base directory, intermediate segments and a basename into one
//! normalized path string.

use std::path::MAIN_SEPARATOR;

// == Build ==
/// Builds a path with the platform separator.
///
/// See [`build_with`].
pub fn build(base: &str, segments: &[&str], basename: &str) -> String {
    build_with(MAIN_SEPARATOR, base, segments, basename)
}

/// Builds a path from `base`, `segments` and `basename` using `sep`.
///
/// Every component is whitespace-trimmed as a whole and split on `sep`; empty
/// pieces are dropped, so repeated, leading and trailing separators collapse.
/// Whitespace inside a component is kept. The result
/// keeps a leading separator only when `base` was absolute.
pub fn build_with(sep: char, base: &str, segments: &[&str], basename: &str) -> String {
    let base = base.trim();
    let absolute = base.starts_with(sep);

    let parts: Vec<&str> = std::iter::once(base)
        .chain(segments.iter().copied())
        .chain(std::iter::once(basename))
        .flat_map(|component| component.trim().split(sep))
        .filter(|piece| !piece.is_empty())
        .collect();

    let mut path = String::new();
    if absolute {
        path.push(sep);
    }
    for (i, piece) in parts.iter().enumerate() {
        if i > 0 {
            path.push(sep);
        }
        path.push_str(piece);
    }
    path
}
