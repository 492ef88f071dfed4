//! Document locations.
//!
//! A location is the absolute path or URL of a document, kept as a string
//! with `/` separators. Pointers are resolved by joining the directory of
//! the document that holds them with the pointer text, then cleaning the
//! result lexically. The catalog and the rewriter both go through
//! [`resolve_definition`], so their keys always agree.

use std::path::Path;

/// Check if a string looks like a URL (starts with http:// or https://).
pub fn is_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

/// Split a URL into `scheme://host` and its path.
fn split_url(location: &str) -> (&str, &str) {
    let Some(scheme_end) = location.find("://") else {
        return ("", location);
    };
    let after = scheme_end + 3;
    match location[after..].find('/') {
        Some(idx) => location.split_at(after + idx),
        None => (location, "/"),
    }
}

/// Lexically clean a slash-separated path: drop `.` and empty segments,
/// fold `..` into its parent.
pub fn clean(path: &str) -> String {
    let rooted = path.starts_with('/');
    let mut stack: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if stack.last().map_or(false, |last| *last != "..") {
                    stack.pop();
                } else if !rooted {
                    stack.push("..");
                }
            }
            other => stack.push(other),
        }
    }

    let joined = stack.join("/");
    match (rooted, joined.is_empty()) {
        (true, _) => format!("/{}", joined),
        (false, true) => ".".to_string(),
        (false, false) => joined,
    }
}

/// Clean a location, leaving a URL's scheme and host untouched.
pub fn normalize(location: &str) -> String {
    if is_url(location) {
        let (prefix, path) = split_url(location);
        format!("{}{}", prefix, clean(path))
    } else {
        clean(location)
    }
}

/// Directory part of a location (`/a/b/spec.yaml` -> `/a/b`).
pub fn dir_of(location: &str) -> String {
    let (prefix, path) = if is_url(location) {
        split_url(location)
    } else {
        ("", location)
    };

    let dir = match path.rfind('/') {
        Some(0) => "/".to_string(),
        Some(idx) => clean(&path[..idx]),
        None => ".".to_string(),
    };
    format!("{}{}", prefix, dir)
}

/// Join a directory with a relative location.
///
/// Absolute paths and URLs replace the directory entirely.
pub fn join(dir: &str, relative: &str) -> String {
    if is_url(relative) || relative.starts_with('/') {
        return normalize(relative);
    }
    normalize(&format!("{}/{}", dir, relative))
}

/// Absolute definition of `pointer` as written inside the document at `origin`.
///
/// Only the part before `#` is treated as a path; the fragment is kept
/// verbatim.
pub fn resolve_definition(origin: &str, pointer: &str) -> String {
    let (file_part, fragment) = split_pointer(pointer);
    let file = if file_part.is_empty() {
        origin.to_string()
    } else {
        join(&dir_of(origin), file_part)
    };
    match fragment {
        Some(fragment) => format!("{}#{}", file, fragment),
        None => file,
    }
}

/// Split pointer text into its document part and its fragment (without `#`).
pub fn split_pointer(pointer: &str) -> (&str, Option<&str>) {
    match pointer.find('#') {
        Some(idx) => (&pointer[..idx], Some(&pointer[idx + 1..])),
        None => (pointer, None),
    }
}

/// Location string for a filesystem path, made absolute against the
/// current directory when possible.
pub fn from_path(path: &Path) -> String {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };
    normalize(&absolute.to_string_lossy().replace('\\', "/"))
}
