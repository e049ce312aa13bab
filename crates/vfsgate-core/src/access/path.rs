//! Virtual path resolution
//!
//! Virtual paths are `/`-separated strings, always absolute once cleaned.
//! Nothing here touches a real filesystem.

use crate::error::{Error, Result};

/// Normalize separators, force a leading `/` and resolve `.`/`..` lexically
///
/// `..` never climbs above the root.
pub fn fix_and_clean_path(path: &str) -> String {
    let path = path.replace('\\', "/");
    let mut parts: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            s => parts.push(s),
        }
    }

    format!("/{}", parts.join("/"))
}

/// Join a caller-supplied path onto a base path
///
/// Rejects any request that tries to step outward with `..`, so the joined
/// result always stays inside `base`.
pub fn join_base_path(base: &str, req_path: &str) -> Result<String> {
    if req_path.ends_with("..") || req_path.contains("../") || req_path.contains("..\\") {
        return Err(Error::InvalidPath("relative path is not allowed".to_string()));
    }

    let base = fix_and_clean_path(base);
    let req = fix_and_clean_path(req_path);
    Ok(fix_and_clean_path(&format!("{}/{}", base, req)))
}

/// Join a directory and a child name
pub fn path_join(dir: &str, name: &str) -> String {
    fix_and_clean_path(&format!("{}/{}", dir, name))
}

/// Parent directory of a path; the root is its own parent
pub fn parent_dir(path: &str) -> String {
    let path = fix_and_clean_path(path);
    match path.rsplit_once('/') {
        Some(("", _)) | None => "/".to_string(),
        Some((head, _)) => head.to_string(),
    }
}

/// Last segment of a path, empty for the root
pub fn base_name(path: &str) -> String {
    let path = fix_and_clean_path(path);
    path.rsplit('/').next().unwrap_or_default().to_string()
}

/// Check whether `child` equals `parent` or lies below it
///
/// Comparison is per segment: `/a` is not a parent of `/ab`.
pub fn is_sub_path(parent: &str, child: &str) -> bool {
    let parent = fix_and_clean_path(parent);
    let child = fix_and_clean_path(child);

    if parent == "/" || parent == child {
        return true;
    }
    child
        .strip_prefix(parent.as_str())
        .map(|rest| rest.starts_with('/'))
        .unwrap_or(false)
}

/// Percent-encode every segment of a path, keeping the separators
pub fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fix_and_clean_path() {
        assert_eq!(fix_and_clean_path(""), "/");
        assert_eq!(fix_and_clean_path("a/b"), "/a/b");
        assert_eq!(fix_and_clean_path("/a//b/./c/"), "/a/b/c");
        assert_eq!(fix_and_clean_path("\\a\\b"), "/a/b");
        assert_eq!(fix_and_clean_path("/a/../../b"), "/b");
    }

    #[test]
    fn test_join_base_path() {
        assert_eq!(join_base_path("/", "docs").unwrap(), "/docs");
        assert_eq!(join_base_path("/home/u1", "/docs/x").unwrap(), "/home/u1/docs/x");
        assert_eq!(join_base_path("/home/u1", "").unwrap(), "/home/u1");
        assert_eq!(join_base_path("home/u1/", "./a").unwrap(), "/home/u1/a");
    }

    #[test]
    fn test_join_base_path_rejects_traversal() {
        for req in ["..", "/a/..", "../etc", "/a/../../b", "..\\etc"] {
            let result = join_base_path("/home/u1", req);
            assert!(
                matches!(result, Err(Error::InvalidPath(_))),
                "expected InvalidPath for {:?}",
                req
            );
        }
    }

    #[test]
    fn test_join_stays_inside_base() {
        for req in ["a", "/a/b", "./x/./y", "//z", "a\\b"] {
            let joined = join_base_path("/home/u1", req).unwrap();
            assert!(is_sub_path("/home/u1", &joined), "{} escaped", joined);
        }
    }

    #[test]
    fn test_parent_and_base_name() {
        assert_eq!(parent_dir("/a/b/c"), "/a/b");
        assert_eq!(parent_dir("/a"), "/");
        assert_eq!(parent_dir("/"), "/");
        assert_eq!(base_name("/a/b/c"), "c");
        assert_eq!(base_name("/"), "");
        assert_eq!(path_join("/", "x"), "/x");
        assert_eq!(path_join("/a", "x"), "/a/x");
    }

    #[test]
    fn test_is_sub_path() {
        assert!(is_sub_path("/", "/anything"));
        assert!(is_sub_path("/a", "/a"));
        assert!(is_sub_path("/a", "/a/b"));
        assert!(!is_sub_path("/a", "/ab"));
        assert!(!is_sub_path("/a/b", "/a"));
    }

    #[test]
    fn test_encode_path() {
        assert_eq!(encode_path("/a b/c#d"), "/a%20b/c%23d");
        assert_eq!(encode_path("/plain/path.txt"), "/plain/path.txt");
    }
}
