//! Key-path accessors over a nested config tree
//!
//! The tree is a `serde_json::Value` where `Object` nodes are branches and
//! everything else is a leaf. A path is an ordered sequence of string keys;
//! the empty path addresses the root. Misses surface as typed errors instead
//! of panics, so callers decide what a missing key means.

use serde_json::{Map, Value};

/// Errors from path traversal and mutation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    /// A key named by the path does not exist at the expected depth.
    #[error("key not found: '{}'", .0.join("."))]
    KeyNotFound(Vec<String>),

    /// A node on the path exists but is a leaf, so traversal cannot continue.
    #[error("node '{}' is not a branch", display_prefix(.0))]
    NotABranch(Vec<String>),

    /// The empty path has no terminal key, so there is nothing to assign.
    #[error("empty path: no terminal key to assign")]
    InvalidPath,
}

fn display_prefix(keys: &[String]) -> String {
    if keys.is_empty() {
        "<root>".to_string()
    } else {
        keys.join(".")
    }
}

fn to_owned_path<S: AsRef<str>>(keys: &[S]) -> Vec<String> {
    keys.iter().map(|k| k.as_ref().to_string()).collect()
}

/// Resolve `path` in `tree`, returning a reference to the addressed node.
///
/// The empty path returns the whole tree. A missing key at any depth fails
/// with [`TreeError::KeyNotFound`] carrying the full requested path; hitting
/// a leaf before the path is exhausted fails with [`TreeError::NotABranch`]
/// carrying the prefix that addresses the leaf. Never mutates the tree.
pub fn get_path<'a, S: AsRef<str>>(tree: &'a Value, path: &[S]) -> Result<&'a Value, TreeError> {
    let mut node = tree;
    for (depth, key) in path.iter().enumerate() {
        let branch = node
            .as_object()
            .ok_or_else(|| TreeError::NotABranch(to_owned_path(&path[..depth])))?;
        node = branch
            .get(key.as_ref())
            .ok_or_else(|| TreeError::KeyNotFound(to_owned_path(path)))?;
    }
    Ok(node)
}

/// Assign `value` at `path` in `tree`, creating intermediate branches.
///
/// Every missing intermediate key is created as an empty object. An existing
/// intermediate that is a leaf is never overwritten; it fails with
/// [`TreeError::NotABranch`] instead. Branches created before such a failure
/// is discovered remain in place (branch creation is the intended mutation);
/// no other mutation happens on failure paths. The empty path fails with
/// [`TreeError::InvalidPath`] without touching the tree.
pub fn set_path<S: AsRef<str>>(
    tree: &mut Value,
    path: &[S],
    value: Value,
) -> Result<(), TreeError> {
    let Some((terminal, intermediates)) = path.split_last() else {
        return Err(TreeError::InvalidPath);
    };

    let mut node = tree;
    for (depth, key) in intermediates.iter().enumerate() {
        let branch = node
            .as_object_mut()
            .ok_or_else(|| TreeError::NotABranch(to_owned_path(&path[..depth])))?;
        node = branch
            .entry(key.as_ref().to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }

    let branch = node
        .as_object_mut()
        .ok_or_else(|| TreeError::NotABranch(to_owned_path(intermediates)))?;
    branch.insert(terminal.as_ref().to_string(), value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_get_empty_path_returns_whole_tree() {
        let tree = json!({"a": 1});
        let empty: [&str; 0] = [];
        assert_eq!(get_path(&tree, &empty).unwrap(), &tree);
    }

    #[test]
    fn test_get_nested_value() {
        let tree = json!({"a": {"b": {"c": 42}}});
        assert_eq!(get_path(&tree, &["a", "b", "c"]).unwrap(), &json!(42));
        assert_eq!(get_path(&tree, &["a", "b"]).unwrap(), &json!({"c": 42}));
    }

    #[test]
    fn test_get_missing_key_reports_full_path() {
        let tree = json!({"a": {"b": 1}});
        let err = get_path(&tree, &["a", "x"]).unwrap_err();
        assert_eq!(
            err,
            TreeError::KeyNotFound(vec!["a".to_string(), "x".to_string()])
        );
    }

    #[test]
    fn test_get_through_leaf_fails() {
        let tree = json!({"a": 5});
        let err = get_path(&tree, &["a", "b"]).unwrap_err();
        assert_eq!(err, TreeError::NotABranch(vec!["a".to_string()]));
    }

    #[test]
    fn test_set_creates_intermediate_branches() {
        let mut tree = json!({});
        set_path(&mut tree, &["a", "b"], json!(5)).unwrap();
        assert_eq!(tree, json!({"a": {"b": 5}}));
    }

    #[test]
    fn test_set_then_get_roundtrip() {
        let mut tree = json!({"existing": true});
        set_path(&mut tree, &["x", "y", "z"], json!("deep")).unwrap();
        assert_eq!(get_path(&tree, &["x", "y", "z"]).unwrap(), &json!("deep"));
        assert_eq!(get_path(&tree, &["existing"]).unwrap(), &json!(true));
    }

    #[test]
    fn test_set_overwrites_terminal_value() {
        let mut tree = json!({"a": {"b": 1}});
        set_path(&mut tree, &["a", "b"], json!(2)).unwrap();
        assert_eq!(tree, json!({"a": {"b": 2}}));
    }

    #[test]
    fn test_set_preserves_sibling_keys() {
        let mut tree = json!({"a": {"keep": "me"}});
        set_path(&mut tree, &["a", "new"], json!(1)).unwrap();
        assert_eq!(tree, json!({"a": {"keep": "me", "new": 1}}));
    }

    #[test]
    fn test_set_empty_path_fails_without_mutation() {
        let mut tree = json!({"a": 1});
        let before = tree.clone();
        let empty: [&str; 0] = [];
        let err = set_path(&mut tree, &empty, json!(9)).unwrap_err();
        assert_eq!(err, TreeError::InvalidPath);
        assert_eq!(tree, before);
    }

    #[test]
    fn test_set_refuses_to_overwrite_leaf_intermediate() {
        let mut tree = json!({"a": 5});
        let err = set_path(&mut tree, &["a", "b"], json!(1)).unwrap_err();
        assert_eq!(err, TreeError::NotABranch(vec!["a".to_string()]));
        // The leaf itself is untouched.
        assert_eq!(tree, json!({"a": 5}));
    }

    #[test]
    fn test_set_on_non_object_root_fails() {
        let mut tree = json!(3);
        let err = set_path(&mut tree, &["a"], json!(1)).unwrap_err();
        assert_eq!(err, TreeError::NotABranch(vec![]));
    }
}
