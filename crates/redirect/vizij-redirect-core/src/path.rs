//! Path resolution between slash-delimited paths and live scene nodes.
//!
//! Paths are relative to a root node: "Hips/Arm" names the child "Arm" of the
//! root's child "Hips"; the empty path names the root itself. "Not found" is the
//! ordinary answer for stale paths and is reported as `None`, never as an error.

use crate::ids::NodeHandle;
use crate::scene::SceneTree;

pub const SEPARATOR: char = '/';

/// Walk `path` from `root`, one child name per segment.
pub fn resolve<T: SceneTree + ?Sized>(
    tree: &T,
    root: NodeHandle,
    path: &str,
) -> Option<NodeHandle> {
    if !tree.is_alive(root) {
        return None;
    }
    if path.is_empty() {
        return Some(root);
    }
    let mut current = root;
    for segment in path.split(SEPARATOR) {
        current = tree
            .children(current)
            .into_iter()
            .find(|child| tree.name(*child) == Some(segment))?;
    }
    Some(current)
}

/// Current path of `node` relative to `root`, or `None` when `node` is dead,
/// detached, or lives outside `root`'s subtree.
pub fn relative_path<T: SceneTree + ?Sized>(
    tree: &T,
    root: NodeHandle,
    node: NodeHandle,
) -> Option<String> {
    if !tree.is_alive(root) || !tree.is_alive(node) {
        return None;
    }
    let mut segments: Vec<&str> = Vec::new();
    let mut current = node;
    while current != root {
        segments.push(tree.name(current)?);
        current = tree.parent(current)?;
    }
    segments.reverse();
    Some(segments.join("/"))
}

/// Path of `node` from its topmost ancestor, including that ancestor's name.
/// Used to name nodes that lie outside any tracked root.
pub fn absolute_path<T: SceneTree + ?Sized>(tree: &T, node: NodeHandle) -> Option<String> {
    if !tree.is_alive(node) {
        return None;
    }
    let mut segments: Vec<&str> = vec![tree.name(node)?];
    let mut current = node;
    while let Some(parent) = tree.parent(current) {
        segments.push(tree.name(parent)?);
        current = parent;
    }
    segments.reverse();
    Some(segments.join("/"))
}

/// Last segment of a path ("Hips/Arm" -> "Arm"; "" -> "").
pub fn leaf_name(path: &str) -> &str {
    path.rsplit(SEPARATOR).next().unwrap_or(path)
}

/// All live strict descendants of `root` named exactly `name`, depth-first.
pub fn find_by_name<T: SceneTree + ?Sized>(
    tree: &T,
    root: NodeHandle,
    name: &str,
) -> Vec<NodeHandle> {
    let mut found = Vec::new();
    if !tree.is_alive(root) {
        return found;
    }
    let mut stack: Vec<NodeHandle> = tree.children(root);
    stack.reverse();
    while let Some(node) = stack.pop() {
        if tree.name(node) == Some(name) {
            found.push(node);
        }
        let mut children = tree.children(node);
        children.reverse();
        stack.extend(children);
    }
    found
}
