//! Scene-tree query capability consumed by the core.
//!
//! The tree is external, mutable state: a human may rename, move, delete or strip
//! nodes between any two calls. The core never caches anything derived from it
//! beyond one reconciliation pass and revalidates every handle at the moment of use.

use std::fmt;

use hashbrown::HashSet;
use serde::{Deserialize, Serialize};

use crate::ids::NodeHandle;

/// Name of a component type (e.g. "Transform", "SkinnedMeshRenderer").
#[derive(Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentType(pub String);

impl ComponentType {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ComponentType {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Closed set of component types carried by one node.
pub type ComponentSet = HashSet<ComponentType>;

/// Trait implemented by hosts to expose their hierarchy.
///
/// Every query takes a handle that may be stale; implementations answer `false`,
/// `None` or an empty collection for handles that no longer denote a live node.
pub trait SceneTree {
    fn is_alive(&self, node: NodeHandle) -> bool;
    fn name(&self, node: NodeHandle) -> Option<&str>;
    fn parent(&self, node: NodeHandle) -> Option<NodeHandle>;
    fn children(&self, node: NodeHandle) -> Vec<NodeHandle>;
    fn components_of(&self, node: NodeHandle) -> ComponentSet;
    /// Blend-shape names of the mesh rendered by the node, in mesh order.
    fn blend_shape_names(&self, node: NodeHandle) -> Vec<String>;
}

impl NodeHandle {
    /// Revalidate this handle: `Some(self)` only while it denotes a live node that is
    /// `root` itself or one of its descendants.
    pub fn resolve<T: SceneTree + ?Sized>(self, tree: &T, root: NodeHandle) -> Option<NodeHandle> {
        crate::path::relative_path(tree, root, self).map(|_| self)
    }
}
