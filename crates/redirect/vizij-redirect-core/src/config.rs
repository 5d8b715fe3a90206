//! Core configuration for vizij-redirect-core.

use serde::{Deserialize, Serialize};

use crate::scene::ComponentType;

/// Names of the component types the core treats specially, plus session defaults.
/// Hosts with different type naming override the fields; the defaults follow the
/// usual scene-graph conventions.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Structural type every node carries; always satisfied when validating a fix target.
    pub transform_type: ComponentType,
    /// Structural type denoting the node itself; always satisfied as well.
    pub game_object_type: ComponentType,
    /// Renderer type whose `blendShape.*` properties are treated as blend-shape curves.
    pub blend_shape_renderer: ComponentType,
    /// Property prefix of blend-shape curves.
    pub blend_shape_prefix: String,

    /// Initial value of `Session::ignore_unresolved_missing`.
    pub ignore_unresolved_missing: bool,
    /// Call `CurveStore::persist` once after an apply pass that touched any clip.
    pub persist_on_apply: bool,
}

impl Config {
    /// Structural types need no matching component on a fix target.
    #[inline]
    pub fn is_structural(&self, ty: &ComponentType) -> bool {
        *ty == self.transform_type || *ty == self.game_object_type
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            transform_type: ComponentType::new("Transform"),
            game_object_type: ComponentType::new("GameObject"),
            blend_shape_renderer: ComponentType::new("SkinnedMeshRenderer"),
            blend_shape_prefix: "blendShape.".to_string(),
            ignore_unresolved_missing: false,
            persist_on_apply: true,
        }
    }
}
