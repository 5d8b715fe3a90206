//! Curve bindings and their classification.
//!
//! A binding identifies one animation curve by `(path, component_type, property_name)`.
//! The classifier collapses related properties into canonical groups (all position
//! axes become "Position") and recognizes blend-shape curves.

use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::scene::ComponentType;

/// Payload kind of a curve.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurveKind {
    /// time -> float keyframes
    #[default]
    Scalar,
    /// time -> object-handle keyframes
    ObjectReference,
}

/// Identifier of one animation curve inside a clip.
///
/// Equality and hashing are structural on the `(path, component_type, property_name)`
/// triple; `kind` describes the payload and does not take part in identity.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CurveBinding {
    pub path: String,
    pub component_type: ComponentType,
    pub property_name: String,
    #[serde(default)]
    pub kind: CurveKind,
}

impl CurveBinding {
    pub fn new(
        path: impl Into<String>,
        component_type: impl Into<ComponentType>,
        property_name: impl Into<String>,
        kind: CurveKind,
    ) -> Self {
        Self {
            path: path.into(),
            component_type: component_type.into(),
            property_name: property_name.into(),
            kind,
        }
    }

    pub fn scalar(
        path: impl Into<String>,
        component_type: impl Into<ComponentType>,
        property_name: impl Into<String>,
    ) -> Self {
        Self::new(path, component_type, property_name, CurveKind::Scalar)
    }

    pub fn object_reference(
        path: impl Into<String>,
        component_type: impl Into<ComponentType>,
        property_name: impl Into<String>,
    ) -> Self {
        Self::new(path, component_type, property_name, CurveKind::ObjectReference)
    }

    /// Same component/property/kind at another path.
    pub fn with_path(&self, path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..self.clone()
        }
    }

    /// Same path/component/kind with another property name.
    pub fn with_property(&self, property_name: impl Into<String>) -> Self {
        Self {
            property_name: property_name.into(),
            ..self.clone()
        }
    }

    #[inline]
    pub fn is_object_reference(&self) -> bool {
        self.kind == CurveKind::ObjectReference
    }
}

impl PartialEq for CurveBinding {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
            && self.component_type == other.component_type
            && self.property_name == other.property_name
    }
}

impl Eq for CurveBinding {}

impl Hash for CurveBinding {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.path.hash(state);
        self.component_type.hash(state);
        self.property_name.hash(state);
    }
}

pub const POSITION_GROUP: &str = "Position";
pub const ROTATION_GROUP: &str = "Rotation";
pub const SCALE_GROUP: &str = "Scale";
pub const BLEND_SHAPE_GROUP: &str = "BlendShape";

const POSITION_PROPERTIES: &[&str] = &["m_LocalPosition"];
const ROTATION_PROPERTIES: &[&str] = &[
    "m_LocalRotation",
    "localEulerAnglesRaw",
    "m_LocalEulerAngles",
];
const SCALE_PROPERTIES: &[&str] = &["m_LocalScale"];

/// Canonicalizes property names and recognizes blend-shape curves.
#[derive(Clone, Debug)]
pub struct BindingClassifier {
    transform_type: ComponentType,
    blend_shape_renderer: ComponentType,
    blend_shape_prefix: String,
}

impl BindingClassifier {
    pub fn new(cfg: &Config) -> Self {
        Self {
            transform_type: cfg.transform_type.clone(),
            blend_shape_renderer: cfg.blend_shape_renderer.clone(),
            blend_shape_prefix: cfg.blend_shape_prefix.clone(),
        }
    }

    /// Semantic group of a property. Total: unknown properties are their own group.
    pub fn canonical_group(&self, component_type: &ComponentType, property_name: &str) -> String {
        if *component_type == self.transform_type {
            if let Some((base, axis)) = property_name.rsplit_once('.') {
                let is_axis = matches!(axis, "x" | "y" | "z");
                if is_axis && POSITION_PROPERTIES.contains(&base) {
                    return POSITION_GROUP.to_string();
                }
                if (is_axis || axis == "w") && ROTATION_PROPERTIES.contains(&base) {
                    return ROTATION_GROUP.to_string();
                }
                if is_axis && SCALE_PROPERTIES.contains(&base) {
                    return SCALE_GROUP.to_string();
                }
            }
        }
        if property_name.starts_with(&self.blend_shape_prefix) {
            return BLEND_SHAPE_GROUP.to_string();
        }
        property_name.to_string()
    }

    pub fn is_blend_shape_property(
        &self,
        component_type: &ComponentType,
        property_name: &str,
    ) -> bool {
        *component_type == self.blend_shape_renderer
            && property_name.len() > self.blend_shape_prefix.len()
            && property_name.starts_with(&self.blend_shape_prefix)
    }

    /// "blendShape.Blink" -> Some("Blink").
    pub fn blend_shape_name<'a>(&self, property_name: &'a str) -> Option<&'a str> {
        property_name
            .strip_prefix(self.blend_shape_prefix.as_str())
            .filter(|name| !name.is_empty())
    }

    /// "Blink" -> "blendShape.Blink".
    pub fn blend_shape_property(&self, name: &str) -> String {
        format!("{}{}", self.blend_shape_prefix, name)
    }
}

impl Default for BindingClassifier {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hashbrown::HashSet;

    fn transform() -> ComponentType {
        ComponentType::new("Transform")
    }

    #[test]
    fn transform_axes_collapse_to_groups() {
        let c = BindingClassifier::default();
        for axis in ["x", "y", "z"] {
            let group = |prop: String| c.canonical_group(&transform(), &prop);
            assert_eq!(group(format!("m_LocalPosition.{axis}")), "Position");
            assert_eq!(group(format!("m_LocalScale.{axis}")), "Scale");
            assert_eq!(group(format!("localEulerAnglesRaw.{axis}")), "Rotation");
        }
        assert_eq!(c.canonical_group(&transform(), "m_LocalRotation.w"), "Rotation");
        // `w` is not a position axis
        assert_eq!(c.canonical_group(&transform(), "m_LocalPosition.w"), "m_LocalPosition.w");
    }

    #[test]
    fn non_transform_properties_map_to_themselves() {
        let c = BindingClassifier::default();
        let light = ComponentType::new("Light");
        assert_eq!(c.canonical_group(&light, "m_Intensity"), "m_Intensity");
        assert_eq!(c.canonical_group(&light, "m_LocalPosition.x"), "m_LocalPosition.x");
    }

    #[test]
    fn blend_shapes_are_recognized_only_on_the_renderer() {
        let c = BindingClassifier::default();
        let smr = ComponentType::new("SkinnedMeshRenderer");
        assert_eq!(c.canonical_group(&smr, "blendShape.Blink"), "BlendShape");
        assert!(c.is_blend_shape_property(&smr, "blendShape.Blink"));
        assert!(!c.is_blend_shape_property(&smr, "blendShape."));
        assert!(!c.is_blend_shape_property(&transform(), "blendShape.Blink"));
        assert!(!c.is_blend_shape_property(&smr, "m_Enabled"));
        assert_eq!(c.blend_shape_name("blendShape.Blink"), Some("Blink"));
        assert_eq!(c.blend_shape_property("Smile"), "blendShape.Smile");
    }

    #[test]
    fn identity_ignores_kind() {
        let a = CurveBinding::scalar("Hips", "Transform", "m_LocalPosition.x");
        let b = CurveBinding::object_reference("Hips", "Transform", "m_LocalPosition.x");
        assert_eq!(a, b);
        let mut set = HashSet::new();
        set.insert(a.clone());
        assert!(!set.insert(b));
        assert_ne!(a, a.with_path("Hips/Arm"));
    }
}
