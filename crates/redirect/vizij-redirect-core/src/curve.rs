//! Curve payloads, clip scopes and the curve-store capability consumed by the core.
//!
//! How a curve is physically stored is entirely the store's concern; the core only
//! enumerates bindings and reads, writes or clears whole payloads.

use serde::{Deserialize, Serialize};

use crate::binding::{CurveBinding, CurveKind};
use crate::error::StoreError;
use crate::ids::ClipId;

/// One float keyframe.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct ScalarKey {
    pub time: f32,
    pub value: f32,
    #[serde(default)]
    pub in_tangent: f32,
    #[serde(default)]
    pub out_tangent: f32,
}

impl ScalarKey {
    pub fn new(time: f32, value: f32) -> Self {
        Self {
            time,
            value,
            in_tangent: 0.0,
            out_tangent: 0.0,
        }
    }
}

/// One object-reference keyframe; `object` is an opaque host reference.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ObjectKey {
    pub time: f32,
    pub object: Option<String>,
}

/// Keyframe data of one curve.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", content = "keys", rename_all = "snake_case")]
pub enum CurvePayload {
    Scalar(Vec<ScalarKey>),
    ObjectReference(Vec<ObjectKey>),
}

impl CurvePayload {
    #[inline]
    pub fn kind(&self) -> CurveKind {
        match self {
            CurvePayload::Scalar(_) => CurveKind::Scalar,
            CurvePayload::ObjectReference(_) => CurveKind::ObjectReference,
        }
    }

    #[inline]
    pub fn key_count(&self) -> usize {
        match self {
            CurvePayload::Scalar(keys) => keys.len(),
            CurvePayload::ObjectReference(keys) => keys.len(),
        }
    }

    /// A curve without keyframes carries nothing worth tracking.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.key_count() == 0
    }
}

/// Which layers of a controller contribute clips.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LayerSelection {
    #[default]
    All,
    Layer(usize),
}

/// Description of the clips a session covers. Kept on the session so the clip set can
/// be re-derived at apply time (clips may have been added to the scope meanwhile).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ClipScope {
    /// An explicit, already resolved clip list.
    Clips(Vec<ClipId>),
    /// Every clip referenced by a controller, optionally limited to one layer.
    Controller {
        controller: String,
        #[serde(default)]
        layer: LayerSelection,
    },
}

impl ClipScope {
    pub fn controller(controller: impl Into<String>, layer: LayerSelection) -> Self {
        ClipScope::Controller {
            controller: controller.into(),
            layer,
        }
    }
}

/// Trait implemented by hosts to expose their clip data.
pub trait CurveStore {
    /// Resolve a scope to its clips, deduplicated, in a stable order.
    fn resolve_scope(&self, scope: &ClipScope) -> Vec<ClipId>;
    /// Every scalar and object-reference binding carried by a clip.
    fn bindings(&self, clip: ClipId) -> Vec<CurveBinding>;
    fn read_curve(&self, clip: ClipId, binding: &CurveBinding) -> Option<CurvePayload>;
    fn write_curve(&mut self, clip: ClipId, binding: &CurveBinding, payload: CurvePayload);
    fn clear_curve(&mut self, clip: ClipId, binding: &CurveBinding);
    /// Flush modified clips to durable storage.
    fn persist(&mut self) -> Result<(), StoreError>;
}
