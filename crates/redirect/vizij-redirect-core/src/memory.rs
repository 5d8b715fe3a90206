//! In-memory scene tree and curve store.
//!
//! Reference implementations of [`SceneTree`] and [`CurveStore`] for hosts without
//! their own hierarchy (tools, tests, headless pipelines). Both can be built from
//! serde descriptions so fixtures can live in JSON.

use hashbrown::{HashMap, HashSet};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::binding::CurveBinding;
use crate::curve::{ClipScope, CurvePayload, CurveStore, LayerSelection};
use crate::error::StoreError;
use crate::ids::{ClipId, IdAllocator, NodeHandle};
use crate::scene::{ComponentSet, ComponentType, SceneTree};

#[derive(Clone, Debug)]
struct MemoryNode {
    name: String,
    parent: Option<NodeHandle>,
    children: Vec<NodeHandle>,
    components: ComponentSet,
    blend_shapes: Vec<String>,
}

/// Mutable scene hierarchy with revocable handles.
///
/// Handles are never reused: destroying a node revokes its handle (and those of its
/// descendants) for good.
#[derive(Clone, Debug, Default)]
pub struct MemoryScene {
    ids: IdAllocator,
    nodes: HashMap<NodeHandle, MemoryNode>,
}

/// Serializable description of a node subtree.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct SceneDesc {
    pub name: String,
    #[serde(default)]
    pub components: Vec<ComponentType>,
    #[serde(default)]
    pub blend_shapes: Vec<String>,
    #[serde(default)]
    pub children: Vec<SceneDesc>,
}

impl MemoryScene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a scene holding one root subtree; returns the scene and the root handle.
    pub fn from_desc(desc: &SceneDesc) -> (Self, NodeHandle) {
        let mut scene = Self::new();
        let root = scene.add_root(&desc.name);
        scene.populate(root, desc);
        (scene, root)
    }

    pub fn from_json_str(json: &str) -> Result<(Self, NodeHandle), serde_json::Error> {
        let desc: SceneDesc = serde_json::from_str(json)?;
        Ok(Self::from_desc(&desc))
    }

    fn populate(&mut self, node: NodeHandle, desc: &SceneDesc) {
        for ty in &desc.components {
            self.add_component(node, ty.clone());
        }
        self.set_blend_shapes(node, desc.blend_shapes.iter().cloned());
        for child in &desc.children {
            let handle = self.add_child(node, &child.name);
            self.populate(handle, child);
        }
    }

    fn insert(&mut self, name: &str, parent: Option<NodeHandle>) -> NodeHandle {
        let handle = self.ids.alloc_node();
        self.nodes.insert(
            handle,
            MemoryNode {
                name: name.to_string(),
                parent,
                children: Vec::new(),
                components: ComponentSet::new(),
                blend_shapes: Vec::new(),
            },
        );
        handle
    }

    pub fn add_root(&mut self, name: &str) -> NodeHandle {
        self.insert(name, None)
    }

    /// Append a child. A dead parent yields a detached node.
    pub fn add_child(&mut self, parent: NodeHandle, name: &str) -> NodeHandle {
        if !self.nodes.contains_key(&parent) {
            return self.add_root(name);
        }
        let handle = self.insert(name, Some(parent));
        if let Some(p) = self.nodes.get_mut(&parent) {
            p.children.push(handle);
        }
        handle
    }

    pub fn rename(&mut self, node: NodeHandle, name: &str) -> bool {
        match self.nodes.get_mut(&node) {
            Some(n) => {
                n.name = name.to_string();
                true
            }
            None => false,
        }
    }

    pub fn add_component(&mut self, node: NodeHandle, ty: impl Into<ComponentType>) -> bool {
        self.nodes
            .get_mut(&node)
            .is_some_and(|n| n.components.insert(ty.into()))
    }

    pub fn remove_component(&mut self, node: NodeHandle, ty: impl Into<ComponentType>) -> bool {
        let ty = ty.into();
        self.nodes
            .get_mut(&node)
            .is_some_and(|n| n.components.remove(&ty))
    }

    pub fn set_blend_shapes<I, N>(&mut self, node: NodeHandle, names: I)
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
    {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.blend_shapes = names.into_iter().map(Into::into).collect();
        }
    }

    fn unlink(&mut self, node: NodeHandle) {
        let parent = self.nodes.get(&node).and_then(|n| n.parent);
        if let Some(pn) = parent.and_then(|p| self.nodes.get_mut(&p)) {
            pn.children.retain(|c| *c != node);
        }
        if let Some(n) = self.nodes.get_mut(&node) {
            n.parent = None;
        }
    }

    /// Move `node` under `new_parent`. Refuses dead handles and moves that would
    /// create a cycle.
    pub fn reparent(&mut self, node: NodeHandle, new_parent: NodeHandle) -> bool {
        if !self.nodes.contains_key(&node) || !self.nodes.contains_key(&new_parent) {
            return false;
        }
        let mut cursor = Some(new_parent);
        while let Some(c) = cursor {
            if c == node {
                return false;
            }
            cursor = self.nodes.get(&c).and_then(|n| n.parent);
        }
        self.unlink(node);
        if let Some(n) = self.nodes.get_mut(&node) {
            n.parent = Some(new_parent);
        }
        if let Some(p) = self.nodes.get_mut(&new_parent) {
            p.children.push(node);
        }
        true
    }

    /// Turn `node` into a parentless root; it stays alive.
    pub fn detach(&mut self, node: NodeHandle) -> bool {
        if !self.nodes.contains_key(&node) {
            return false;
        }
        self.unlink(node);
        true
    }

    /// Destroy `node` and its whole subtree, revoking every handle in it.
    pub fn destroy(&mut self, node: NodeHandle) -> bool {
        if !self.nodes.contains_key(&node) {
            return false;
        }
        self.unlink(node);
        let mut stack = vec![node];
        while let Some(n) = stack.pop() {
            if let Some(removed) = self.nodes.remove(&n) {
                stack.extend(removed.children);
            }
        }
        true
    }
}

impl SceneTree for MemoryScene {
    fn is_alive(&self, node: NodeHandle) -> bool {
        self.nodes.contains_key(&node)
    }

    fn name(&self, node: NodeHandle) -> Option<&str> {
        self.nodes.get(&node).map(|n| n.name.as_str())
    }

    fn parent(&self, node: NodeHandle) -> Option<NodeHandle> {
        self.nodes.get(&node).and_then(|n| n.parent)
    }

    fn children(&self, node: NodeHandle) -> Vec<NodeHandle> {
        self.nodes
            .get(&node)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    fn components_of(&self, node: NodeHandle) -> ComponentSet {
        self.nodes
            .get(&node)
            .map(|n| n.components.clone())
            .unwrap_or_default()
    }

    fn blend_shape_names(&self, node: NodeHandle) -> Vec<String> {
        self.nodes
            .get(&node)
            .map(|n| n.blend_shapes.clone())
            .unwrap_or_default()
    }
}

#[derive(Clone, Debug, Default)]
struct MemoryClip {
    name: String,
    curves: IndexMap<CurveBinding, CurvePayload>,
}

/// Clips keyed by id plus controllers listing clips per layer.
#[derive(Clone, Debug, Default)]
pub struct MemoryCurveStore {
    ids: IdAllocator,
    clips: IndexMap<ClipId, MemoryClip>,
    controllers: IndexMap<String, Vec<Vec<ClipId>>>,
    dirty: HashSet<ClipId>,
    persist_count: usize,
    fail_next_persist: Option<String>,
}

/// One curve of a [`ClipDesc`]. The binding kind follows the payload kind.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CurveDesc {
    pub path: String,
    pub component_type: ComponentType,
    pub property_name: String,
    pub curve: CurvePayload,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct ClipDesc {
    pub name: String,
    #[serde(default)]
    pub curves: Vec<CurveDesc>,
}

/// Controller layers list clip names.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct ControllerDesc {
    pub name: String,
    #[serde(default)]
    pub layers: Vec<Vec<String>>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct StoreDesc {
    #[serde(default)]
    pub clips: Vec<ClipDesc>,
    #[serde(default)]
    pub controllers: Vec<ControllerDesc>,
}

impl MemoryCurveStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from a description. Controller layers naming unknown clips skip them.
    pub fn from_desc(desc: &StoreDesc) -> Self {
        let mut store = Self::new();
        for clip in &desc.clips {
            let id = store.add_clip(&clip.name);
            for curve in &clip.curves {
                let binding = CurveBinding::new(
                    curve.path.clone(),
                    curve.component_type.clone(),
                    curve.property_name.clone(),
                    curve.curve.kind(),
                );
                store.insert_curve(id, binding, curve.curve.clone());
            }
        }
        for controller in &desc.controllers {
            let layers = controller
                .layers
                .iter()
                .map(|layer| layer.iter().filter_map(|name| store.clip_id(name)).collect())
                .collect();
            store.controllers.insert(controller.name.clone(), layers);
        }
        store
    }

    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        let desc: StoreDesc = serde_json::from_str(json)?;
        Ok(Self::from_desc(&desc))
    }

    pub fn add_clip(&mut self, name: &str) -> ClipId {
        let id = self.ids.alloc_clip();
        self.clips.insert(
            id,
            MemoryClip {
                name: name.to_string(),
                curves: IndexMap::new(),
            },
        );
        id
    }

    /// Register (or replace) a controller's layers.
    pub fn set_controller(&mut self, name: &str, layers: Vec<Vec<ClipId>>) {
        self.controllers.insert(name.to_string(), layers);
    }

    /// Append a clip to one layer of a controller, creating missing layers.
    pub fn add_to_layer(&mut self, controller: &str, layer: usize, clip: ClipId) {
        let layers = self.controllers.entry(controller.to_string()).or_default();
        if layers.len() <= layer {
            layers.resize_with(layer + 1, Vec::new);
        }
        layers[layer].push(clip);
    }

    pub fn clip_id(&self, name: &str) -> Option<ClipId> {
        self.clips
            .iter()
            .find_map(|(id, clip)| (clip.name == name).then_some(*id))
    }

    pub fn curve_count(&self, clip: ClipId) -> usize {
        self.clips.get(&clip).map_or(0, |c| c.curves.len())
    }

    /// Clips modified since the last successful persist.
    pub fn dirty_clips(&self) -> impl Iterator<Item = ClipId> + '_ {
        self.dirty.iter().copied()
    }

    pub fn persist_count(&self) -> usize {
        self.persist_count
    }

    /// Make the next `persist` call fail with the given message.
    pub fn fail_next_persist(&mut self, message: &str) {
        self.fail_next_persist = Some(message.to_string());
    }

    fn insert_curve(&mut self, clip: ClipId, binding: CurveBinding, payload: CurvePayload) {
        if let Some(c) = self.clips.get_mut(&clip) {
            c.curves.insert(binding, payload);
        }
    }
}

impl CurveStore for MemoryCurveStore {
    fn resolve_scope(&self, scope: &ClipScope) -> Vec<ClipId> {
        let candidates: Vec<ClipId> = match scope {
            ClipScope::Clips(clips) => clips.clone(),
            ClipScope::Controller { controller, layer } => {
                let Some(layers) = self.controllers.get(controller) else {
                    return Vec::new();
                };
                match layer {
                    LayerSelection::All => layers.iter().flatten().copied().collect(),
                    LayerSelection::Layer(idx) => layers.get(*idx).cloned().unwrap_or_default(),
                }
            }
        };
        let mut seen = HashSet::new();
        candidates
            .into_iter()
            .filter(|id| self.clips.contains_key(id) && seen.insert(*id))
            .collect()
    }

    fn bindings(&self, clip: ClipId) -> Vec<CurveBinding> {
        self.clips
            .get(&clip)
            .map(|c| c.curves.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn read_curve(&self, clip: ClipId, binding: &CurveBinding) -> Option<CurvePayload> {
        self.clips.get(&clip)?.curves.get(binding).cloned()
    }

    fn write_curve(&mut self, clip: ClipId, binding: &CurveBinding, payload: CurvePayload) {
        let mut binding = binding.clone();
        binding.kind = payload.kind();
        if let Some(c) = self.clips.get_mut(&clip) {
            // keys compare by triple only; drop the old key so its kind is replaced too
            c.curves.shift_remove(&binding);
            c.curves.insert(binding, payload);
            self.dirty.insert(clip);
        }
    }

    fn clear_curve(&mut self, clip: ClipId, binding: &CurveBinding) {
        if let Some(c) = self.clips.get_mut(&clip) {
            if c.curves.shift_remove(binding).is_some() {
                self.dirty.insert(clip);
            }
        }
    }

    fn persist(&mut self) -> Result<(), StoreError> {
        if let Some(message) = self.fail_next_persist.take() {
            return Err(StoreError(message));
        }
        self.dirty.clear();
        self.persist_count += 1;
        Ok(())
    }
}
