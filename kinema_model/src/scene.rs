//! Imported scene data used to create an [AnimatedModel](crate::AnimatedModel).
//!
//! These types describe the output of an asset importer
//! without depending on any particular file format.
//! Enable the `serde` feature to read and write scenes as JSON or similar formats.
use glam::{Mat4, Quat, Vec2, Vec3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, PartialEq, Clone, Default)]
pub struct SceneRoot {
    /// The root of the node tree or `None` for an incomplete scene.
    pub root: Option<SceneNode>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub meshes: Vec<SceneMesh>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub animations: Vec<SceneAnimation>,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, PartialEq, Clone)]
pub struct SceneNode {
    pub name: String,
    /// The transform relative to the parent node.
    pub transform: Mat4,
    /// Indices into [meshes](struct.SceneRoot.html#structfield.meshes).
    #[cfg_attr(feature = "serde", serde(default))]
    pub meshes: Vec<usize>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub children: Vec<SceneNode>,
}

impl SceneNode {
    /// A node with no meshes or children.
    pub fn new(name: impl Into<String>, transform: Mat4) -> Self {
        Self {
            name: name.into(),
            transform,
            meshes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<SceneNode>) -> Self {
        self.children = children;
        self
    }

    pub fn with_meshes(mut self, meshes: Vec<usize>) -> Self {
        self.meshes = meshes;
        self
    }
}

/// Per vertex attributes and bone weights for a single mesh.
///
/// Attribute lists other than [positions](#structfield.positions) may be empty.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, PartialEq, Clone, Default)]
pub struct SceneMesh {
    pub name: String,
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub tangents: Vec<Vec3>,
    pub bitangents: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
    pub indices: Vec<u32>,
    pub material_index: usize,
    pub bones: Vec<SceneBone>,
}

impl SceneMesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, PartialEq, Clone)]
pub struct SceneBone {
    /// The name of the node that controls this bone.
    pub name: String,
    /// Transforms a vertex from mesh space to bone space in the bind pose.
    pub offset: Mat4,
    #[cfg_attr(feature = "serde", serde(default))]
    pub weights: Vec<SceneVertexWeight>,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct SceneVertexWeight {
    pub vertex_index: u32,
    pub weight: f32,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, PartialEq, Clone)]
pub struct SceneAnimation {
    pub name: String,
    /// The length of the animation in ticks or `0.0` if unknown.
    #[cfg_attr(feature = "serde", serde(default))]
    pub duration: f32,
    /// The number of ticks per second or `0.0` if unknown.
    #[cfg_attr(feature = "serde", serde(default))]
    pub ticks_per_second: f32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub channels: Vec<SceneChannel>,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, PartialEq, Clone, Default)]
pub struct SceneChannel {
    pub node_name: String,
    pub position_keys: Vec<SceneKey<Vec3>>,
    pub rotation_keys: Vec<SceneKey<Quat>>,
    pub scale_keys: Vec<SceneKey<Vec3>>,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct SceneKey<T> {
    pub time: f32,
    pub value: T,
}
