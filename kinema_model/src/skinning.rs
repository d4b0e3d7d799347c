//! Bone bindings and per vertex bone influences for skinned meshes.
use glam::Mat4;
use log::warn;

use crate::{error::CreateRigError, hierarchy::Hierarchy, scene::SceneMesh};

/// The maximum number of bones that can influence a single vertex.
pub const MAX_INFLUENCES: usize = 4;

/// The bone id for the mesh node itself.
///
/// This bone has an identity offset and does not deform vertices.
/// Unused influence slots always refer to this bone.
pub const FALLBACK_BONE_ID: u32 = 0;

/// A bone used by a mesh and its offset in the bind pose.
#[derive(Debug, PartialEq, Clone)]
pub struct RigBoneInfo {
    /// The name of the [HierarchyNode](crate::hierarchy::HierarchyNode) for this bone.
    pub name: String,
    /// Transforms a vertex from mesh space to bone space in the bind pose.
    pub offset: Mat4,
}

/// The bones that deform a single mesh.
///
/// Bone names are resolved to node indices once when the rig is created.
#[derive(Debug, PartialEq, Clone)]
pub struct RigInfo {
    pub mesh_name: String,
    /// The name of the node the mesh is attached to.
    pub mesh_node_name: String,
    /// The bones indexed by bone id.
    /// The first bone is always the mesh node with an identity offset.
    pub bones: Vec<RigBoneInfo>,
    mesh_node_index: usize,
    bone_node_indices: Vec<usize>,
}

/// Up to [MAX_INFLUENCES] bone ids and weights for a vertex.
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct BoneInfluences {
    pub bone_ids: [u32; MAX_INFLUENCES],
    pub weights: [f32; MAX_INFLUENCES],
}

impl RigInfo {
    /// Create a rig for `mesh_name` attached to `mesh_node_name`.
    ///
    /// The fallback bone is inserted before `bones`,
    /// so the bone id of `bones[i]` is `i + 1`.
    pub fn new(
        mesh_name: impl Into<String>,
        mesh_node_name: impl Into<String>,
        bones: Vec<RigBoneInfo>,
        hierarchy: &Hierarchy,
    ) -> Result<Self, CreateRigError> {
        let mesh_name = mesh_name.into();
        let mesh_node_name = mesh_node_name.into();

        let mesh_node_index = hierarchy.node_index(&mesh_node_name).ok_or_else(|| {
            CreateRigError::MissingMeshNode {
                mesh: mesh_name.clone(),
                node: mesh_node_name.clone(),
            }
        })?;

        let bones: Vec<_> = std::iter::once(RigBoneInfo {
            name: mesh_node_name.clone(),
            offset: Mat4::IDENTITY,
        })
        .chain(bones)
        .collect();

        let bone_node_indices = bones
            .iter()
            .map(|bone| {
                hierarchy
                    .node_index(&bone.name)
                    .ok_or_else(|| CreateRigError::UnresolvedBone {
                        mesh: mesh_name.clone(),
                        bone: bone.name.clone(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            mesh_name,
            mesh_node_name,
            bones,
            mesh_node_index,
            bone_node_indices,
        })
    }

    /// Create a rig from the bones of `mesh`.
    /// Bones with the same name share a single bone id.
    pub fn from_scene_mesh(
        mesh: &SceneMesh,
        mesh_node_name: &str,
        hierarchy: &Hierarchy,
    ) -> Result<Self, CreateRigError> {
        let mut bones: Vec<RigBoneInfo> = Vec::new();
        for bone in &mesh.bones {
            if !bones.iter().any(|b| b.name == bone.name) {
                bones.push(RigBoneInfo {
                    name: bone.name.clone(),
                    offset: bone.offset,
                });
            }
        }

        Self::new(mesh.name.clone(), mesh_node_name, bones, hierarchy)
    }

    /// The bone id for the bone named `name`.
    pub fn bone_index(&self, name: &str) -> Option<usize> {
        self.bones
            .iter()
            .skip(1)
            .position(|b| b.name == name)
            .map(|i| i + 1)
            .or_else(|| (name == self.mesh_node_name).then_some(FALLBACK_BONE_ID as usize))
    }

    /// The number of bones including the fallback bone.
    pub fn bone_count(&self) -> usize {
        self.bones.len()
    }

    /// The hierarchy node index for the mesh node.
    pub fn mesh_node_index(&self) -> usize {
        self.mesh_node_index
    }

    /// The hierarchy node index for each bone id.
    pub fn bone_node_indices(&self) -> &[usize] {
        &self.bone_node_indices
    }
}

impl Default for BoneInfluences {
    fn default() -> Self {
        Self {
            bone_ids: [FALLBACK_BONE_ID; MAX_INFLUENCES],
            weights: [1.0, 0.0, 0.0, 0.0],
        }
    }
}

impl BoneInfluences {
    /// Assign `weight` for `bone_id` to the next open slot.
    ///
    /// Slots 1 to 3 are filled first and a fourth influence claims slot 0.
    /// Returns `false` if all slots are already used.
    pub fn add(&mut self, bone_id: u32, weight: f32) -> bool {
        if weight <= 0.0 {
            return true;
        }

        if let Some(i) = (1..MAX_INFLUENCES).find(|i| self.weights[*i] <= 0.0) {
            self.bone_ids[i] = bone_id;
            self.weights[i] = weight;
            true
        } else if self.bone_ids[0] == FALLBACK_BONE_ID {
            // The weight for slot 0 is calculated later from the other slots.
            self.bone_ids[0] = bone_id;
            true
        } else {
            false
        }
    }

    /// Set the slot 0 weight so that all weights sum to 1.0.
    pub fn normalize(&mut self) {
        let sum: f32 = self.weights[1..].iter().sum();
        if sum > 1.0 {
            for w in &mut self.weights[1..] {
                *w /= sum;
            }
            self.weights[0] = 0.0;
        } else {
            self.weights[0] = 1.0 - sum;
        }
    }

    pub fn weight_sum(&self) -> f32 {
        self.weights.iter().sum()
    }
}

/// Convert the per bone weights of `mesh` to per vertex bone ids and weights.
///
/// Only the first [MAX_INFLUENCES] influences for each vertex are included.
pub fn bone_influences(mesh: &SceneMesh, rig: &RigInfo) -> Vec<BoneInfluences> {
    let vertex_count = mesh.vertex_count();
    let mut influences = vec![BoneInfluences::default(); vertex_count];
    let mut ignored_count = 0;

    for bone in &mesh.bones {
        // The rig is created from the same mesh, so this should always succeed.
        let Some(bone_id) = rig.bone_index(&bone.name) else {
            continue;
        };

        for weight in &bone.weights {
            match influences.get_mut(weight.vertex_index as usize) {
                Some(vertex) => {
                    if !vertex.add(bone_id as u32, weight.weight) {
                        ignored_count += 1;
                    }
                }
                None => warn!(
                    "Vertex index {} for bone {:?} out of range for length {vertex_count}.",
                    weight.vertex_index, bone.name
                ),
            }
        }
    }

    if ignored_count > 0 {
        // TODO: Keep the largest weights instead of the first weights.
        warn!(
            "Ignored {ignored_count} weights in mesh {:?} with more than {MAX_INFLUENCES} influences.",
            mesh.name
        );
    }

    for vertex in &mut influences {
        vertex.normalize();
    }

    influences
}
