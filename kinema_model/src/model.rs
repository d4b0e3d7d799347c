use glam::{Mat3, Mat4, Vec3};
use log::{debug, warn};

use crate::{
    animation::AnimationClip,
    error::{CreateHierarchyError, LoadModelError},
    hierarchy::Hierarchy,
    scene::{SceneMesh, SceneNode, SceneRoot},
    skinning::{RigInfo, bone_influences},
    vertex::{BoundingSphere, SkinnedVertex, Vertex, Vertices, interleave_vertices},
};

/// A loaded asset with its node hierarchy, animations and meshes.
///
/// The model is never modified after loading,
/// so it can be shared by any number of [PlaybackState](crate::PlaybackState).
#[derive(Debug, PartialEq, Clone)]
pub struct AnimatedModel {
    pub hierarchy: Hierarchy,
    pub clips: Vec<AnimationClip>,
    pub meshes: Vec<Mesh>,
}

/// A mesh ready for rendering.
#[derive(Debug, PartialEq, Clone)]
pub struct Mesh {
    pub name: String,
    pub vertices: Vertices,
    pub indices: Vec<u32>,
    pub material_index: usize,
    /// The bones for skinning or `None` for meshes without bones.
    pub rig: Option<RigInfo>,
    pub bounding_sphere: BoundingSphere,
}

impl AnimatedModel {
    /// Load the hierarchy, all animations and all meshes from `scene`.
    ///
    /// Meshes are created for each node that references them in hierarchy order
    /// followed by any meshes not referenced by a node.
    /// Any invalid node or bone reference fails the entire model.
    #[tracing::instrument(skip_all)]
    pub fn from_scene(scene: &SceneRoot) -> Result<Self, LoadModelError> {
        let root = scene
            .root
            .as_ref()
            .ok_or(CreateHierarchyError::MissingRoot)?;

        check_mesh_indices(root, scene.meshes.len())?;

        let hierarchy =
            Hierarchy::from_scene(root, |i| scene.meshes.get(i).map(|m| m.name.clone()))?;

        let clips: Vec<_> = scene
            .animations
            .iter()
            .map(AnimationClip::from_scene_animation)
            .collect();

        let bind_pose = hierarchy.bind_pose_world_transforms();

        // Each node that references a mesh gets its own copy.
        let mut meshes = Vec::new();
        let mut is_attached = vec![false; scene.meshes.len()];
        for node in hierarchy.nodes() {
            for i in &node.mesh_indices {
                let mesh = &scene.meshes[*i];
                meshes.push(Mesh::from_scene_mesh(
                    mesh,
                    &hierarchy,
                    node.index,
                    bind_pose[node.index],
                )?);
                is_attached[*i] = true;
            }
        }

        for (mesh, _) in scene
            .meshes
            .iter()
            .zip(&is_attached)
            .filter(|(_, attached)| !**attached)
        {
            debug!(
                "Mesh {:?} is not attached to a node. Using the root node.",
                mesh.name
            );
            meshes.push(Mesh::from_scene_mesh(mesh, &hierarchy, 0, bind_pose[0])?);
        }

        debug!(
            "Loaded {} nodes, {} clips, {} meshes",
            hierarchy.len(),
            clips.len(),
            meshes.len()
        );

        Ok(Self {
            hierarchy,
            clips,
            meshes,
        })
    }

    /// The index of the first clip named `name`.
    pub fn clip_index(&self, name: &str) -> Option<usize> {
        self.clips.iter().position(|c| c.name == name)
    }

    /// A sphere enclosing all meshes in the bind pose.
    ///
    /// Spheres for meshes with a rig are moved from the space of their mesh node.
    pub fn bounding_sphere(&self) -> BoundingSphere {
        let bind_pose = self.hierarchy.bind_pose_world_transforms();
        let spheres: Vec<_> = self
            .meshes
            .iter()
            .map(|mesh| match &mesh.rig {
                Some(rig) => match bind_pose.get(rig.mesh_node_index()) {
                    Some(transform) => mesh.bounding_sphere.transform(*transform),
                    None => mesh.bounding_sphere,
                },
                None => mesh.bounding_sphere,
            })
            .collect();
        BoundingSphere::from_spheres(&spheres)
    }
}

impl Mesh {
    /// Convert `mesh` to interleaved vertices.
    ///
    /// Meshes with bones stay in the space of the node at `node_index`
    /// to match the skinning matrices.
    /// Meshes without bones are transformed by `world_transform` of that node.
    pub fn from_scene_mesh(
        mesh: &SceneMesh,
        hierarchy: &Hierarchy,
        node_index: usize,
        world_transform: Mat4,
    ) -> Result<Self, crate::error::CreateRigError> {
        let mut vertices = interleave_vertices(
            &mesh.positions,
            &mesh.uvs,
            &mesh.normals,
            &mesh.tangents,
            &mesh.bitangents,
        );

        let (vertices, rig) = if mesh.bones.is_empty() {
            transform_vertices(&mut vertices, world_transform);
            (Vertices::Static(vertices), None)
        } else {
            let mesh_node_name = hierarchy
                .nodes()
                .get(node_index)
                .map(|n| n.name.as_str())
                .unwrap_or_default();
            let rig = RigInfo::from_scene_mesh(mesh, mesh_node_name, hierarchy)?;
            let vertices = vertices
                .into_iter()
                .zip(bone_influences(mesh, &rig))
                .map(|(v, influences)| SkinnedVertex::new(v, influences))
                .collect();
            (Vertices::Skinned(vertices), Some(rig))
        };

        let vertex_count = vertices.len();
        let indices: Vec<_> = mesh
            .indices
            .iter()
            .copied()
            .filter(|i| {
                let valid = (*i as usize) < vertex_count;
                if !valid {
                    warn!(
                        "Vertex index {i} in mesh {:?} out of range for length {vertex_count}.",
                        mesh.name
                    );
                }
                valid
            })
            .collect();

        let bounding_sphere = BoundingSphere::from_positions(&vertices.positions());

        Ok(Self {
            name: mesh.name.clone(),
            vertices,
            indices,
            material_index: mesh.material_index,
            rig,
            bounding_sphere,
        })
    }
}

fn check_mesh_indices(root: &SceneNode, mesh_count: usize) -> Result<(), LoadModelError> {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if let Some(index) = node.meshes.iter().find(|i| **i >= mesh_count) {
            return Err(LoadModelError::MeshIndex {
                node: node.name.clone(),
                index: *index,
                count: mesh_count,
            });
        }
        stack.extend(node.children.iter());
    }
    Ok(())
}

fn transform_vertices(vertices: &mut [Vertex], transform: Mat4) {
    if transform == Mat4::IDENTITY {
        return;
    }

    // Directions ignore translation.
    // Normals use the inverse transpose to stay perpendicular under non uniform scale.
    let matrix3 = Mat3::from_mat4(transform);
    let normal_matrix = matrix3.inverse().transpose();

    for vertex in vertices {
        vertex.position = transform.transform_point3(vertex.position);
        vertex.normal = (normal_matrix * vertex.normal).normalize_or_zero();
        vertex.tangent = (matrix3 * vertex.tangent).normalize_or_zero();
        vertex.bitangent = (matrix3 * vertex.bitangent).normalize_or_zero();
    }
}
