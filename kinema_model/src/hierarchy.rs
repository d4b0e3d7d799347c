use std::collections::BTreeSet;
use std::fmt::Write;

use glam::Mat4;

use crate::{error::CreateHierarchyError, scene::SceneNode};

/// The tree of nodes for an imported scene.
///
/// Nodes are stored in depth first pre-order,
/// so every node appears after its parent and the root is always at index 0.
/// The hierarchy is never modified after creation
/// since evaluators and rigs cache node indices.
#[derive(Debug, PartialEq, Clone)]
pub struct Hierarchy {
    nodes: Vec<HierarchyNode>,
}

/// A single node in the [Hierarchy].
#[derive(Debug, PartialEq, Clone)]
pub struct HierarchyNode {
    /// The name used by animations and mesh bones to identify this node.
    pub name: String,
    /// The position of this node in [nodes](struct.Hierarchy.html#method.nodes).
    pub index: usize,
    /// The bind pose transform of the node relative to its parent.
    pub local_transform: Mat4,
    /// The index of the parent node or `None` for the root.
    pub parent_index: Option<usize>,
    pub children: BTreeSet<usize>,
    /// The indices of the scene meshes attached to this node.
    /// The same mesh may be attached to multiple nodes.
    pub mesh_indices: Vec<usize>,
    /// The names of meshes attached to this node.
    pub mesh_names: Vec<String>,
}

impl Hierarchy {
    /// Flatten the tree starting at `root` in depth first pre-order.
    ///
    /// `mesh_name` converts the mesh indices of a node to mesh names.
    pub fn from_scene<F>(root: &SceneNode, mesh_name: F) -> Result<Self, CreateHierarchyError>
    where
        F: Fn(usize) -> Option<String>,
    {
        let mut nodes: Vec<HierarchyNode> = Vec::new();

        // Push children in reverse to visit them in their original order.
        let mut stack = vec![(root, None)];
        while let Some((scene_node, parent_index)) = stack.pop() {
            if nodes.iter().any(|n| n.name == scene_node.name) {
                return Err(CreateHierarchyError::DuplicateNodeName {
                    name: scene_node.name.clone(),
                });
            }

            let index = nodes.len();
            if let Some(parent) = parent_index {
                let parent: &mut HierarchyNode = &mut nodes[parent];
                parent.children.insert(index);
            }

            nodes.push(HierarchyNode {
                name: scene_node.name.clone(),
                index,
                local_transform: scene_node.transform,
                parent_index,
                children: BTreeSet::new(),
                mesh_indices: scene_node.meshes.clone(),
                mesh_names: scene_node
                    .meshes
                    .iter()
                    .filter_map(|i| mesh_name(*i))
                    .collect(),
            });

            for child in scene_node.children.iter().rev() {
                stack.push((child, Some(index)));
            }
        }

        Ok(Self { nodes })
    }

    pub fn nodes(&self) -> &[HierarchyNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn root(&self) -> Option<&HierarchyNode> {
        self.nodes.first()
    }

    pub fn node_index(&self, name: &str) -> Option<usize> {
        self.nodes.iter().position(|n| n.name == name)
    }

    pub fn node(&self, name: &str) -> Option<&HierarchyNode> {
        self.nodes.iter().find(|n| n.name == name)
    }

    /// The index of the first node that has `mesh_name` attached.
    pub fn mesh_node_index(&self, mesh_name: &str) -> Option<usize> {
        self.nodes
            .iter()
            .position(|n| n.mesh_names.iter().any(|m| m == mesh_name))
    }

    /// The world transform for each node in the bind pose
    /// by recursively applying the parent transform.
    pub fn bind_pose_world_transforms(&self) -> Vec<Mat4> {
        let mut transforms: Vec<_> = self.nodes.iter().map(|n| n.local_transform).collect();

        // Parents always appear before their children.
        for i in 0..transforms.len() {
            if let Some(parent) = self.nodes[i].parent_index {
                transforms[i] = transforms[parent] * self.nodes[i].local_transform;
            }
        }

        transforms
    }

    /// An indented text representation of the tree
    /// with each node's local transform and attached meshes.
    pub fn dump_tree(&self) -> String {
        let mut output = String::new();

        let mut stack = vec![(0, 0)];
        while let Some((index, depth)) = stack.pop() {
            let Some(node) = self.nodes.get(index) else {
                continue;
            };

            let indent = "  ".repeat(depth);
            let _ = writeln!(output, "{indent}{}", node.name);
            for row in 0..4 {
                let row = node.local_transform.row(row);
                let _ = writeln!(
                    output,
                    "{indent}    {:>10.4} {:>10.4} {:>10.4} {:>10.4}",
                    row.x, row.y, row.z, row.w
                );
            }
            let _ = writeln!(
                output,
                "{indent}    Meshes({}): {}",
                node.mesh_names.len(),
                node.mesh_names.join(" ")
            );

            for child in node.children.iter().rev() {
                stack.push((*child, depth + 1));
            }
        }

        output
    }
}
