use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CreateHierarchyError {
    #[error("scene has no root node")]
    MissingRoot,

    #[error("node name {name:?} is used by more than one node")]
    DuplicateNodeName { name: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CreateRigError {
    #[error("bone {bone:?} used by mesh {mesh:?} does not match any node in the hierarchy")]
    UnresolvedBone { mesh: String, bone: String },

    #[error("mesh {mesh:?} is attached to node {node:?} which is not in the hierarchy")]
    MissingMeshNode { mesh: String, node: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LoadModelError {
    #[error("error creating node hierarchy")]
    Hierarchy(#[from] CreateHierarchyError),

    #[error("error creating mesh rig")]
    Rig(#[from] CreateRigError),

    #[error("node {node:?} references mesh {index} but the scene has {count} meshes")]
    MeshIndex {
        node: String,
        index: usize,
        count: usize,
    },
}
