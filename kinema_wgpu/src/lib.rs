//! # kinema_wgpu
//! GPU buffers for rendering [kinema_model] meshes with [wgpu].
//!
//! Skinning matrices are written into a shared uniform buffer
//! after the camera and model matrices.
//! Call [prepare_skinned_draw] before each draw to upload the bones for that mesh.
mod bones;
mod vertex;

pub use bones::{
    BONE_DATA_OFFSET, BoneUniforms, EngineUniforms, SkinningUniforms, prepare_skinned_draw,
    skinned_draw_bones,
};
pub use vertex::{
    MeshBuffers, SKINNED_VERTEX_LAYOUT, STATIC_VERTEX_LAYOUT, create_mesh_buffers,
    vertex_buffer_layout,
};
