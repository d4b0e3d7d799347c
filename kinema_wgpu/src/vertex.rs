use kinema_model::{AnimatedModel, Mesh, vertex::Vertices};
use log::debug;
use wgpu::util::DeviceExt;

const STATIC_ATTRIBUTES: [wgpu::VertexAttribute; 5] = wgpu::vertex_attr_array![
    0 => Float32x3,
    1 => Float32x2,
    2 => Float32x3,
    3 => Float32x3,
    4 => Float32x3,
];

const SKINNED_ATTRIBUTES: [wgpu::VertexAttribute; 7] = wgpu::vertex_attr_array![
    0 => Float32x3,
    1 => Float32x2,
    2 => Float32x3,
    3 => Float32x3,
    4 => Float32x3,
    5 => Uint32x4,
    6 => Float32x4,
];

/// The layout for [Vertex](kinema_model::vertex::Vertex).
pub const STATIC_VERTEX_LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
    array_stride: 56,
    step_mode: wgpu::VertexStepMode::Vertex,
    attributes: &STATIC_ATTRIBUTES,
};

/// The layout for [SkinnedVertex](kinema_model::vertex::SkinnedVertex).
pub const SKINNED_VERTEX_LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
    array_stride: 88,
    step_mode: wgpu::VertexStepMode::Vertex,
    attributes: &SKINNED_ATTRIBUTES,
};

/// The vertex and index buffers for a single [Mesh].
pub struct MeshBuffers {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
    pub skinned: bool,
}

impl MeshBuffers {
    pub fn from_mesh(device: &wgpu::Device, mesh: &Mesh) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} vertex buffer", mesh.name)),
            contents: mesh.vertices.as_bytes(),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} index buffer", mesh.name)),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        Self {
            vertex_buffer,
            index_buffer,
            index_count: mesh.indices.len() as u32,
            skinned: matches!(mesh.vertices, Vertices::Skinned(_)),
        }
    }

    /// The vertex layout for the pipeline that draws this mesh.
    pub fn layout(&self) -> wgpu::VertexBufferLayout<'static> {
        vertex_buffer_layout(self.skinned)
    }
}

pub fn vertex_buffer_layout(skinned: bool) -> wgpu::VertexBufferLayout<'static> {
    if skinned {
        SKINNED_VERTEX_LAYOUT
    } else {
        STATIC_VERTEX_LAYOUT
    }
}

/// Create buffers for all meshes in `model`.
#[tracing::instrument(skip_all)]
pub fn create_mesh_buffers(device: &wgpu::Device, model: &AnimatedModel) -> Vec<MeshBuffers> {
    let buffers: Vec<_> = model
        .meshes
        .iter()
        .map(|mesh| MeshBuffers::from_mesh(device, mesh))
        .collect();

    let skinned_count = buffers.iter().filter(|b| b.skinned).count();
    debug!(
        "Created buffers for {} meshes, {skinned_count} skinned",
        buffers.len()
    );

    buffers
}
