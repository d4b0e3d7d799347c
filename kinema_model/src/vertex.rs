//! Interleaved vertex data for static and skinned meshes.
//!
//! Static and skinned vertices share the same leading attributes,
//! so the bone data is only appended for meshes with a rig.
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec2, Vec3};

use crate::skinning::{BoneInfluences, MAX_INFLUENCES};

/// The data type for a single vertex attribute.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum AttributeFormat {
    Float32x2,
    Float32x3,
    Float32x4,
    Uint32x4,
}

impl AttributeFormat {
    pub fn size_in_bytes(&self) -> usize {
        match self {
            AttributeFormat::Float32x2 => 8,
            AttributeFormat::Float32x3 => 12,
            AttributeFormat::Float32x4 => 16,
            AttributeFormat::Uint32x4 => 16,
        }
    }
}

/// A single attribute in an interleaved vertex.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct VertexAttribute {
    /// The attribute location in the vertex shader.
    pub location: u32,
    pub format: AttributeFormat,
    /// The offset in bytes from the start of the vertex.
    pub offset: usize,
}

/// The attributes and stride for one vertex shape.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct VertexLayout {
    pub stride: usize,
    pub attributes: &'static [VertexAttribute],
}

const fn attribute(location: u32, format: AttributeFormat, offset: usize) -> VertexAttribute {
    VertexAttribute {
        location,
        format,
        offset,
    }
}

const STATIC_ATTRIBUTES: [VertexAttribute; 5] = [
    attribute(0, AttributeFormat::Float32x3, 0),
    attribute(1, AttributeFormat::Float32x2, 12),
    attribute(2, AttributeFormat::Float32x3, 20),
    attribute(3, AttributeFormat::Float32x3, 32),
    attribute(4, AttributeFormat::Float32x3, 44),
];

const SKINNED_ATTRIBUTES: [VertexAttribute; 7] = [
    STATIC_ATTRIBUTES[0],
    STATIC_ATTRIBUTES[1],
    STATIC_ATTRIBUTES[2],
    STATIC_ATTRIBUTES[3],
    STATIC_ATTRIBUTES[4],
    attribute(5, AttributeFormat::Uint32x4, 56),
    attribute(6, AttributeFormat::Float32x4, 72),
];

/// Access to the attributes of a vertex regardless of its layout.
pub trait VertexAttributes {
    /// The interleaved attribute layout for this vertex type.
    const LAYOUT: VertexLayout;

    fn position(&self) -> Vec3;
    fn uv(&self) -> Vec2;
    fn normal(&self) -> Vec3;
    fn tangent(&self) -> Vec3;
    fn bitangent(&self) -> Vec3;

    /// The bone ids and weights or `None` if this vertex type is not skinned.
    fn bone_influences(&self) -> Option<BoneInfluences> {
        None
    }
}

/// A vertex for meshes without bones.
#[repr(C)]
#[derive(Debug, PartialEq, Clone, Copy, Pod, Zeroable)]
pub struct Vertex {
    pub position: Vec3,
    pub uv: Vec2,
    pub normal: Vec3,
    pub tangent: Vec3,
    pub bitangent: Vec3,
}

/// A vertex with up to [MAX_INFLUENCES] bone influences.
#[repr(C)]
#[derive(Debug, PartialEq, Clone, Copy, Pod, Zeroable)]
pub struct SkinnedVertex {
    pub position: Vec3,
    pub uv: Vec2,
    pub normal: Vec3,
    pub tangent: Vec3,
    pub bitangent: Vec3,
    pub bone_ids: [u32; MAX_INFLUENCES],
    pub bone_weights: [f32; MAX_INFLUENCES],
}

/// A vertex with no attributes used for meshes without any vertex data.
#[derive(Debug, PartialEq, Clone, Copy, Default)]
pub struct EmptyVertex;

impl VertexAttributes for Vertex {
    const LAYOUT: VertexLayout = VertexLayout {
        stride: 56,
        attributes: &STATIC_ATTRIBUTES,
    };

    fn position(&self) -> Vec3 {
        self.position
    }

    fn uv(&self) -> Vec2 {
        self.uv
    }

    fn normal(&self) -> Vec3 {
        self.normal
    }

    fn tangent(&self) -> Vec3 {
        self.tangent
    }

    fn bitangent(&self) -> Vec3 {
        self.bitangent
    }
}

impl VertexAttributes for SkinnedVertex {
    const LAYOUT: VertexLayout = VertexLayout {
        stride: 88,
        attributes: &SKINNED_ATTRIBUTES,
    };

    fn position(&self) -> Vec3 {
        self.position
    }

    fn uv(&self) -> Vec2 {
        self.uv
    }

    fn normal(&self) -> Vec3 {
        self.normal
    }

    fn tangent(&self) -> Vec3 {
        self.tangent
    }

    fn bitangent(&self) -> Vec3 {
        self.bitangent
    }

    fn bone_influences(&self) -> Option<BoneInfluences> {
        Some(BoneInfluences {
            bone_ids: self.bone_ids,
            weights: self.bone_weights,
        })
    }
}

impl VertexAttributes for EmptyVertex {
    const LAYOUT: VertexLayout = VertexLayout {
        stride: 0,
        attributes: &[],
    };

    fn position(&self) -> Vec3 {
        Vec3::ZERO
    }

    fn uv(&self) -> Vec2 {
        Vec2::ZERO
    }

    fn normal(&self) -> Vec3 {
        Vec3::ZERO
    }

    fn tangent(&self) -> Vec3 {
        Vec3::ZERO
    }

    fn bitangent(&self) -> Vec3 {
        Vec3::ZERO
    }
}

impl SkinnedVertex {
    pub fn new(vertex: Vertex, influences: BoneInfluences) -> Self {
        Self {
            position: vertex.position,
            uv: vertex.uv,
            normal: vertex.normal,
            tangent: vertex.tangent,
            bitangent: vertex.bitangent,
            bone_ids: influences.bone_ids,
            bone_weights: influences.weights,
        }
    }
}

impl From<Vertex> for SkinnedVertex {
    /// A vertex fully influenced by the mesh node.
    fn from(vertex: Vertex) -> Self {
        Self::new(vertex, BoneInfluences::default())
    }
}

/// The vertices for a [Mesh](crate::Mesh) in the layout used for rendering.
#[derive(Debug, PartialEq, Clone)]
pub enum Vertices {
    Static(Vec<Vertex>),
    Skinned(Vec<SkinnedVertex>),
}

impl Vertices {
    pub fn len(&self) -> usize {
        match self {
            Vertices::Static(v) => v.len(),
            Vertices::Skinned(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn layout(&self) -> VertexLayout {
        match self {
            Vertices::Static(_) => Vertex::LAYOUT,
            Vertices::Skinned(_) => SkinnedVertex::LAYOUT,
        }
    }

    /// The interleaved bytes for all vertices.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Vertices::Static(v) => bytemuck::cast_slice(v),
            Vertices::Skinned(v) => bytemuck::cast_slice(v),
        }
    }

    pub fn positions(&self) -> Vec<Vec3> {
        match self {
            Vertices::Static(v) => v.iter().map(|v| v.position).collect(),
            Vertices::Skinned(v) => v.iter().map(|v| v.position).collect(),
        }
    }
}

/// A sphere enclosing all the vertices of a mesh.
#[derive(Debug, PartialEq, Clone, Copy, Default)]
pub struct BoundingSphere {
    pub center: Vec3,
    pub radius: f32,
}

impl BoundingSphere {
    /// Center the sphere at the midpoint of the axis aligned bounding box
    /// with a radius that reaches the furthest position.
    pub fn from_positions(positions: &[Vec3]) -> Self {
        if positions.is_empty() {
            return Self::default();
        }

        let (min, max) = positions
            .iter()
            .fold((Vec3::MAX, Vec3::MIN), |(min, max), p| {
                (min.min(*p), max.max(*p))
            });
        let center = (min + max) * 0.5;

        let radius = positions
            .iter()
            .map(|p| p.distance(center))
            .fold(0.0f32, f32::max);

        Self { center, radius }
    }

    /// A sphere enclosing all of `spheres`.
    ///
    /// Uses the same midpoint approach as [BoundingSphere::from_positions]
    /// on the axis aligned bounds of each sphere.
    pub fn from_spheres(spheres: &[BoundingSphere]) -> Self {
        if spheres.is_empty() {
            return Self::default();
        }

        let (min, max) = spheres
            .iter()
            .fold((Vec3::MAX, Vec3::MIN), |(min, max), s| {
                (min.min(s.center - s.radius), max.max(s.center + s.radius))
            });
        let center = (min + max) * 0.5;

        let radius = spheres
            .iter()
            .map(|s| s.center.distance(center) + s.radius)
            .fold(0.0f32, f32::max);

        Self { center, radius }
    }

    /// Move the center by `transform` and grow the radius by its largest scale.
    pub fn transform(self, transform: Mat4) -> Self {
        let scale = transform
            .x_axis
            .truncate()
            .length()
            .max(transform.y_axis.truncate().length())
            .max(transform.z_axis.truncate().length());

        Self {
            center: transform.transform_point3(self.center),
            radius: self.radius * scale,
        }
    }
}

/// Combine the per attribute lists into interleaved vertices.
///
/// Missing attribute values default to zero.
pub(crate) fn interleave_vertices(
    positions: &[Vec3],
    uvs: &[Vec2],
    normals: &[Vec3],
    tangents: &[Vec3],
    bitangents: &[Vec3],
) -> Vec<Vertex> {
    positions
        .iter()
        .enumerate()
        .map(|(i, position)| Vertex {
            position: *position,
            uv: uvs.get(i).copied().unwrap_or_default(),
            normal: normals.get(i).copied().unwrap_or_default(),
            tangent: tangents.get(i).copied().unwrap_or_default(),
            bitangent: bitangents.get(i).copied().unwrap_or_default(),
        })
        .collect()
}
