use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use kinema_model::{AnimatedModel, BoneMatrices, MAX_BONES, Mesh, PlaybackState};

/// The per draw camera and model data at the start of the uniform buffer.
#[repr(C)]
#[derive(Debug, PartialEq, Clone, Copy, Pod, Zeroable)]
pub struct EngineUniforms {
    pub view: Mat4,
    pub projection: Mat4,
    pub model: Mat4,
    pub camera_position: Vec3,
    pub _padding: f32,
}

/// The skinning matrices following the [EngineUniforms].
///
/// A `count` of 0 skips skinning in the vertex shader.
#[repr(C)]
#[derive(Debug, PartialEq, Clone, Copy, Pod, Zeroable)]
pub struct BoneUniforms {
    pub count: u32,
    pub _padding: [u32; 3],
    pub matrices: [Mat4; MAX_BONES],
}

/// The offset in bytes of [BoneUniforms] in the uniform buffer.
pub const BONE_DATA_OFFSET: wgpu::BufferAddress = size_of::<EngineUniforms>() as u64;

impl From<&BoneMatrices> for BoneUniforms {
    fn from(bones: &BoneMatrices) -> Self {
        Self {
            count: bones.count.min(MAX_BONES) as u32,
            _padding: [0; 3],
            matrices: bones.matrices,
        }
    }
}

/// The shared uniform buffer with engine data followed by bone data.
pub struct SkinningUniforms {
    buffer: wgpu::Buffer,
}

impl SkinningUniforms {
    pub fn new(device: &wgpu::Device) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("engine uniform buffer"),
            size: BONE_DATA_OFFSET + size_of::<BoneUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        Self { buffer }
    }

    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    pub fn update_engine(&self, queue: &wgpu::Queue, engine: &EngineUniforms) {
        queue.write_buffer(&self.buffer, 0, bytemuck::bytes_of(engine));
    }

    pub fn update_bones(&self, queue: &wgpu::Queue, bones: &BoneMatrices) {
        queue.write_buffer(
            &self.buffer,
            BONE_DATA_OFFSET,
            bytemuck::bytes_of(&BoneUniforms::from(bones)),
        );
    }
}

/// Compute the skinning matrices for `mesh` into `scratch`.
///
/// Meshes without a rig and actors without playback state have no bones.
pub fn skinned_draw_bones(
    playback: Option<&mut PlaybackState>,
    model: &AnimatedModel,
    mesh: &Mesh,
    scratch: &mut BoneMatrices,
) -> usize {
    match playback {
        Some(playback) => playback.bone_matrices(Some(model), mesh.rig.as_ref(), scratch),
        None => {
            scratch.count = 0;
            0
        }
    }
}

/// Update the bone data for `mesh` before drawing it.
///
/// Meshes without bones upload a count of 0 and draw in their bind pose.
/// The `scratch` buffer can be reused for every draw
/// since its contents are uploaded before returning.
pub fn prepare_skinned_draw(
    queue: &wgpu::Queue,
    uniforms: &SkinningUniforms,
    playback: Option<&mut PlaybackState>,
    model: &AnimatedModel,
    mesh: &Mesh,
    scratch: &mut BoneMatrices,
) -> usize {
    let count = skinned_draw_bones(playback, model, mesh, scratch);
    uniforms.update_bones(queue, scratch);
    count
}

#[cfg(test)]
mod tests {
    use super::*;

    use glam::vec3;
    use kinema_model::PlaybackStatus;
    use kinema_model::scene::{SceneBone, SceneMesh, SceneNode, SceneRoot};
    use pretty_assertions::assert_eq;

    fn model() -> AnimatedModel {
        AnimatedModel::from_scene(&SceneRoot {
            root: Some(
                SceneNode::new("root", Mat4::IDENTITY)
                    .with_children(vec![SceneNode::new("bone", Mat4::IDENTITY)])
                    .with_meshes(vec![0]),
            ),
            meshes: vec![SceneMesh {
                name: "mesh".to_string(),
                positions: vec![glam::Vec3::ZERO],
                bones: vec![SceneBone {
                    name: "bone".to_string(),
                    offset: Mat4::from_translation(vec3(1.0, 0.0, 0.0)),
                    weights: Vec::new(),
                }],
                ..Default::default()
            }],
            animations: vec![kinema_model::scene::SceneAnimation {
                name: "idle".to_string(),
                duration: 1.0,
                ticks_per_second: 1.0,
                channels: Vec::new(),
            }],
        })
        .unwrap()
    }

    #[test]
    fn uniform_layout() {
        assert_eq!(208, BONE_DATA_OFFSET);
        assert_eq!(16 + 64 * 64, size_of::<BoneUniforms>());
        assert_eq!(16, std::mem::offset_of!(BoneUniforms, matrices));
        assert_eq!(192, std::mem::offset_of!(EngineUniforms, camera_position));
    }

    #[test]
    fn bone_uniforms_from_matrices() {
        let mut bones = BoneMatrices::default();
        bones.matrices[1] = Mat4::from_translation(vec3(1.0, 2.0, 3.0));
        bones.count = 2;

        let uniforms = BoneUniforms::from(&bones);
        assert_eq!(2, uniforms.count);
        assert_eq!(bones.matrices[1], uniforms.matrices[1]);
    }

    #[test]
    fn skinned_draw_bones_no_playback() {
        let model = model();
        let mut scratch = BoneMatrices {
            count: 3,
            ..Default::default()
        };
        assert_eq!(
            0,
            skinned_draw_bones(None, &model, &model.meshes[0], &mut scratch)
        );
        assert_eq!(0, scratch.count);
    }

    #[test]
    fn skinned_draw_bones_no_playback_every_frame() {
        let model = model();
        let mesh = &model.meshes[0];
        assert_eq!(2, mesh.rig.as_ref().unwrap().bone_count());

        let mut scratch = BoneMatrices::default();
        for _ in 0..3 {
            assert_eq!(0, skinned_draw_bones(None, &model, mesh, &mut scratch));
            assert_eq!(0, scratch.count);
            assert_eq!(0, BoneUniforms::from(&scratch).count);
        }
    }

    #[test]
    fn skinned_draw_bones_no_clips() {
        let model = AnimatedModel {
            clips: Vec::new(),
            ..model()
        };
        let mut playback = PlaybackState::default();
        let mut scratch = BoneMatrices::default();
        assert_eq!(
            0,
            skinned_draw_bones(
                Some(&mut playback),
                &model,
                &model.meshes[0],
                &mut scratch
            )
        );
        assert_eq!(0, scratch.count);
        assert_eq!(PlaybackStatus::Uninitialized, playback.status());
    }

    #[test]
    fn skinned_draw_bones_with_playback() {
        let model = model();
        let mut playback = PlaybackState::default();
        let mut scratch = BoneMatrices::default();
        assert_eq!(
            2,
            skinned_draw_bones(
                Some(&mut playback),
                &model,
                &model.meshes[0],
                &mut scratch
            )
        );
        assert_eq!(
            Mat4::from_translation(vec3(1.0, 0.0, 0.0)),
            scratch.matrices[1]
        );
    }
}
