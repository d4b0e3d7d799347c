use glam::Mat4;
use log::warn;

use crate::{animation::AnimationClip, hierarchy::Hierarchy, skinning::RigInfo};

/// Calculates animated node transforms for a single [AnimationClip].
///
/// The evaluator does not hold references to the hierarchy or clip,
/// so the same data can be shared by any number of evaluators.
/// The same hierarchy and clip passed to [TransformEvaluator::new]
/// should be passed to [TransformEvaluator::compute_world_transforms].
#[derive(Debug, PartialEq, Clone)]
pub struct TransformEvaluator {
    /// The channel index in the clip for each node.
    channel_indices: Vec<Option<usize>>,
    world_transforms: Vec<Mat4>,
}

impl TransformEvaluator {
    pub fn new(hierarchy: &Hierarchy, clip: &AnimationClip) -> Self {
        let channel_indices = hierarchy
            .nodes()
            .iter()
            .map(|n| clip.channel_index(&n.name))
            .collect();

        Self {
            channel_indices,
            world_transforms: hierarchy.bind_pose_world_transforms(),
        }
    }

    /// The number of nodes in the hierarchy used to create this evaluator.
    pub fn node_count(&self) -> usize {
        self.channel_indices.len()
    }

    /// The number of nodes with an animation channel.
    pub fn animated_node_count(&self) -> usize {
        self.channel_indices.iter().flatten().count()
    }

    /// The local transform of the node at `index` at `time` in ticks.
    /// Nodes without a channel use their bind pose transform.
    pub fn local_transform(
        &self,
        hierarchy: &Hierarchy,
        clip: &AnimationClip,
        index: usize,
        time: f32,
    ) -> Mat4 {
        let channel = self
            .channel_indices
            .get(index)
            .copied()
            .flatten()
            .and_then(|i| clip.channels.get(i));

        match channel {
            Some(channel) => channel.local_transform(time),
            None => hierarchy
                .nodes()
                .get(index)
                .map(|n| n.local_transform)
                .unwrap_or(Mat4::IDENTITY),
        }
    }

    /// Update the world transform of every node for `time` in ticks
    /// by accumulating local transforms starting from the root.
    pub fn compute_world_transforms(
        &mut self,
        hierarchy: &Hierarchy,
        clip: &AnimationClip,
        time: f32,
    ) -> &[Mat4] {
        let mut world_transforms = std::mem::take(&mut self.world_transforms);
        world_transforms.clear();
        world_transforms.resize(hierarchy.len(), Mat4::IDENTITY);

        if !hierarchy.is_empty() {
            let mut stack = vec![(0, Mat4::IDENTITY)];
            while let Some((index, parent_transform)) = stack.pop() {
                let transform =
                    parent_transform * self.local_transform(hierarchy, clip, index, time);
                world_transforms[index] = transform;

                for child in &hierarchy.nodes()[index].children {
                    stack.push((*child, transform));
                }
            }
        }

        self.world_transforms = world_transforms;
        &self.world_transforms
    }

    /// The world transforms from the last call to [TransformEvaluator::compute_world_transforms]
    /// or the bind pose if no transforms have been computed yet.
    pub fn world_transforms(&self) -> &[Mat4] {
        &self.world_transforms
    }

    /// Write the skinning matrix for each bone in `rig` to `out`
    /// and return the number of matrices written.
    ///
    /// Skinning matrices transform vertices in the space of the mesh node
    /// from the bind pose to the current world transforms.
    pub fn rig_bone_transforms(&self, rig: &RigInfo, out: &mut [Mat4]) -> usize {
        let world = |i: usize| {
            self.world_transforms
                .get(i)
                .copied()
                .unwrap_or(Mat4::IDENTITY)
        };

        if rig.bone_count() > out.len() {
            warn!(
                "Rig for mesh {:?} has {} bones but only {} fit in the output.",
                rig.mesh_name,
                rig.bone_count(),
                out.len()
            );
        }

        let inv_mesh_transform = world(rig.mesh_node_index()).inverse();

        let mut count = 0;
        for ((bone, node_index), output) in rig
            .bones
            .iter()
            .zip(rig.bone_node_indices())
            .zip(out.iter_mut())
        {
            *output = inv_mesh_transform * world(*node_index) * bone.offset;
            count += 1;
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use glam::{Quat, Vec3, vec3};
    use pretty_assertions::assert_eq;

    use crate::{
        scene::{SceneAnimation, SceneChannel, SceneKey, SceneNode},
        skinning::RigBoneInfo,
    };

    fn chain_hierarchy() -> Hierarchy {
        let translation = Mat4::from_translation(vec3(1.0, 0.0, 0.0));
        let root = SceneNode::new("root", translation).with_children(vec![
            SceneNode::new("a", translation)
                .with_children(vec![SceneNode::new("b", translation)]),
        ]);
        Hierarchy::from_scene(&root, |_| None).unwrap()
    }

    fn clip(channels: Vec<SceneChannel>) -> AnimationClip {
        AnimationClip::from_scene_animation(&SceneAnimation {
            name: "clip".to_string(),
            duration: 10.0,
            ticks_per_second: 1.0,
            channels,
        })
    }

    fn translation_channel(node_name: &str, keys: &[(f32, Vec3)]) -> SceneChannel {
        SceneChannel {
            node_name: node_name.to_string(),
            position_keys: keys
                .iter()
                .map(|(time, value)| SceneKey {
                    time: *time,
                    value: *value,
                })
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn world_transforms_bind_pose_chain() {
        let hierarchy = chain_hierarchy();
        let clip = clip(Vec::new());
        let mut evaluator = TransformEvaluator::new(&hierarchy, &clip);

        let transforms = evaluator.compute_world_transforms(&hierarchy, &clip, 0.0);
        assert_eq!(vec3(3.0, 0.0, 0.0), transforms[2].transform_point3(Vec3::ZERO));
        assert_eq!(0, evaluator.animated_node_count());
        assert_eq!(3, evaluator.node_count());
    }

    #[test]
    fn world_transforms_identity_channels_chain() {
        let hierarchy = chain_hierarchy();
        let unit_x = vec3(1.0, 0.0, 0.0);
        let clip = clip(vec![
            translation_channel("root", &[(0.0, unit_x)]),
            translation_channel("a", &[(0.0, unit_x)]),
            translation_channel("b", &[(0.0, unit_x)]),
        ]);
        let mut evaluator = TransformEvaluator::new(&hierarchy, &clip);
        assert_eq!(3, evaluator.animated_node_count());

        let transforms = evaluator.compute_world_transforms(&hierarchy, &clip, 5.0);
        assert_eq!(vec3(3.0, 0.0, 0.0), transforms[2].transform_point3(Vec3::ZERO));
    }

    #[test]
    fn world_transforms_channel_overrides_bind_pose() {
        let hierarchy = chain_hierarchy();
        let clip = clip(vec![translation_channel(
            "a",
            &[(0.0, Vec3::ZERO), (10.0, vec3(0.0, 4.0, 0.0))],
        )]);
        let mut evaluator = TransformEvaluator::new(&hierarchy, &clip);

        let transforms = evaluator.compute_world_transforms(&hierarchy, &clip, 5.0);
        assert_eq!(
            vec![
                Mat4::from_translation(vec3(1.0, 0.0, 0.0)),
                Mat4::from_translation(vec3(1.0, 2.0, 0.0)),
                Mat4::from_translation(vec3(2.0, 2.0, 0.0)),
            ],
            transforms
        );

        // Times past the last keyframe use the last value.
        let transforms = evaluator.compute_world_transforms(&hierarchy, &clip, 20.0);
        assert_eq!(vec3(2.0, 4.0, 0.0), transforms[2].transform_point3(Vec3::ZERO));
    }

    #[test]
    fn rig_bone_transforms_relative_to_mesh_node() {
        let hierarchy = chain_hierarchy();
        let clip = clip(vec![SceneChannel {
            node_name: "b".to_string(),
            position_keys: vec![SceneKey {
                time: 0.0,
                value: vec3(1.0, 0.0, 0.0),
            }],
            rotation_keys: vec![SceneKey {
                time: 0.0,
                value: Quat::from_rotation_z(90f32.to_radians()),
            }],
            ..Default::default()
        }]);
        let mut evaluator = TransformEvaluator::new(&hierarchy, &clip);
        evaluator.compute_world_transforms(&hierarchy, &clip, 0.0);

        let offset = Mat4::from_translation(vec3(-1.0, 0.0, 0.0));
        let rig = RigInfo::new(
            "mesh",
            "a",
            vec![RigBoneInfo {
                name: "b".to_string(),
                offset,
            }],
            &hierarchy,
        )
        .unwrap();

        let mut out = [Mat4::ZERO; 4];
        assert_eq!(2, evaluator.rig_bone_transforms(&rig, &mut out));

        // The fallback bone for the mesh node does not deform vertices.
        assert_eq!(Mat4::IDENTITY, out[0]);

        let world = evaluator.world_transforms();
        assert_relative_eq!(world[1].inverse() * world[2] * offset, out[1], epsilon = 1e-6);

        // Vertices near the bone follow the bone's rotation.
        assert_relative_eq!(
            vec3(1.0, 0.0, 0.0),
            out[1].transform_point3(vec3(1.0, 0.0, 0.0)),
            epsilon = 1e-6
        );
        assert_relative_eq!(
            vec3(1.0, 1.0, 0.0),
            out[1].transform_point3(vec3(2.0, 0.0, 0.0)),
            epsilon = 1e-6
        );
        assert_eq!(Mat4::ZERO, out[2]);
    }

    #[test]
    fn rig_bone_transforms_truncated() {
        let hierarchy = chain_hierarchy();
        let clip = clip(Vec::new());
        let evaluator = TransformEvaluator::new(&hierarchy, &clip);

        let bone = |name: &str| RigBoneInfo {
            name: name.to_string(),
            offset: Mat4::IDENTITY,
        };
        let rig = RigInfo::new("mesh", "root", vec![bone("a"), bone("b")], &hierarchy).unwrap();

        let mut out = [Mat4::ZERO; 2];
        assert_eq!(2, evaluator.rig_bone_transforms(&rig, &mut out));
        assert_eq!(Mat4::from_translation(vec3(1.0, 0.0, 0.0)), out[1]);
    }
}
