//! Per actor animation playback.
//!
//! A [PlaybackState] tracks the current clip and time for a single actor.
//! The [AnimatedModel] is passed in for each call,
//! so loaded models can be shared between any number of actors.
use glam::Mat4;
use log::{debug, warn};

use crate::{evaluator::TransformEvaluator, model::AnimatedModel, skinning::RigInfo};

/// The maximum number of bones for a single draw.
pub const MAX_BONES: usize = 64;

/// Skinning matrices for a single draw.
///
/// A single buffer can be reused for each draw
/// as long as it is uploaded before the next draw overwrites it.
#[derive(Debug, PartialEq, Clone)]
pub struct BoneMatrices {
    pub matrices: [Mat4; MAX_BONES],
    /// The number of valid elements in [matrices](#structfield.matrices).
    /// A count of 0 disables skinning.
    pub count: usize,
}

impl Default for BoneMatrices {
    fn default() -> Self {
        Self {
            matrices: [Mat4::IDENTITY; MAX_BONES],
            count: 0,
        }
    }
}

impl BoneMatrices {
    /// The matrices written by the last update.
    pub fn as_slice(&self) -> &[Mat4] {
        &self.matrices[..self.count.min(MAX_BONES)]
    }
}

/// How the time advances after reaching the end of a clip.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub enum PlayMode {
    /// Wrap around to the start of the clip.
    #[default]
    Loop,
    /// Stop and pause on the last frame.
    Once,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub enum PlaybackStatus {
    /// No clip has been selected yet.
    #[default]
    Uninitialized,
    Playing,
    Paused,
}

/// The animation state for a single actor.
///
/// A state is meant to be used with a single [AnimatedModel].
/// Passing a model with a different number of nodes rebuilds the cached evaluator
/// and keeps the current clip index, time and status.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct PlaybackState {
    pub play_mode: PlayMode,
    status: PlaybackStatus,
    clip_index: usize,
    /// The current time in ticks.
    time: f32,
    duration: f32,
    ticks_per_second: f32,
    evaluator: Option<TransformEvaluator>,
}

impl PlaybackState {
    pub fn new(play_mode: PlayMode) -> Self {
        Self {
            play_mode,
            ..Default::default()
        }
    }

    /// Select the first clip in `model` if no clip is selected.
    /// Returns `false` if `model` has no clips.
    pub fn ensure_initialized(&mut self, model: &AnimatedModel) -> bool {
        if let Some(evaluator) = &self.evaluator {
            if evaluator.node_count() == model.hierarchy.len() {
                return true;
            }

            debug!(
                "Rebuilding evaluator for {} nodes instead of {}",
                model.hierarchy.len(),
                evaluator.node_count()
            );
            match model.clips.get(self.clip_index) {
                Some(clip) => {
                    self.duration = clip.duration;
                    self.ticks_per_second = clip.ticks_per_second;
                    self.evaluator = Some(TransformEvaluator::new(&model.hierarchy, clip));
                    return true;
                }
                None => {
                    self.evaluator = None;
                    self.status = PlaybackStatus::Uninitialized;
                }
            }
        }

        if model.clips.is_empty() {
            return false;
        }
        self.set_clip(model, 0)
    }

    /// Start playing the clip at `index` from the beginning.
    /// Returns `false` and keeps the current clip if `index` is out of range.
    pub fn set_clip(&mut self, model: &AnimatedModel, index: usize) -> bool {
        match model.clips.get(index) {
            Some(clip) => {
                debug!("Playing clip {index} {:?}", clip.name);
                self.clip_index = index;
                self.time = 0.0;
                self.duration = clip.duration;
                self.ticks_per_second = clip.ticks_per_second;
                self.status = PlaybackStatus::Playing;
                self.evaluator = Some(TransformEvaluator::new(&model.hierarchy, clip));
                true
            }
            None => {
                warn!(
                    "Clip index {index} out of range for length {}.",
                    model.clips.len()
                );
                false
            }
        }
    }

    /// Advance the time by `delta_seconds` if currently playing.
    pub fn advance(&mut self, delta_seconds: f32) {
        if self.status != PlaybackStatus::Playing {
            return;
        }

        self.time += delta_seconds * self.ticks_per_second;
        match self.play_mode {
            PlayMode::Loop => {
                if self.duration > 0.0 {
                    self.time = self.time.rem_euclid(self.duration);
                }
            }
            PlayMode::Once => {
                if self.time >= self.duration {
                    self.time = self.duration;
                    self.status = PlaybackStatus::Paused;
                }
            }
        }
    }

    /// Jump to `time` in ticks without changing the status.
    pub fn set_time(&mut self, time: f32) {
        self.time = time;
    }

    pub fn play(&mut self) {
        if self.status != PlaybackStatus::Uninitialized {
            self.status = PlaybackStatus::Playing;
        }
    }

    pub fn pause(&mut self) {
        if self.status != PlaybackStatus::Uninitialized {
            self.status = PlaybackStatus::Paused;
        }
    }

    pub fn status(&self) -> PlaybackStatus {
        self.status
    }

    /// The index of the current clip or `None` if no clip is selected.
    pub fn clip_index(&self) -> Option<usize> {
        self.evaluator.as_ref().map(|_| self.clip_index)
    }

    /// The current time in ticks.
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Write the skinning matrices for `rig` at the current time to `out`
    /// and return the number of matrices written.
    ///
    /// The count is 0 if there is no model, no rig or no animation.
    pub fn bone_matrices(
        &mut self,
        model: Option<&AnimatedModel>,
        rig: Option<&RigInfo>,
        out: &mut BoneMatrices,
    ) -> usize {
        out.count = 0;

        let (Some(model), Some(rig)) = (model, rig) else {
            return 0;
        };
        if !self.ensure_initialized(model) {
            return 0;
        }

        let Some(clip) = model.clips.get(self.clip_index) else {
            return 0;
        };
        let Some(evaluator) = self.evaluator.as_mut() else {
            return 0;
        };

        evaluator.compute_world_transforms(&model.hierarchy, clip, self.time);
        out.count = evaluator.rig_bone_transforms(rig, &mut out.matrices);
        out.count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use glam::vec3;
    use pretty_assertions::assert_eq;

    use crate::scene::{
        SceneAnimation, SceneBone, SceneChannel, SceneKey, SceneMesh, SceneNode, SceneRoot,
        SceneVertexWeight,
    };

    fn model(animations: Vec<SceneAnimation>) -> AnimatedModel {
        AnimatedModel::from_scene(&scene(animations)).unwrap()
    }

    fn scene(animations: Vec<SceneAnimation>) -> SceneRoot {
        SceneRoot {
            root: Some(SceneNode::new("root", Mat4::IDENTITY).with_children(vec![
                SceneNode::new("bone", Mat4::IDENTITY),
                SceneNode::new("body", Mat4::IDENTITY).with_meshes(vec![0]),
            ])),
            meshes: vec![SceneMesh {
                name: "mesh".to_string(),
                positions: vec![glam::Vec3::ZERO],
                bones: vec![SceneBone {
                    name: "bone".to_string(),
                    offset: Mat4::IDENTITY,
                    weights: vec![SceneVertexWeight {
                        vertex_index: 0,
                        weight: 1.0,
                    }],
                }],
                ..Default::default()
            }],
            animations,
        }
    }

    fn walk() -> SceneAnimation {
        SceneAnimation {
            name: "walk".to_string(),
            duration: 10.0,
            ticks_per_second: 2.0,
            channels: vec![SceneChannel {
                node_name: "bone".to_string(),
                position_keys: vec![
                    SceneKey {
                        time: 0.0,
                        value: vec3(0.0, 0.0, 0.0),
                    },
                    SceneKey {
                        time: 10.0,
                        value: vec3(10.0, 0.0, 0.0),
                    },
                ],
                ..Default::default()
            }],
        }
    }

    #[test]
    fn bone_matrices_no_model() {
        let mut state = PlaybackState::default();
        let mut out = BoneMatrices {
            count: 5,
            ..Default::default()
        };
        assert_eq!(0, state.bone_matrices(None, None, &mut out));
        assert_eq!(0, out.count);
        assert_eq!(PlaybackStatus::Uninitialized, state.status());
    }

    #[test]
    fn bone_matrices_no_rig() {
        let model = model(vec![walk()]);
        let mut state = PlaybackState::default();
        let mut out = BoneMatrices::default();
        assert_eq!(0, state.bone_matrices(Some(&model), None, &mut out));
    }

    #[test]
    fn bone_matrices_no_clips() {
        let model = model(Vec::new());
        let rig = model.meshes[0].rig.as_ref();
        let mut state = PlaybackState::default();
        let mut out = BoneMatrices::default();
        assert_eq!(0, state.bone_matrices(Some(&model), rig, &mut out));
        assert_eq!(PlaybackStatus::Uninitialized, state.status());
        assert_eq!(None, state.clip_index());
    }

    #[test]
    fn bone_matrices_first_access_selects_first_clip() {
        let model = model(vec![walk()]);
        let rig = model.meshes[0].rig.as_ref();
        let mut state = PlaybackState::default();
        let mut out = BoneMatrices::default();

        assert_eq!(2, state.bone_matrices(Some(&model), rig, &mut out));
        assert_eq!(Some(0), state.clip_index());
        assert_eq!(PlaybackStatus::Playing, state.status());
        assert_eq!(0.0, state.time());
        assert_eq!(&[Mat4::IDENTITY, Mat4::IDENTITY], out.as_slice());

        state.set_time(5.0);
        state.bone_matrices(Some(&model), rig, &mut out);
        assert_relative_eq!(
            Mat4::from_translation(vec3(5.0, 0.0, 0.0)),
            out.matrices[1],
            epsilon = 1e-6
        );
    }

    #[test]
    fn bone_matrices_different_model() {
        let small = model(vec![walk()]);
        let large = AnimatedModel::from_scene(&SceneRoot {
            root: Some(SceneNode::new("root", Mat4::IDENTITY).with_children(vec![
                SceneNode::new("extra", Mat4::from_translation(vec3(0.0, 3.0, 0.0))),
                SceneNode::new("bone", Mat4::IDENTITY),
                SceneNode::new("body", Mat4::IDENTITY).with_meshes(vec![0]),
            ])),
            ..scene(vec![walk()])
        })
        .unwrap();

        let mut state = PlaybackState::default();
        let mut out = BoneMatrices::default();
        state.bone_matrices(Some(&small), small.meshes[0].rig.as_ref(), &mut out);
        state.set_time(5.0);

        let rig = large.meshes[0].rig.as_ref();
        assert_eq!(2, state.bone_matrices(Some(&large), rig, &mut out));
        assert_relative_eq!(
            Mat4::from_translation(vec3(5.0, 0.0, 0.0)),
            out.matrices[1],
            epsilon = 1e-6
        );
        assert_eq!(Some(0), state.clip_index());
        assert_eq!(5.0, state.time());
        assert_eq!(PlaybackStatus::Playing, state.status());

        // Models without clips reset the state.
        let still = model(Vec::new());
        let rig = still.meshes[0].rig.as_ref();
        assert_eq!(0, state.bone_matrices(Some(&still), rig, &mut out));
        assert_eq!(PlaybackStatus::Uninitialized, state.status());
        assert_eq!(None, state.clip_index());
    }

    #[test]
    fn advance_loop() {
        let model = model(vec![walk()]);
        let mut state = PlaybackState::default();
        assert!(state.ensure_initialized(&model));

        state.advance(3.0);
        assert_eq!(6.0, state.time());
        state.advance(3.0);
        assert_eq!(2.0, state.time());
        assert_eq!(PlaybackStatus::Playing, state.status());
    }

    #[test]
    fn advance_once() {
        let model = model(vec![walk()]);
        let mut state = PlaybackState::new(PlayMode::Once);
        state.ensure_initialized(&model);

        state.advance(4.0);
        assert_eq!(8.0, state.time());
        state.advance(4.0);
        assert_eq!(10.0, state.time());
        assert_eq!(PlaybackStatus::Paused, state.status());
    }

    #[test]
    fn advance_paused() {
        let model = model(vec![walk()]);
        let mut state = PlaybackState::default();
        state.ensure_initialized(&model);

        state.pause();
        state.advance(1.0);
        assert_eq!(0.0, state.time());

        state.play();
        state.advance(1.0);
        assert_eq!(2.0, state.time());
    }

    #[test]
    fn advance_uninitialized() {
        let mut state = PlaybackState::default();
        state.play();
        state.advance(1.0);
        assert_eq!(PlaybackStatus::Uninitialized, state.status());
        assert_eq!(0.0, state.time());
    }

    #[test]
    fn set_clip_resets_time() {
        let idle = SceneAnimation {
            name: "idle".to_string(),
            duration: 0.0,
            ticks_per_second: 0.0,
            channels: Vec::new(),
        };
        let model = model(vec![walk(), idle]);
        let mut state = PlaybackState::default();
        state.ensure_initialized(&model);
        state.advance(1.0);

        assert!(state.set_clip(&model, 1));
        assert_eq!(Some(1), state.clip_index());
        assert_eq!(0.0, state.time());

        // Clips without a duration never wrap.
        state.advance(3.0);
        assert_eq!(3.0, state.time());

        assert!(!state.set_clip(&model, 2));
        assert_eq!(Some(1), state.clip_index());
    }
}
