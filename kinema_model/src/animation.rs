//! Keyframe animation clips for nodes in a [Hierarchy](crate::hierarchy::Hierarchy).
use glam::{Mat4, Quat, Vec3};
use log::warn;

use crate::{
    Transform,
    scene::{SceneAnimation, SceneChannel, SceneKey},
};

/// A named animation with a channel for each animated node.
#[derive(Debug, PartialEq, Clone)]
pub struct AnimationClip {
    pub name: String,
    /// The length of the animation in ticks.
    pub duration: f32,
    /// The conversion from playback time in seconds to ticks.
    pub ticks_per_second: f32,
    pub channels: Vec<AnimationChannel>,
}

/// The keyframes for a single node identified by name.
///
/// Each property has its own keyframe times,
/// so the tracks do not need to have the same length.
#[derive(Debug, PartialEq, Clone)]
pub struct AnimationChannel {
    pub node_name: String,
    pub positions: KeyframeTrack<Vec3>,
    pub rotations: KeyframeTrack<Quat>,
    pub scales: KeyframeTrack<Vec3>,
}

/// Keyframes sorted by time.
#[derive(Debug, PartialEq, Clone)]
pub struct KeyframeTrack<T> {
    keyframes: Vec<Keyframe<T>>,
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub struct Keyframe<T> {
    pub time: f32,
    pub value: T,
}

/// Values that can be linearly blended between keyframes.
pub trait Interpolate: Copy {
    fn interpolate(self, other: Self, factor: f32) -> Self;
}

impl Interpolate for Vec3 {
    fn interpolate(self, other: Self, factor: f32) -> Self {
        self.lerp(other, factor)
    }
}

impl Interpolate for Quat {
    fn interpolate(self, other: Self, factor: f32) -> Self {
        // Normalized linear blending is close enough to slerp for typical key spacing.
        self.lerp(other, factor)
    }
}

impl AnimationClip {
    pub fn from_scene_animation(animation: &SceneAnimation) -> Self {
        let channels: Vec<_> = animation
            .channels
            .iter()
            .map(AnimationChannel::from_scene_channel)
            .collect();

        let duration = if animation.duration > 0.0 {
            animation.duration
        } else {
            channels
                .iter()
                .map(AnimationChannel::end_time)
                .fold(0.0f32, f32::max)
        };

        let ticks_per_second = if animation.ticks_per_second > 0.0 {
            animation.ticks_per_second
        } else {
            1.0
        };

        Self {
            name: animation.name.clone(),
            duration,
            ticks_per_second,
            channels,
        }
    }

    /// The channel for `node_name` or `None` if the node is not animated.
    pub fn channel(&self, node_name: &str) -> Option<&AnimationChannel> {
        self.channels.iter().find(|c| c.node_name == node_name)
    }

    pub fn channel_index(&self, node_name: &str) -> Option<usize> {
        self.channels.iter().position(|c| c.node_name == node_name)
    }
}

impl AnimationChannel {
    pub fn from_scene_channel(channel: &SceneChannel) -> Self {
        Self {
            node_name: channel.node_name.clone(),
            positions: KeyframeTrack::from_scene_keys(&channel.node_name, &channel.position_keys),
            rotations: KeyframeTrack::from_scene_keys(&channel.node_name, &channel.rotation_keys),
            scales: KeyframeTrack::from_scene_keys(&channel.node_name, &channel.scale_keys),
        }
    }

    /// Sample each property independently at `time`.
    ///
    /// Properties without keyframes use the values from [Transform::IDENTITY].
    pub fn sample_transform(&self, time: f32) -> Transform {
        Transform {
            translation: self
                .positions
                .sample(time)
                .unwrap_or(Transform::IDENTITY.translation),
            rotation: self
                .rotations
                .sample(time)
                .unwrap_or(Transform::IDENTITY.rotation),
            scale: self.scales.sample(time).unwrap_or(Transform::IDENTITY.scale),
        }
    }

    /// The local transform matrix relative to the parent node at `time`.
    pub fn local_transform(&self, time: f32) -> Mat4 {
        self.sample_transform(time).to_matrix()
    }

    /// The time of the last keyframe in any track.
    pub fn end_time(&self) -> f32 {
        [
            self.positions.end_time(),
            self.rotations.end_time(),
            self.scales.end_time(),
        ]
        .into_iter()
        .flatten()
        .fold(0.0f32, f32::max)
    }
}

impl<T: Interpolate> KeyframeTrack<T> {
    /// Create a track from `keyframes`, sorting by time if necessary.
    pub fn new(mut keyframes: Vec<Keyframe<T>>) -> Self {
        // The sort is stable to preserve the order of keys with equal times.
        if !keyframes.is_sorted_by(|a, b| a.time <= b.time) {
            keyframes.sort_by(|a, b| a.time.total_cmp(&b.time));
        }
        Self { keyframes }
    }

    fn from_scene_keys(node_name: &str, keys: &[SceneKey<T>]) -> Self {
        if !keys.is_sorted_by(|a, b| a.time <= b.time) {
            warn!("Keyframes for node {node_name:?} are not sorted by time.");
        }

        Self::new(
            keys.iter()
                .map(|k| Keyframe {
                    time: k.time,
                    value: k.value,
                })
                .collect(),
        )
    }

    pub fn keyframes(&self) -> &[Keyframe<T>] {
        &self.keyframes
    }

    pub fn is_empty(&self) -> bool {
        self.keyframes.is_empty()
    }

    pub fn end_time(&self) -> Option<f32> {
        self.keyframes.last().map(|k| k.time)
    }

    /// Interpolate the value at `time` or `None` if the track has no keyframes.
    ///
    /// Times outside the keyframe range use the first or last value.
    pub fn sample(&self, time: f32) -> Option<T> {
        let (left, right, factor) = keyframe_position(&self.keyframes, time)?;
        let left = self.keyframes[left].value;
        if factor > 0.0 {
            Some(left.interpolate(self.keyframes[right].value, factor))
        } else {
            Some(left)
        }
    }
}

/// Find the keyframes surrounding `time` and the position between them.
///
/// Returns the left index, right index, and interpolation factor in the range `0.0..1.0`.
fn keyframe_position<T>(keyframes: &[Keyframe<T>], time: f32) -> Option<(usize, usize, f32)> {
    let first = keyframes.first()?;
    if time < first.time {
        return Some((0, 0, 0.0));
    }

    // Assume keyframes are in ascending order.
    for right in 1..keyframes.len() {
        let right_time = keyframes[right].time;
        if right_time > time {
            let left = right - 1;
            let left_time = keyframes[left].time;
            let factor = (time - left_time) / (right_time - left_time);
            return Some((left, right, factor));
        }
    }

    // The final keyframe persists for the rest of the animation.
    let last = keyframes.len() - 1;
    Some((last, last, 0.0))
}
