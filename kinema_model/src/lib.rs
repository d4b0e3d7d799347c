//! # kinema_model
//! kinema_model converts imported scenes into node hierarchies, keyframe animations
//! and interleaved vertex data for rendering skinned meshes.
//!
//! Load an [AnimatedModel] once with [AnimatedModel::from_scene]
//! and create a [PlaybackState] for each actor that uses the model.
//!
//! # Getting Started
//! ```rust no_run
//! use kinema_model::{AnimatedModel, BoneMatrices, PlaybackState, scene::SceneRoot};
//!
//! # fn load_scene() -> SceneRoot { SceneRoot::default() }
//! let model = AnimatedModel::from_scene(&load_scene())?;
//!
//! let mut playback = PlaybackState::default();
//! let mut bones = BoneMatrices::default();
//! playback.advance(1.0 / 60.0);
//!
//! for mesh in &model.meshes {
//!     let count = playback.bone_matrices(Some(&model), mesh.rig.as_ref(), &mut bones);
//!     println!("{}: {count} bones", mesh.name);
//! }
//! # Ok::<(), kinema_model::error::LoadModelError>(())
//! ```
//!
//! # Coordinate Spaces
//! Skinned vertices are in the space of the node the mesh is attached to.
//! Static vertices are transformed to world space in the bind pose while loading.

pub mod animation;
pub mod error;
pub mod evaluator;
pub mod hierarchy;
mod model;
pub mod playback;
pub mod scene;
pub mod skinning;
mod transform;
pub mod vertex;

pub use animation::AnimationClip;
pub use evaluator::TransformEvaluator;
pub use hierarchy::{Hierarchy, HierarchyNode};
pub use model::{AnimatedModel, Mesh};
pub use playback::{BoneMatrices, MAX_BONES, PlayMode, PlaybackState, PlaybackStatus};
pub use skinning::RigInfo;
pub use transform::Transform;
