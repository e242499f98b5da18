//! Skeletal animation and IK for voxel characters.
//!
//! Provides a fixed humanoid rig, keyframe clips with looping and crossfades,
//! a parameter-driven animation state machine, and analytic two-bone IK for
//! feet, hands, and head aiming.
//!
//! # Example
//!
//! ```
//! use rhizome_resin_character::{
//!     AnimationClip, AnimationController, AnimationState, AnimationTransition, AnimationType,
//!     CharacterGenerationParams, VoxelCharacter,
//! };
//!
//! let mut character = VoxelCharacter::new();
//! character.generate_from_params(&CharacterGenerationParams::default());
//!
//! let mut controller = AnimationController::new();
//! controller.add_state(AnimationState::new("Idle", AnimationClip::preset(AnimationType::Idle)));
//! controller.add_state(AnimationState::new("Walk", AnimationClip::preset(AnimationType::Walk)));
//! controller.add_transition(AnimationTransition::when_greater("Idle", "Walk", "speed", 0.1));
//!
//! controller.set_parameter("speed", 1.0);
//! controller.update(&mut character, 1.0 / 60.0);
//! assert_eq!(controller.current_state(), Some("Walk"));
//!
//! let voxels = character.transformed_voxels();
//! assert_eq!(voxels.len(), character.voxels().len());
//! ```

mod animation;
mod character;
mod config;
mod controller;
mod error;
mod ik;
mod skeleton;
mod transform;

pub use animation::{AnimationClip, AnimationType, BoneSample, Keyframe};
pub use character::{
    BodyPartTemplate, BodyPartType, CharacterGenerationParams, CharacterVoxel, VoxelCharacter,
};
pub use config::RigConfig;
pub use controller::{
    AnimationController, AnimationState, AnimationTransition, Comparison, DEFAULT_BLEND_DURATION,
};
pub use error::{ConfigError, ControllerError, SkeletonError};
pub use ik::{
    FootIk, HandIk, IkSolution, LookAtLimits, MIN_REACH, look_at_rotation,
    look_at_rotation_constrained, solve_two_bone, solve_two_bone_constrained,
};
pub use skeleton::{Bone, BoneId, HumanoidBone, Skeleton};
pub use transform::EulerTransform;
