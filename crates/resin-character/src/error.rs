//! Error types for resin-character.
//!
//! Per-frame operations never return these; they encode failure in their
//! return values instead. These cover setup paths: building skeletons,
//! validating controllers, and loading configuration.

use thiserror::Error;

/// Errors that can occur while building a skeleton.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkeletonError {
    /// The requested parent has not been added yet.
    #[error("parent bone {parent} does not exist (skeleton has {bone_count} bones)")]
    MissingParent {
        /// Parent index that was requested.
        parent: u32,
        /// Number of bones at the time of the call.
        bone_count: usize,
    },
}

/// Errors reported by [`AnimationController::validate`](crate::AnimationController::validate).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControllerError {
    /// A transition references a state that was never registered.
    #[error("transition {transition} references unknown state '{state}'")]
    UnknownState {
        /// Index of the transition in registration order.
        transition: usize,
        /// The missing state name.
        state: String,
    },
}

/// Errors that can occur while loading a [`RigConfig`](crate::RigConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The JSON document could not be parsed.
    #[cfg(feature = "serde")]
    #[error("failed to parse rig config: {0}")]
    Parse(#[from] serde_json::Error),

    /// A value is negative, zero where it must be positive, or not finite.
    #[error("invalid value for {field}: {value}")]
    InvalidValue {
        /// Dotted path of the offending field.
        field: &'static str,
        /// The rejected value.
        value: f32,
    },
}
