//! Analytic inverse kinematics for two-bone limbs and head aiming.
//!
//! The solvers produce Euler angles in the rig's X-bend convention. A single
//! law-of-cosines angle drives both joints: the first joint pitches by it
//! and the second folds back by `angle - PI`. Nothing here touches a
//! skeleton; callers write the angles to whichever bones they drive.

use glam::Vec3;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::f32::consts::{FRAC_PI_2, FRAC_PI_4, PI};

/// Targets closer to the origin than this are rejected.
pub const MIN_REACH: f32 = 0.001;

/// Result of an IK solve.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct IkSolution {
    /// Euler rotation for the first joint (hip or shoulder).
    pub joint1_rotation: Vec3,
    /// Euler rotation for the second joint (knee or elbow).
    pub joint2_rotation: Vec3,
    /// Euler rotation for the end effector, when the solver computes one.
    pub end_effector_rotation: Option<Vec3>,
    /// Whether the target was reachable.
    pub success: bool,
}

impl IkSolution {
    /// An unsuccessful solve with zero rotations.
    pub fn failed() -> Self {
        Self::default()
    }
}

/// Interior angle opposite `c` in a triangle with sides `a`, `b`, `c`.
fn law_of_cosines(a: f32, b: f32, c: f32) -> f32 {
    let cos = (a * a + b * b - c * c) / (2.0 * a * b);
    cos.clamp(-1.0, 1.0).acos()
}

/// Clamps to `[-max, max]`. A NaN limit leaves the angle unchanged.
fn clamp_symmetric(angle: f32, max: f32) -> f32 {
    let max = max.abs();
    angle.max(-max).min(max)
}

/// Solves a two-bone chain rooted at `origin` so its tip reaches `target`.
///
/// Fails when the target lies beyond `upper_length + lower_length`, closer
/// than [`MIN_REACH`], or when the upper bone has no length.
pub fn solve_two_bone(
    origin: Vec3,
    upper_length: f32,
    lower_length: f32,
    target: Vec3,
    pole: Vec3,
) -> IkSolution {
    if upper_length <= 0.0 || lower_length < 0.0 {
        return IkSolution::failed();
    }

    let to_target = target - origin;
    let distance = to_target.length();
    if distance > upper_length + lower_length || distance < MIN_REACH {
        return IkSolution::failed();
    }

    // TODO: fold the second joint by the angle opposite `distance`,
    // law_of_cosines(upper_length, lower_length, distance). Joint 2 is
    // currently always joint 1 - PI.
    let root = law_of_cosines(upper_length, distance, lower_length);

    // TODO: rotate the chain plane onto this axis so the pole steers the bend
    // direction; today every solve bends about local X.
    let _bend_axis = to_target
        .normalize_or_zero()
        .cross(pole.normalize_or_zero())
        .normalize_or_zero();

    IkSolution {
        joint1_rotation: Vec3::new(root, 0.0, 0.0),
        joint2_rotation: Vec3::new(root - PI, 0.0, 0.0),
        end_effector_rotation: None,
        success: true,
    }
}

/// Like [`solve_two_bone`], then clamps each joint's X angle to `±max`.
pub fn solve_two_bone_constrained(
    origin: Vec3,
    upper_length: f32,
    lower_length: f32,
    target: Vec3,
    pole: Vec3,
    max_upper_angle: f32,
    max_lower_angle: f32,
) -> IkSolution {
    let mut solution = solve_two_bone(origin, upper_length, lower_length, target, pole);
    if solution.success {
        solution.joint1_rotation.x = clamp_symmetric(solution.joint1_rotation.x, max_upper_angle);
        solution.joint2_rotation.x = clamp_symmetric(solution.joint2_rotation.x, max_lower_angle);
    }
    solution
}

/// Leg IK that plants a foot on uneven ground.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FootIk {
    upper_length: f32,
    lower_length: f32,
    max_stretch: f32,
    enabled: bool,
}

impl Default for FootIk {
    fn default() -> Self {
        Self {
            upper_length: 2.0,
            lower_length: 2.0,
            max_stretch: 1.2,
            enabled: true,
        }
    }
}

impl FootIk {
    /// Creates a solver with default leg proportions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets hip-to-knee and knee-to-foot lengths.
    pub fn set_leg_lengths(&mut self, hip_to_knee: f32, knee_to_foot: f32) {
        self.upper_length = hip_to_knee;
        self.lower_length = knee_to_foot;
    }

    /// Sets the reach multiplier used to clamp far targets.
    ///
    /// A stretch of zero or less pins every target to the hip.
    pub fn set_max_stretch(&mut self, stretch: f32) {
        self.max_stretch = stretch;
    }

    /// Enables or disables the solver.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Hip-to-knee length.
    pub fn upper_length(&self) -> f32 {
        self.upper_length
    }

    /// Knee-to-foot length.
    pub fn lower_length(&self) -> f32 {
        self.lower_length
    }

    /// Reach multiplier.
    pub fn max_stretch(&self) -> f32 {
        self.max_stretch
    }

    /// Whether the solver runs.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Pulls `target` toward `hip` so it lies within the stretched leg reach.
    ///
    /// The reach never goes below zero, so the result stays on the hip side
    /// of the target.
    pub fn clamp_target(&self, hip: Vec3, target: Vec3) -> Vec3 {
        let max_reach = ((self.upper_length + self.lower_length) * self.max_stretch).max(0.0);
        let offset = target - hip;
        if offset.length() > max_reach {
            hip + offset.normalize_or_zero() * max_reach
        } else {
            target
        }
    }

    /// Solves the leg with the knee bending forward (+Z) and tilts the foot
    /// to match `surface_normal`.
    ///
    /// A target clamped into the stretch margin beyond the leg's length is
    /// still unreachable and fails.
    pub fn solve_foot(&self, hip: Vec3, target: Vec3, surface_normal: Vec3) -> IkSolution {
        if !self.enabled {
            return IkSolution::failed();
        }

        let target = self.clamp_target(hip, target);
        let mut solution =
            solve_two_bone(hip, self.upper_length, self.lower_length, target, Vec3::Z);
        if solution.success {
            solution.end_effector_rotation = Some(foot_alignment(surface_normal));
        }
        solution
    }
}

/// Pitch and roll that lay a foot flat on a surface with the given normal.
fn foot_alignment(surface_normal: Vec3) -> Vec3 {
    let normal = surface_normal.normalize_or(Vec3::Y);
    let right = Vec3::Y.cross(normal).normalize_or(Vec3::X);
    let forward = normal.cross(right).normalize_or(Vec3::NEG_Z);

    let pitch = (-forward.y).clamp(-1.0, 1.0).asin();
    let roll = right.y.atan2(normal.y);
    Vec3::new(pitch, 0.0, roll)
}

/// Arm IK for reaching and grabbing.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct HandIk {
    upper_length: f32,
    lower_length: f32,
    enabled: bool,
}

impl Default for HandIk {
    fn default() -> Self {
        Self {
            upper_length: 1.5,
            lower_length: 1.5,
            enabled: true,
        }
    }
}

impl HandIk {
    /// Creates a solver with default arm proportions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets shoulder-to-elbow and elbow-to-hand lengths.
    pub fn set_arm_lengths(&mut self, shoulder_to_elbow: f32, elbow_to_hand: f32) {
        self.upper_length = shoulder_to_elbow;
        self.lower_length = elbow_to_hand;
    }

    /// Enables or disables the solver.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Shoulder-to-elbow length.
    pub fn upper_length(&self) -> f32 {
        self.upper_length
    }

    /// Elbow-to-hand length.
    pub fn lower_length(&self) -> f32 {
        self.lower_length
    }

    /// Whether the solver runs.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Solves the arm with the elbow bending downward (-Y).
    ///
    /// TODO: orient the hand from `_grip` once the rig has a wrist bone to
    /// receive it.
    pub fn solve_hand(&self, shoulder: Vec3, target: Vec3, _grip: Vec3) -> IkSolution {
        if !self.enabled {
            return IkSolution::failed();
        }
        solve_two_bone(
            shoulder,
            self.upper_length,
            self.lower_length,
            target,
            Vec3::NEG_Y,
        )
    }
}

/// Yaw and pitch limits for head aiming, in radians.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LookAtLimits {
    /// Maximum turn left or right.
    pub max_yaw: f32,
    /// Maximum tilt up or down.
    pub max_pitch: f32,
}

impl Default for LookAtLimits {
    fn default() -> Self {
        Self {
            max_yaw: FRAC_PI_2,
            max_pitch: FRAC_PI_4,
        }
    }
}

impl LookAtLimits {
    /// Clamps a `(pitch, yaw, roll)` rotation to these limits.
    pub fn apply(&self, rotation: Vec3) -> Vec3 {
        Vec3::new(
            clamp_symmetric(rotation.x, self.max_pitch),
            clamp_symmetric(rotation.y, self.max_yaw),
            rotation.z,
        )
    }
}

/// Rotation `(pitch, yaw, 0)` that aims a head at `target`.
///
/// Yaw is measured from +Z toward +X; looking up gives negative pitch.
/// The up vector does not affect the result yet. A target at the head
/// position gives zero rotation.
pub fn look_at_rotation(head: Vec3, target: Vec3, _up: Vec3) -> Vec3 {
    let direction = (target - head).normalize_or_zero();
    let yaw = direction.x.atan2(direction.z);
    let pitch = (-direction.y).clamp(-1.0, 1.0).asin();
    Vec3::new(pitch, yaw, 0.0)
}

/// [`look_at_rotation`] with yaw and pitch clamped to `±max_yaw` and `±max_pitch`.
pub fn look_at_rotation_constrained(
    head: Vec3,
    target: Vec3,
    up: Vec3,
    max_yaw: f32,
    max_pitch: f32,
) -> Vec3 {
    LookAtLimits { max_yaw, max_pitch }.apply(look_at_rotation(head, target, up))
}
