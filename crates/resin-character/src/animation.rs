//! Keyframe animation clips for the humanoid rig.
//!
//! A clip stores sparse per-bone Euler rotations and position offsets at
//! discrete times. Sampling brackets the requested time between two
//! keyframes and linearly interpolates each component.

use crate::skeleton::BoneId;
use crate::skeleton::HumanoidBone::{Head, LeftArm, LeftLeg, RightArm, RightLeg, Root, Spine};
use glam::Vec3;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Bone values at a single point in time.
///
/// Bones missing from a map are left to neighbouring keyframes.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Keyframe {
    /// Time in seconds.
    pub time: f32,
    /// Euler rotations (radians) by bone.
    pub rotations: BTreeMap<BoneId, Vec3>,
    /// Position offsets by bone.
    pub positions: BTreeMap<BoneId, Vec3>,
}

impl Keyframe {
    /// Creates an empty keyframe at a time.
    pub fn new(time: f32) -> Self {
        Self {
            time,
            ..Default::default()
        }
    }

    /// Sets a bone rotation.
    pub fn with_rotation(mut self, bone: impl Into<BoneId>, rotation: Vec3) -> Self {
        self.rotations.insert(bone.into(), rotation);
        self
    }

    /// Sets a bone position offset.
    pub fn with_position(mut self, bone: impl Into<BoneId>, position: Vec3) -> Self {
        self.positions.insert(bone.into(), position);
        self
    }
}

/// Result of sampling one bone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoneSample {
    /// Interpolated Euler rotation.
    pub rotation: Vec3,
    /// Interpolated position offset, zero when no keyframe sets one.
    pub position: Vec3,
}

/// Canonical clips available from [`AnimationClip::preset`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum AnimationType {
    /// Slow spine and head sway, 4 s loop.
    Idle,
    /// Leg and arm swing, 1 s loop.
    Walk,
    /// Wider swing with a forward lean, 0.6 s loop.
    Run,
    /// Crouch, launch, airborne, land; plays once.
    Jump,
    /// Lower into a crouch; plays once.
    Crouch,
    /// An empty clip with the given name.
    Custom(String),
}

/// A named sequence of keyframes.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AnimationClip {
    name: String,
    keyframes: Vec<Keyframe>,
    duration: f32,
    looping: bool,
}

impl AnimationClip {
    /// Creates an empty, non-looping clip.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Sets whether the clip loops.
    pub fn with_looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    /// Returns the clip name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the time of the last keyframe (0 when empty).
    pub fn duration(&self) -> f32 {
        self.duration
    }

    /// Returns true if playback wraps around at the end.
    pub fn is_looping(&self) -> bool {
        self.looping
    }

    /// Sets whether the clip loops.
    pub fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    /// Returns keyframes sorted by time.
    pub fn keyframes(&self) -> &[Keyframe] {
        &self.keyframes
    }

    /// Returns the number of keyframes.
    pub fn len(&self) -> usize {
        self.keyframes.len()
    }

    /// Returns true if the clip has no keyframes.
    pub fn is_empty(&self) -> bool {
        self.keyframes.is_empty()
    }

    /// Adds a keyframe and keeps the list sorted.
    ///
    /// Keyframes sharing a time keep their insertion order. The duration
    /// becomes the last keyframe's time, which can be negative.
    pub fn add_keyframe(&mut self, keyframe: Keyframe) {
        self.keyframes.push(keyframe);
        self.keyframes.sort_by(|a, b| a.time.total_cmp(&b.time));
        self.duration = self.keyframes.last().map_or(0.0, |k| k.time);
    }

    /// Maps a playback time into the clip's range.
    ///
    /// Looping clips with a positive duration wrap with a floating-point
    /// remainder (negative input stays negative); other clips return `time`.
    pub fn wrap_time(&self, time: f32) -> f32 {
        if self.looping && self.duration > 0.0 {
            time % self.duration
        } else {
            time
        }
    }

    /// Samples one bone at a time.
    ///
    /// Returns `None` if the clip is empty or neither bracketing keyframe
    /// has a rotation for the bone.
    pub fn sample_bone(&self, time: f32, bone: BoneId) -> Option<BoneSample> {
        if self.keyframes.is_empty() {
            return None;
        }

        let time = self.wrap_time(time).clamp(0.0, self.duration.max(0.0));
        let (prev, next) = self.bracket(time)?;

        let t = if next.time > prev.time {
            (time - prev.time) / (next.time - prev.time)
        } else {
            0.0
        };

        let rotation = blend_channel(prev.rotations.get(&bone), next.rotations.get(&bone), t)?;
        let position = blend_channel(prev.positions.get(&bone), next.positions.get(&bone), t);

        Some(BoneSample {
            rotation,
            position: position.unwrap_or(Vec3::ZERO),
        })
    }

    /// Finds the keyframes surrounding `time`.
    fn bracket(&self, time: f32) -> Option<(&Keyframe, &Keyframe)> {
        let first = self.keyframes.first()?;
        let last = self.keyframes.last()?;

        if time <= first.time {
            return Some((first, first));
        }
        if time >= last.time {
            return Some((last, last));
        }

        self.keyframes
            .windows(2)
            .find(|pair| time >= pair[0].time && time < pair[1].time)
            .map(|pair| (&pair[0], &pair[1]))
    }

    /// Builds one of the canonical clips.
    pub fn preset(kind: AnimationType) -> Self {
        match kind {
            AnimationType::Idle => idle_clip(),
            AnimationType::Walk => walk_clip(),
            AnimationType::Run => run_clip(),
            AnimationType::Jump => jump_clip(),
            AnimationType::Crouch => crouch_clip(),
            AnimationType::Custom(name) => AnimationClip::new(name),
        }
    }
}

/// Lerps when both sides are present, otherwise holds whichever exists.
fn blend_channel(prev: Option<&Vec3>, next: Option<&Vec3>, t: f32) -> Option<Vec3> {
    match (prev, next) {
        (Some(a), Some(b)) => Some(a.lerp(*b, t)),
        (Some(v), None) | (None, Some(v)) => Some(*v),
        (None, None) => None,
    }
}

// ============================================================================
// Presets
// ============================================================================

fn pitch(x: f32) -> Vec3 {
    Vec3::new(x, 0.0, 0.0)
}

fn idle_clip() -> AnimationClip {
    const SWAY: f32 = 0.05;

    let mut clip = AnimationClip::new("Idle").with_looping(true);
    for (time, spine, head) in [
        (0.0, 0.0, 0.0),
        (1.0, SWAY, -SWAY * 0.5),
        (2.0, 0.0, 0.0),
        (3.0, -SWAY, SWAY * 0.5),
        (4.0, 0.0, 0.0),
    ] {
        clip.add_keyframe(
            Keyframe::new(time)
                .with_rotation(Spine, Vec3::new(0.0, spine, 0.0))
                .with_rotation(Head, Vec3::new(0.0, head, 0.0)),
        );
    }
    clip
}

/// Alternating limb swing: at phase `s` the left leg and right arm swing
/// forward by `s * leg` and `s * arm`, the other pair mirrors them.
fn stride(time: f32, s: f32, leg: f32, arm: f32) -> Keyframe {
    Keyframe::new(time)
        .with_rotation(LeftLeg, pitch(s * leg))
        .with_rotation(RightLeg, pitch(-s * leg))
        .with_rotation(LeftArm, pitch(-s * arm))
        .with_rotation(RightArm, pitch(s * arm))
}

fn walk_clip() -> AnimationClip {
    const LEG_SWING: f32 = 0.6;
    const ARM_SWING: f32 = 0.4;

    let mut clip = AnimationClip::new("Walk").with_looping(true);
    for (time, phase) in [
        (0.0, 1.0),
        (0.25, 0.0),
        (0.5, -1.0),
        (0.75, 0.0),
        (1.0, 1.0),
    ] {
        clip.add_keyframe(stride(time, phase, LEG_SWING, ARM_SWING));
    }
    clip
}

fn run_clip() -> AnimationClip {
    const LEG_SWING: f32 = 1.0;
    const ARM_SWING: f32 = 0.8;
    const LEAN: f32 = 0.2;

    let mut clip = AnimationClip::new("Run").with_looping(true);
    for (time, phase) in [(0.0, 1.0), (0.3, -1.0), (0.6, 1.0)] {
        clip.add_keyframe(
            stride(time, phase, LEG_SWING, ARM_SWING).with_rotation(Spine, pitch(LEAN)),
        );
    }
    clip
}

fn jump_clip() -> AnimationClip {
    let mut clip = AnimationClip::new("Jump");

    // Wind up.
    clip.add_keyframe(
        Keyframe::new(0.0)
            .with_rotation(Spine, pitch(0.3))
            .with_rotation(LeftLeg, pitch(-0.5))
            .with_rotation(RightLeg, pitch(-0.5))
            .with_position(Root, Vec3::new(0.0, -1.0, 0.0)),
    );
    // Launch.
    clip.add_keyframe(
        Keyframe::new(0.2)
            .with_rotation(Spine, pitch(-0.2))
            .with_rotation(LeftLeg, pitch(0.2))
            .with_rotation(RightLeg, pitch(0.2))
            .with_rotation(LeftArm, Vec3::new(0.0, 0.0, -0.5))
            .with_rotation(RightArm, Vec3::new(0.0, 0.0, 0.5))
            .with_position(Root, Vec3::new(0.0, 0.5, 0.0)),
    );
    // Apex.
    clip.add_keyframe(
        Keyframe::new(0.5)
            .with_rotation(Spine, Vec3::ZERO)
            .with_rotation(LeftLeg, Vec3::ZERO)
            .with_rotation(RightLeg, Vec3::ZERO)
            .with_rotation(LeftArm, Vec3::new(0.0, 0.0, -0.3))
            .with_rotation(RightArm, Vec3::new(0.0, 0.0, 0.3))
            .with_position(Root, Vec3::ZERO),
    );
    // Landing.
    clip.add_keyframe(
        Keyframe::new(0.8)
            .with_rotation(Spine, pitch(0.2))
            .with_rotation(LeftLeg, pitch(-0.3))
            .with_rotation(RightLeg, pitch(-0.3))
            .with_rotation(LeftArm, Vec3::new(0.0, 0.0, -0.2))
            .with_rotation(RightArm, Vec3::new(0.0, 0.0, 0.2))
            .with_position(Root, Vec3::new(0.0, -0.5, 0.0)),
    );
    // Recovered.
    clip.add_keyframe(
        Keyframe::new(1.0)
            .with_rotation(Spine, Vec3::ZERO)
            .with_rotation(LeftLeg, Vec3::ZERO)
            .with_rotation(RightLeg, Vec3::ZERO)
            .with_rotation(LeftArm, Vec3::ZERO)
            .with_rotation(RightArm, Vec3::ZERO)
            .with_position(Root, Vec3::ZERO),
    );
    clip
}

fn crouch_clip() -> AnimationClip {
    let mut clip = AnimationClip::new("Crouch");
    clip.add_keyframe(
        Keyframe::new(0.0)
            .with_rotation(Spine, Vec3::ZERO)
            .with_position(Root, Vec3::ZERO),
    );
    clip.add_keyframe(
        Keyframe::new(0.3)
            .with_rotation(Spine, pitch(0.4))
            .with_rotation(LeftLeg, pitch(-0.6))
            .with_rotation(RightLeg, pitch(-0.6))
            .with_position(Root, Vec3::new(0.0, -1.5, 0.0)),
    );
    clip
}
