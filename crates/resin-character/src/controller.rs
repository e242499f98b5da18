//! Parameter-driven animation state machine with timed crossfades.
//!
//! Gameplay sets float parameters, the controller checks its transitions in
//! registration order and switches states, then samples the active clip (or
//! crossfades the previous and current clips) onto a [`VoxelCharacter`].

use crate::animation::AnimationClip;
use crate::character::VoxelCharacter;
use crate::error::ControllerError;
use crate::skeleton::BoneId;
use glam::Vec3;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Crossfade length used when no transition specifies one.
pub const DEFAULT_BLEND_DURATION: f32 = 0.3;

/// A named clip with a playback speed.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AnimationState {
    /// State name, unique within a controller.
    pub name: String,
    /// Clip played while in this state.
    pub clip: AnimationClip,
    /// Playback speed multiplier.
    pub speed: f32,
}

impl AnimationState {
    /// Creates a state playing at normal speed.
    pub fn new(name: impl Into<String>, clip: AnimationClip) -> Self {
        Self {
            name: name.into(),
            clip,
            speed: 1.0,
        }
    }

    /// Sets the playback speed.
    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }
}

/// How a parameter is compared against a transition threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Comparison {
    /// Parameter strictly above the threshold.
    #[default]
    GreaterThan,
    /// Parameter strictly below the threshold.
    LessThan,
}

impl Comparison {
    /// Returns true if `value` satisfies the comparison.
    pub fn holds(self, value: f32, threshold: f32) -> bool {
        match self {
            Comparison::GreaterThan => value > threshold,
            Comparison::LessThan => value < threshold,
        }
    }
}

/// A conditional edge between two states.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AnimationTransition {
    /// Source state.
    pub from: String,
    /// Destination state.
    pub to: String,
    /// Parameter tested by the condition.
    pub parameter: String,
    /// Value the parameter is compared against.
    pub threshold: f32,
    /// Comparison direction.
    pub comparison: Comparison,
    /// Crossfade length in seconds.
    pub blend_duration: f32,
}

impl AnimationTransition {
    /// Transition that fires when `parameter > threshold`.
    pub fn when_greater(
        from: impl Into<String>,
        to: impl Into<String>,
        parameter: impl Into<String>,
        threshold: f32,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            parameter: parameter.into(),
            threshold,
            comparison: Comparison::GreaterThan,
            blend_duration: DEFAULT_BLEND_DURATION,
        }
    }

    /// Transition that fires when `parameter < threshold`.
    pub fn when_less(
        from: impl Into<String>,
        to: impl Into<String>,
        parameter: impl Into<String>,
        threshold: f32,
    ) -> Self {
        Self {
            comparison: Comparison::LessThan,
            ..Self::when_greater(from, to, parameter, threshold)
        }
    }

    /// Sets the crossfade length.
    pub fn with_blend_duration(mut self, seconds: f32) -> Self {
        self.blend_duration = seconds;
        self
    }

    /// Returns true if the condition holds for `value`.
    pub fn is_met(&self, value: f32) -> bool {
        self.comparison.holds(value, self.threshold)
    }
}

#[derive(Debug, Clone, Copy)]
struct Blend {
    elapsed: f32,
    duration: f32,
}

/// Animation state machine.
///
/// The first state added becomes current. While a crossfade runs, the
/// previous and current clips are sampled at the same clip time.
#[derive(Debug, Clone)]
pub struct AnimationController {
    states: HashMap<String, AnimationState>,
    order: Vec<String>,
    transitions: Vec<AnimationTransition>,
    parameters: HashMap<String, f32>,
    current: Option<String>,
    previous: Option<String>,
    current_time: f32,
    blend: Option<Blend>,
    default_blend_duration: f32,
}

impl Default for AnimationController {
    fn default() -> Self {
        Self::new()
    }
}

impl AnimationController {
    /// Creates an empty controller.
    pub fn new() -> Self {
        Self {
            states: HashMap::new(),
            order: Vec::new(),
            transitions: Vec::new(),
            parameters: HashMap::new(),
            current: None,
            previous: None,
            current_time: 0.0,
            blend: None,
            default_blend_duration: DEFAULT_BLEND_DURATION,
        }
    }

    /// Sets the crossfade length used by [`set_state`](Self::set_state)
    /// when no registered transition covers the state pair.
    pub fn with_default_blend_duration(mut self, seconds: f32) -> Self {
        self.default_blend_duration = seconds;
        self
    }

    /// Returns the fallback crossfade length.
    pub fn default_blend_duration(&self) -> f32 {
        self.default_blend_duration
    }

    /// Registers a state.
    ///
    /// A state with an existing name replaces the old one in place.
    pub fn add_state(&mut self, state: AnimationState) {
        if !self.states.contains_key(&state.name) {
            self.order.push(state.name.clone());
        }
        if self.current.is_none() {
            self.current = Some(state.name.clone());
        }
        self.states.insert(state.name.clone(), state);
    }

    /// Appends a transition. Transitions are checked in the order added.
    pub fn add_transition(&mut self, transition: AnimationTransition) {
        self.transitions.push(transition);
    }

    /// Switches to a state, starting a crossfade from the current one.
    ///
    /// Unknown names and the current state are ignored. Clip time restarts
    /// at zero.
    pub fn set_state(&mut self, name: &str) {
        if !self.states.contains_key(name) || self.current.as_deref() == Some(name) {
            return;
        }

        let previous = self.current.replace(name.to_string());
        let duration = self
            .transitions
            .iter()
            .find(|t| previous.as_deref() == Some(t.from.as_str()) && t.to == name)
            .map_or(self.default_blend_duration, |t| t.blend_duration);

        log::debug!(
            "animation state {} -> {name}, blending over {duration}s",
            previous.as_deref().unwrap_or("<none>")
        );

        self.previous = previous;
        self.blend = Some(Blend {
            elapsed: 0.0,
            duration,
        });
        self.current_time = 0.0;
    }

    /// Sets a named parameter.
    pub fn set_parameter(&mut self, name: impl Into<String>, value: f32) {
        self.parameters.insert(name.into(), value);
    }

    /// Returns a parameter value, or 0 if it was never set.
    pub fn parameter(&self, name: &str) -> f32 {
        self.parameters.get(name).copied().unwrap_or(0.0)
    }

    /// Advances the state machine and poses the character.
    ///
    /// Does nothing until a state has been added.
    pub fn update(&mut self, character: &mut VoxelCharacter, dt: f32) {
        match self.current.as_deref() {
            Some(current) if self.states.contains_key(current) => {}
            _ => return,
        }

        self.check_transitions();

        if let Some(blend) = &mut self.blend {
            blend.elapsed += dt;
            if blend.elapsed >= blend.duration {
                log::debug!(
                    "blend into {} finished",
                    self.current.as_deref().unwrap_or("")
                );
                self.blend = None;
            }
        }

        let Some(state) = self.current.as_ref().and_then(|c| self.states.get(c)) else {
            return;
        };
        self.current_time = state.clip.wrap_time(self.current_time + dt * state.speed);

        self.apply_pose(character);
    }

    /// Fires the first transition out of the current state whose condition holds.
    fn check_transitions(&mut self) {
        let Some(current) = self.current.as_deref() else {
            return;
        };
        let fired = self
            .transitions
            .iter()
            .find(|t| t.from == current && t.is_met(self.parameter(&t.parameter)));

        if let Some(transition) = fired {
            log::trace!(
                "transition {} -> {} on {} = {}",
                transition.from,
                transition.to,
                transition.parameter,
                self.parameter(&transition.parameter)
            );
            let to = transition.to.clone();
            self.set_state(&to);
        }
    }

    fn apply_pose(&self, character: &mut VoxelCharacter) {
        let Some(current) = self.current.as_ref().and_then(|c| self.states.get(c)) else {
            return;
        };
        let previous = self
            .blend
            .and(self.previous.as_ref())
            .and_then(|p| self.states.get(p));

        let bone_count = character.skeleton().bone_count() as u32;
        let time = self.current_time;
        let to_clip = &current.clip;

        let pose: Vec<(BoneId, Vec3)> = match previous {
            Some(from) => {
                let factor = self.blend_factor();
                (0..bone_count)
                    .map(BoneId)
                    .filter_map(|bone| {
                        let from_rot = from.clip.sample_bone(time, bone).map(|s| s.rotation);
                        let to_rot = to_clip.sample_bone(time, bone).map(|s| s.rotation);
                        if from_rot.is_none() && to_rot.is_none() {
                            return None;
                        }
                        let from_rot = from_rot.unwrap_or(Vec3::ZERO);
                        let to_rot = to_rot.unwrap_or(Vec3::ZERO);
                        Some((bone, from_rot.lerp(to_rot, factor)))
                    })
                    .collect()
            }
            None => (0..bone_count)
                .map(BoneId)
                .filter_map(|bone| to_clip.sample_bone(time, bone).map(|s| (bone, s.rotation)))
                .collect(),
        };

        // TODO: apply sampled position offsets once bones expose a pose offset
        // separate from their rest position.
        character.set_bone_rotations(pose);
    }

    /// Checks that every transition references registered states.
    pub fn validate(&self) -> Result<(), ControllerError> {
        for (index, transition) in self.transitions.iter().enumerate() {
            for name in [&transition.from, &transition.to] {
                if !self.states.contains_key(name) {
                    return Err(ControllerError::UnknownState {
                        transition: index,
                        state: name.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Returns the clip time of the current state.
    pub fn current_time(&self) -> f32 {
        self.current_time
    }

    /// Returns the current state name.
    pub fn current_state(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Returns the state that was current before the last switch.
    pub fn previous_state(&self) -> Option<&str> {
        self.previous.as_deref()
    }

    /// Returns true while a crossfade is running.
    pub fn is_blending(&self) -> bool {
        self.blend.is_some()
    }

    /// Returns the crossfade weight of the current state (1 when not blending).
    pub fn blend_factor(&self) -> f32 {
        match self.blend {
            Some(blend) if blend.duration > 0.0 => blend.elapsed / blend.duration,
            _ => 1.0,
        }
    }

    /// Returns a state by name.
    pub fn state(&self, name: &str) -> Option<&AnimationState> {
        self.states.get(name)
    }

    /// Returns states in registration order.
    pub fn states(&self) -> impl Iterator<Item = &AnimationState> {
        self.order.iter().filter_map(|name| self.states.get(name))
    }

    /// Returns transitions in registration order.
    pub fn transitions(&self) -> &[AnimationTransition] {
        &self.transitions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{AnimationType, Keyframe};
    use crate::character::CharacterGenerationParams;
    use crate::skeleton::HumanoidBone;

    const DT: f32 = 0.016;
    const EPS: f32 = 1e-5;

    fn character() -> VoxelCharacter {
        let mut character = VoxelCharacter::new();
        character.generate_from_params(&CharacterGenerationParams::default());
        character
    }

    fn locomotion() -> AnimationController {
        let mut controller = AnimationController::new();
        controller.add_state(AnimationState::new(
            "Idle",
            AnimationClip::preset(AnimationType::Idle),
        ));
        controller.add_state(AnimationState::new(
            "Walk",
            AnimationClip::preset(AnimationType::Walk),
        ));
        controller.add_transition(AnimationTransition::when_greater("Idle", "Walk", "speed", 0.1));
        controller.add_transition(AnimationTransition::when_less("Walk", "Idle", "speed", 0.1));
        controller
    }

    fn rotation(character: &VoxelCharacter, bone: HumanoidBone) -> Vec3 {
        character.skeleton().bone(bone.id()).unwrap().local_rotation
    }

    #[test]
    fn test_first_state_becomes_current() {
        let controller = locomotion();
        assert_eq!(controller.current_state(), Some("Idle"));
        assert_eq!(controller.previous_state(), None);
        assert!(!controller.is_blending());
    }

    #[test]
    fn test_empty_controller_update_is_noop() {
        let mut controller = AnimationController::new();
        let mut character = character();
        controller.update(&mut character, DT);
        assert_eq!(controller.current_state(), None);
        assert_eq!(controller.current_time(), 0.0);
    }

    #[test]
    fn test_parameters() {
        let mut controller = AnimationController::new();
        assert_eq!(controller.parameter("speed"), 0.0);
        controller.set_parameter("speed", 2.5);
        assert_eq!(controller.parameter("speed"), 2.5);
    }

    #[test]
    fn test_comparison() {
        assert!(Comparison::GreaterThan.holds(1.0, 0.5));
        assert!(!Comparison::GreaterThan.holds(0.5, 0.5));
        assert!(Comparison::LessThan.holds(0.4, 0.5));
        assert!(!Comparison::LessThan.holds(0.5, 0.5));
    }

    #[test]
    fn test_set_state_unknown_is_noop() {
        let mut controller = locomotion();
        controller.set_state("Swim");
        assert_eq!(controller.current_state(), Some("Idle"));
        assert!(!controller.is_blending());
    }

    #[test]
    fn test_set_state_same_is_noop() {
        let mut controller = locomotion();
        controller.set_state("Idle");
        assert!(!controller.is_blending());
        assert_eq!(controller.previous_state(), None);
    }

    #[test]
    fn test_set_state_uses_transition_blend_duration() {
        let mut controller = AnimationController::new();
        controller.add_state(AnimationState::new("A", AnimationClip::new("A")));
        controller.add_state(AnimationState::new("B", AnimationClip::new("B")));
        let on_x = AnimationTransition::when_greater("A", "B", "x", 0.0);
        let on_y = AnimationTransition::when_greater("A", "B", "y", 0.0);
        controller.add_transition(on_x.with_blend_duration(1.0));
        controller.add_transition(on_y.with_blend_duration(5.0));

        controller.set_state("B");
        assert!(controller.is_blending());
        assert_eq!(controller.previous_state(), Some("A"));

        let mut character = character();
        controller.update(&mut character, 0.5);
        assert!((controller.blend_factor() - 0.5).abs() < EPS);
    }

    #[test]
    fn test_set_state_falls_back_to_default_duration() {
        let mut controller = locomotion().with_default_blend_duration(2.0);
        let jump = AnimationClip::preset(AnimationType::Jump);
        controller.add_state(AnimationState::new("Jump", jump));
        controller.set_state("Jump");

        let mut character = character();
        controller.update(&mut character, 0.5);
        assert!((controller.blend_factor() - 0.25).abs() < EPS);
    }

    #[test]
    fn test_zero_blend_duration() {
        let mut controller = locomotion().with_default_blend_duration(0.0);
        let run = AnimationClip::preset(AnimationType::Run);
        controller.add_state(AnimationState::new("Run", run));
        controller.set_state("Run");
        assert!(controller.is_blending());
        assert_eq!(controller.blend_factor(), 1.0);

        let mut character = character();
        controller.update(&mut character, DT);
        assert!(!controller.is_blending());
    }

    #[test]
    fn test_idle_to_walk_blend() {
        let mut controller = locomotion();
        let mut character = character();
        controller.set_parameter("speed", 1.0);

        controller.update(&mut character, DT);
        assert_eq!(controller.current_state(), Some("Walk"));
        assert_eq!(controller.previous_state(), Some("Idle"));
        assert!(controller.is_blending());
        assert!((controller.current_time() - DT).abs() < EPS);

        for _ in 1..18 {
            controller.update(&mut character, DT);
        }
        assert!(controller.is_blending());

        controller.update(&mut character, DT);
        assert!(!controller.is_blending());
        assert_eq!(controller.current_state(), Some("Walk"));
    }

    #[test]
    fn test_blend_fades_bones_defined_on_one_side() {
        let mut controller = locomotion();
        let mut character = character();
        controller.set_parameter("speed", 1.0);
        controller.update(&mut character, DT);

        let factor = controller.blend_factor();
        let time = controller.current_time();
        let walk = AnimationClip::preset(AnimationType::Walk);
        let idle = AnimationClip::preset(AnimationType::Idle);

        // Walk drives the legs, Idle does not: fade in from zero.
        let leg = walk.sample_bone(time, HumanoidBone::LeftLeg.id()).unwrap();
        let expected = leg.rotation * factor;
        assert!((rotation(&character, HumanoidBone::LeftLeg) - expected).length() < EPS);

        // Idle drives the spine, Walk does not: fade out toward zero.
        let spine = idle.sample_bone(time, HumanoidBone::Spine.id()).unwrap();
        let expected = spine.rotation * (1.0 - factor);
        assert!((rotation(&character, HumanoidBone::Spine) - expected).length() < EPS);

        // Neither clip drives the neck.
        assert_eq!(rotation(&character, HumanoidBone::Neck), Vec3::ZERO);
    }

    #[test]
    fn test_unblended_pose_is_assigned_directly() {
        let mut controller = AnimationController::new();
        controller.add_state(AnimationState::new(
            "Walk",
            AnimationClip::preset(AnimationType::Walk),
        ));
        let mut character = character();
        controller.update(&mut character, 0.1);

        let walk = AnimationClip::preset(AnimationType::Walk);
        let expected = walk.sample_bone(0.1, HumanoidBone::RightArm.id()).unwrap();
        let actual = rotation(&character, HumanoidBone::RightArm);
        assert!((actual - expected.rotation).length() < EPS);
    }

    #[test]
    fn test_walk_back_to_idle() {
        let mut controller = locomotion();
        let mut character = character();
        controller.set_parameter("speed", 1.0);
        for _ in 0..30 {
            controller.update(&mut character, DT);
        }
        controller.set_parameter("speed", 0.0);
        controller.update(&mut character, DT);
        assert_eq!(controller.current_state(), Some("Idle"));
        assert_eq!(controller.previous_state(), Some("Walk"));
    }

    #[test]
    fn test_transition_restarts_blend() {
        let mut controller = AnimationController::new();
        controller.add_state(AnimationState::new(
            "Idle",
            AnimationClip::preset(AnimationType::Idle),
        ));
        controller.add_state(AnimationState::new(
            "Walk",
            AnimationClip::preset(AnimationType::Walk),
        ));
        let to_walk = AnimationTransition::when_greater("Idle", "Walk", "speed", 0.1);
        let to_idle = AnimationTransition::when_less("Walk", "Idle", "speed", 0.1);
        controller.add_transition(to_walk.with_blend_duration(1.0));
        controller.add_transition(to_idle.with_blend_duration(1.0));
        let mut character = character();

        controller.set_parameter("speed", 1.0);
        controller.update(&mut character, 0.1);
        assert_eq!(controller.current_state(), Some("Walk"));
        assert!(controller.is_blending());

        // Reversing mid-blend starts a fresh crossfade out of Walk.
        controller.set_parameter("speed", 0.0);
        controller.update(&mut character, 0.1);
        assert_eq!(controller.current_state(), Some("Idle"));
        assert_eq!(controller.previous_state(), Some("Walk"));
        assert!((controller.blend_factor() - 0.1).abs() < EPS);
    }

    #[test]
    fn test_first_matching_transition_wins() {
        let mut controller = locomotion();
        controller.transitions.insert(
            0,
            AnimationTransition::when_greater("Idle", "Idle", "speed", 0.1),
        );
        let mut character = character();
        controller.set_parameter("speed", 1.0);
        controller.update(&mut character, DT);

        // The self-transition matched first and is a no-op.
        assert_eq!(controller.current_state(), Some("Idle"));
        assert!(!controller.is_blending());
    }

    #[test]
    fn test_speed_scales_clip_time() {
        let mut controller = AnimationController::new();
        let walk = AnimationClip::preset(AnimationType::Walk);
        controller.add_state(AnimationState::new("Walk", walk).with_speed(2.0));
        let mut character = character();
        controller.update(&mut character, 0.1);
        assert!((controller.current_time() - 0.2).abs() < EPS);
    }

    #[test]
    fn test_looping_state_wraps_time() {
        let mut controller = AnimationController::new();
        controller.add_state(AnimationState::new(
            "Walk",
            AnimationClip::preset(AnimationType::Walk),
        ));
        let mut character = character();
        for _ in 0..6 {
            controller.update(&mut character, 0.25);
        }
        assert!((controller.current_time() - 0.5).abs() < EPS);
    }

    #[test]
    fn test_one_shot_state_keeps_time() {
        let mut controller = AnimationController::new();
        controller.add_state(AnimationState::new(
            "Jump",
            AnimationClip::preset(AnimationType::Jump),
        ));
        let mut character = character();
        for _ in 0..6 {
            controller.update(&mut character, 0.25);
        }
        assert!((controller.current_time() - 1.5).abs() < EPS);

        // Sampling clamps to the final keyframe.
        assert!(rotation(&character, HumanoidBone::Spine).length() < EPS);
    }

    #[test]
    fn test_add_state_replaces_in_place() {
        let mut controller = locomotion();
        let mut clip = AnimationClip::new("Idle2");
        clip.add_keyframe(Keyframe::new(0.0));
        controller.add_state(AnimationState::new("Idle", clip));

        let names: Vec<&str> = controller.states().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Idle", "Walk"]);
        assert_eq!(controller.state("Idle").unwrap().clip.name(), "Idle2");
        assert_eq!(controller.current_state(), Some("Idle"));
    }

    #[test]
    fn test_validate() {
        let mut controller = locomotion();
        assert_eq!(controller.validate(), Ok(()));

        controller.add_transition(AnimationTransition::when_greater("Walk", "Run", "speed", 3.0));
        assert_eq!(
            controller.validate(),
            Err(ControllerError::UnknownState {
                transition: 2,
                state: "Run".into()
            })
        );
    }

    #[test]
    fn test_transitions_accessor() {
        let controller = locomotion();
        assert_eq!(controller.transitions().len(), 2);
        assert_eq!(controller.transitions()[1].comparison, Comparison::LessThan);
        assert_eq!(
            controller.transitions()[0].blend_duration,
            DEFAULT_BLEND_DURATION
        );
    }
}
