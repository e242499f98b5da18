//! Walk cycle demo.
//!
//! Generates a character, drives it from idle into a walk, and plants a
//! foot with IK, printing the rig state along the way.
//!
//! Run with: `RUST_LOG=debug cargo run -p rhizome-resin-character --example walk_cycle`

use glam::Vec3;
use rhizome_resin_character::{
    AnimationClip, AnimationState, AnimationTransition, AnimationType, CharacterGenerationParams,
    HumanoidBone, RigConfig, VoxelCharacter, look_at_rotation,
};

fn main() {
    env_logger::init();

    let config = RigConfig::default();
    let mut character = VoxelCharacter::new();
    character.generate_from_params(&CharacterGenerationParams {
        seed: 7,
        ..Default::default()
    });
    println!(
        "Character: {} voxels, {:?} bounds",
        character.voxels().len(),
        character.dimensions()
    );

    let mut controller = config.controller();
    controller.add_state(AnimationState::new("Idle", AnimationClip::preset(AnimationType::Idle)));
    controller.add_state(AnimationState::new("Walk", AnimationClip::preset(AnimationType::Walk)));
    let run = AnimationState::new("Run", AnimationClip::preset(AnimationType::Run));
    controller.add_state(run.with_speed(1.2));
    controller.add_transition(AnimationTransition::when_greater("Idle", "Walk", "speed", 0.1));
    let sprint = AnimationTransition::when_greater("Walk", "Run", "speed", 4.0);
    controller.add_transition(sprint.with_blend_duration(0.2));
    controller.add_transition(AnimationTransition::when_less("Walk", "Idle", "speed", 0.1));
    controller.add_transition(AnimationTransition::when_less("Run", "Walk", "speed", 4.0));
    if let Err(err) = controller.validate() {
        eprintln!("invalid controller: {err}");
        return;
    }

    let dt = 1.0 / 60.0;
    for frame in 0..120 {
        let speed = match frame {
            0..20 => 0.0,
            20..80 => 2.0,
            _ => 5.0,
        };
        controller.set_parameter("speed", speed);
        controller.update(&mut character, dt);

        if frame % 20 == 0 {
            let leg = character
                .skeleton()
                .bone(HumanoidBone::LeftLeg.id())
                .map_or(Vec3::ZERO, |b| b.local_rotation);
            println!(
                "frame {frame:3}: state {:5} t={:.3} blend={:.2} left leg pitch {:+.3}",
                controller.current_state().unwrap_or("-"),
                controller.current_time(),
                controller.blend_factor(),
                leg.x
            );
        }
    }

    let hip = character
        .skeleton()
        .global_transform(HumanoidBone::RightHip.id())
        .map_or(Vec3::ZERO, |m| m.w_axis.truncate());
    let foot = config.foot;
    let target = hip + Vec3::new(0.0, -3.5, 0.5);
    let step = foot.solve_foot(hip, target, Vec3::new(0.0, 1.0, 0.2));
    println!(
        "Foot IK: success={} hip {:?} knee {:?} foot {:?}",
        step.success, step.joint1_rotation, step.joint2_rotation, step.end_effector_rotation
    );

    let head = character
        .skeleton()
        .global_transform(HumanoidBone::Head.id())
        .map_or(Vec3::ZERO, |m| m.w_axis.truncate());
    let limits = config.look_at;
    let gaze = limits.apply(look_at_rotation(head, Vec3::new(10.0, 2.0, 10.0), Vec3::Y));
    println!("Look-at: {gaze:?}");
}
