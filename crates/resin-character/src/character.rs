//! Voxel characters bound to a humanoid skeleton.
//!
//! A [`VoxelCharacter`] owns a [`Skeleton`] and a flat list of voxels, each
//! rigidly attached to one bone. Voxels can come from procedural generation
//! ([`VoxelCharacter::generate_from_params`]) or from externally supplied body
//! part templates ([`VoxelCharacter::assemble_from_parts`]). The mesh builder
//! pulls world-space voxels with [`VoxelCharacter::transformed_voxels`].

use crate::skeleton::{BoneId, HumanoidBone, Skeleton};
use glam::{IVec3, Vec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A single voxel attached to a bone.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CharacterVoxel {
    /// Position relative to the character origin, in the bone's space.
    pub position: IVec3,
    /// RGB color in 0-1 range.
    pub color: Vec3,
    /// Bone this voxel follows.
    pub bone: BoneId,
    /// Skinning weight.
    ///
    /// TODO: blend across neighbouring bones once voxels carry a second
    /// influence; today every voxel follows `bone` rigidly and this is ignored.
    pub weight: f32,
}

impl CharacterVoxel {
    /// Creates a voxel rigidly bound to a bone.
    pub fn new(position: IVec3, color: Vec3, bone: BoneId) -> Self {
        Self {
            position,
            color,
            bone,
            weight: 1.0,
        }
    }
}

/// Body part category for modular assembly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum BodyPartType {
    /// Head.
    Head,
    /// Torso.
    Torso,
    /// Left arm.
    LeftArm,
    /// Right arm.
    RightArm,
    /// Left leg.
    LeftLeg,
    /// Right leg.
    RightLeg,
    /// Left hand.
    LeftHand,
    /// Right hand.
    RightHand,
    /// Left foot.
    LeftFoot,
    /// Right foot.
    RightFoot,
}

/// A body part supplied by an external part library.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BodyPartTemplate {
    /// Which part this is.
    pub part: BodyPartType,
    /// Voxels, already bound to bone indices of the target skeleton.
    pub voxels: Vec<CharacterVoxel>,
    /// Where this part connects to its parent.
    pub attachment_point: Vec3,
    /// Bounding box dimensions.
    pub dimensions: IVec3,
}

/// Parameters for procedural character generation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CharacterGenerationParams {
    /// Head size multiplier (0.5 - 1.5).
    pub head_scale: f32,
    /// Torso size multiplier (0.8 - 1.2).
    pub torso_scale: f32,
    /// Arm and leg size multiplier (0.8 - 1.2).
    pub limb_scale: f32,
    /// Overall height in voxels (12 - 20).
    pub base_height: i32,
    /// Skin color.
    pub skin_color: Vec3,
    /// Clothing color (torso).
    pub primary_color: Vec3,
    /// Accent color (legs).
    pub secondary_color: Vec3,
    /// Muscular rather than slim build. Not consumed by the generator yet.
    pub bulky: bool,
    /// Add armor voxels. Not consumed by the generator yet.
    pub armored: bool,
    /// Seed for color jitter.
    pub seed: u32,
}

impl Default for CharacterGenerationParams {
    fn default() -> Self {
        Self {
            head_scale: 1.0,
            torso_scale: 1.0,
            limb_scale: 1.0,
            base_height: 16,
            skin_color: Vec3::new(0.8, 0.6, 0.5),
            primary_color: Vec3::new(0.2, 0.4, 0.8),
            secondary_color: Vec3::new(0.3, 0.3, 0.3),
            bulky: false,
            armored: false,
            seed: 0,
        }
    }
}

/// A voxel character with a skeletal rig.
#[derive(Debug, Clone)]
pub struct VoxelCharacter {
    skeleton: Skeleton,
    voxels: Vec<CharacterVoxel>,
    position: Vec3,
    rotation: Vec3,
    dimensions: IVec3,
    params: CharacterGenerationParams,
}

impl Default for VoxelCharacter {
    fn default() -> Self {
        Self::new()
    }
}

impl VoxelCharacter {
    /// Creates a character with the humanoid rig and no voxels.
    pub fn new() -> Self {
        Self {
            skeleton: Skeleton::humanoid(),
            voxels: Vec::new(),
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            dimensions: IVec3::ZERO,
            params: CharacterGenerationParams::default(),
        }
    }

    /// Replaces all voxels with a procedurally generated body.
    ///
    /// The same parameters always produce the same voxel list.
    pub fn generate_from_params(&mut self, params: &CharacterGenerationParams) {
        self.params = params.clone();
        self.voxels = BodyGenerator::new(params).build();
        self.dimensions = bounding_dimensions(&self.voxels);
        self.skeleton.update_transforms();

        log::debug!(
            "generated character: {} voxels, dimensions {:?}, seed {}",
            self.voxels.len(),
            self.dimensions,
            params.seed
        );
    }

    /// Replaces all voxels with the concatenation of the given parts.
    ///
    /// Bone indices are taken as-is. Voxels bound to bones this skeleton does
    /// not have are kept and stay at their local position when transformed.
    pub fn assemble_from_parts(&mut self, parts: &[BodyPartTemplate]) {
        self.voxels = parts
            .iter()
            .flat_map(|part| part.voxels.iter().copied())
            .collect();

        let bone_count = self.skeleton.bone_count();
        let unbound = self
            .voxels
            .iter()
            .filter(|v| v.bone.index() >= bone_count)
            .count();
        if unbound > 0 {
            log::warn!(
                "{unbound} assembled voxels reference bones outside the {bone_count}-bone skeleton"
            );
        }

        self.dimensions = bounding_dimensions(&self.voxels);
        self.skeleton.update_transforms();
    }

    /// Recomputes bone transforms from the current rotations.
    ///
    /// The pose depends only on the rotations, so the time step is unused.
    pub fn update(&mut self, _dt: f32) {
        self.skeleton.update_transforms();
    }

    /// Returns every voxel moved into model space by its bone.
    ///
    /// Coordinates are truncated toward zero.
    pub fn transformed_voxels(&self) -> Vec<CharacterVoxel> {
        self.voxels
            .iter()
            .map(|voxel| match self.skeleton.global_transform(voxel.bone) {
                Some(global) => CharacterVoxel {
                    position: global.transform_point3(voxel.position.as_vec3()).as_ivec3(),
                    ..*voxel
                },
                None => *voxel,
            })
            .collect()
    }

    /// Sets a bone's local rotation (Euler radians) and recomputes the tree.
    ///
    /// Unknown bones are ignored.
    pub fn set_bone_rotation(&mut self, bone: BoneId, rotation: Vec3) {
        self.skeleton.set_local_rotation(bone, rotation);
    }

    /// Sets several bone rotations, recomputing the tree once.
    ///
    /// Equivalent to calling [`set_bone_rotation`](Self::set_bone_rotation)
    /// for each entry. Unknown bones are ignored.
    pub fn set_bone_rotations(&mut self, rotations: impl IntoIterator<Item = (BoneId, Vec3)>) {
        let mut changed = false;
        for (bone, rotation) in rotations {
            if let Some(record) = self.skeleton.bone_mut(bone) {
                record.local_rotation = rotation;
                changed = true;
            }
        }
        if changed {
            self.skeleton.update_transforms();
        }
    }

    /// Looks up a bone by name.
    pub fn bone_index(&self, name: &str) -> Option<BoneId> {
        self.skeleton.find_bone(name)
    }

    /// Returns the skeleton.
    pub fn skeleton(&self) -> &Skeleton {
        &self.skeleton
    }

    /// Returns the skeleton mutably.
    pub fn skeleton_mut(&mut self) -> &mut Skeleton {
        &mut self.skeleton
    }

    /// Returns the bone-local voxels.
    pub fn voxels(&self) -> &[CharacterVoxel] {
        &self.voxels
    }

    /// Returns the parameters of the last generation.
    pub fn generation_params(&self) -> &CharacterGenerationParams {
        &self.params
    }

    /// Returns the world position. Not applied to voxels.
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Sets the world position.
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    /// Returns the world orientation (Euler radians). Not applied to voxels.
    pub fn rotation(&self) -> Vec3 {
        self.rotation
    }

    /// Sets the world orientation.
    pub fn set_rotation(&mut self, rotation: Vec3) {
        self.rotation = rotation;
    }

    /// Returns the bounding box size of the bone-local voxels.
    pub fn dimensions(&self) -> IVec3 {
        self.dimensions
    }
}

/// Inclusive bounding box size, zero for an empty list.
fn bounding_dimensions(voxels: &[CharacterVoxel]) -> IVec3 {
    let Some(first) = voxels.first() else {
        return IVec3::ZERO;
    };
    let mut min = first.position;
    let mut max = first.position;
    for voxel in voxels {
        min = min.min(voxel.position);
        max = max.max(voxel.position);
    }
    max - min + IVec3::ONE
}

// ============================================================================
// Procedural body
// ============================================================================

struct BodyGenerator<'a> {
    params: &'a CharacterGenerationParams,
    rng: StdRng,
    voxels: Vec<CharacterVoxel>,
}

impl<'a> BodyGenerator<'a> {
    fn new(params: &'a CharacterGenerationParams) -> Self {
        Self {
            params,
            rng: StdRng::seed_from_u64(u64::from(params.seed)),
            voxels: Vec::new(),
        }
    }

    fn push(&mut self, position: IVec3, base_color: Vec3, bone: HumanoidBone) {
        let jitter: f32 = self.rng.random_range(0.9..1.1);
        let voxel = CharacterVoxel::new(position, base_color * jitter, bone.id());
        self.voxels.push(voxel);
    }

    fn build(mut self) -> Vec<CharacterVoxel> {
        let p = self.params;
        let base_height = p.base_height;

        // Coordinates saturate at the i32 range rather than wrapping.
        // Head: a hemisphere resting two voxels below the nominal height.
        let head_size = (4.0 * p.head_scale) as i32;
        let head_y = base_height.saturating_sub(2);
        let head_radius = head_size as f32 / 2.0;
        for x in -(head_size / 2)..head_size / 2 {
            for y in 0..head_size {
                for z in -(head_size / 2)..head_size / 2 {
                    let dist = Vec3::new(x as f32, y as f32, z as f32).length();
                    if dist < head_radius {
                        let position = IVec3::new(x, head_y.saturating_add(y), z);
                        self.push(position, p.skin_color, HumanoidBone::Head);
                    }
                }
            }
        }

        let torso_width = (4.0 * p.torso_scale) as i32;
        let torso_depth = (2.0 * p.torso_scale) as i32;
        let torso_height = (6.0 * p.torso_scale) as i32;
        let torso_y = base_height.saturating_sub(8);
        for x in -(torso_width / 2)..torso_width / 2 {
            for y in 0..torso_height {
                for z in -(torso_depth / 2)..torso_depth / 2 {
                    self.push(
                        IVec3::new(x, torso_y.saturating_add(y), z),
                        p.primary_color,
                        HumanoidBone::Spine,
                    );
                }
            }
        }

        let limb_width = (2.0 * p.limb_scale) as i32;
        let limb_length = (4.0 * p.limb_scale) as i32;

        // Arms hang from just below the top of the torso, one voxel out.
        let arm_y = torso_y.saturating_add(torso_height).saturating_sub(2);
        let left_arm_x = (-(torso_width / 2)).saturating_sub(1);
        let right_arm_x = (torso_width / 2).saturating_add(1);
        self.limb(
            left_arm_x,
            -1,
            arm_y,
            limb_width,
            limb_length,
            p.skin_color,
            HumanoidBone::LeftArm,
        );
        self.limb(
            right_arm_x,
            1,
            arm_y,
            limb_width,
            limb_length,
            p.skin_color,
            HumanoidBone::RightArm,
        );

        // Legs start at the bottom of the torso.
        self.limb(
            -1,
            -1,
            torso_y,
            limb_width,
            limb_length,
            p.secondary_color,
            HumanoidBone::LeftLeg,
        );
        self.limb(
            1,
            1,
            torso_y,
            limb_width,
            limb_length,
            p.secondary_color,
            HumanoidBone::RightLeg,
        );

        self.voxels
    }

    /// Emits a limb growing outward along `side` (-1 left, +1 right) and down from `top`.
    #[allow(clippy::too_many_arguments)]
    fn limb(
        &mut self,
        start_x: i32,
        side: i32,
        top: i32,
        width: i32,
        length: i32,
        color: Vec3,
        bone: HumanoidBone,
    ) {
        for x in 0..width {
            let vx = start_x.saturating_add(side * x);
            for y in 0..length {
                for z in -(width / 2)..width / 2 {
                    self.push(IVec3::new(vx, top.saturating_sub(y), z), color, bone);
                }
            }
        }
    }
}
