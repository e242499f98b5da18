//! Bone hierarchy stored as an arena indexed by [`BoneId`].

use crate::error::SkeletonError;
use crate::transform::EulerTransform;
use glam::{Mat4, Vec3};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A bone identifier (index into skeleton).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BoneId(pub u32);

impl BoneId {
    /// Creates a new bone ID.
    pub fn new(index: u32) -> Self {
        Self(index)
    }

    /// Returns the index.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A bone in a skeleton.
///
/// The parent link is fixed once the bone is added; only the local
/// position, rotation, and scale are meant to change afterwards.
#[derive(Debug, Clone)]
pub struct Bone {
    /// Human-readable name.
    pub name: String,
    parent: Option<BoneId>,
    /// Offset from the parent bone.
    pub local_position: Vec3,
    /// Euler angles in radians, relative to the parent.
    pub local_rotation: Vec3,
    /// Scale relative to the parent.
    pub local_scale: Vec3,
    local_transform: Mat4,
    global_transform: Mat4,
}

impl Default for Bone {
    fn default() -> Self {
        Self {
            name: String::new(),
            parent: None,
            local_position: Vec3::ZERO,
            local_rotation: Vec3::ZERO,
            local_scale: Vec3::ONE,
            local_transform: Mat4::IDENTITY,
            global_transform: Mat4::IDENTITY,
        }
    }
}

impl Bone {
    /// Creates a new root bone.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Sets the parent bone.
    pub fn with_parent(mut self, parent: BoneId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Sets the offset from the parent.
    pub fn with_position(mut self, position: Vec3) -> Self {
        self.local_position = position;
        self
    }

    /// Sets the local rotation.
    pub fn with_rotation(mut self, rotation: Vec3) -> Self {
        self.local_rotation = rotation;
        self
    }

    /// Returns the parent bone (None for roots).
    pub fn parent(&self) -> Option<BoneId> {
        self.parent
    }

    /// Returns the local position, rotation, and scale as one transform.
    pub fn local_trs(&self) -> EulerTransform {
        EulerTransform::new(self.local_position, self.local_rotation, self.local_scale)
    }

    /// Returns the cached local matrix from the last transform update.
    pub fn local_transform(&self) -> Mat4 {
        self.local_transform
    }

    /// Returns the cached model-space matrix from the last transform update.
    pub fn global_transform(&self) -> Mat4 {
        self.global_transform
    }
}

/// Bones of the fixed humanoid rig, in arena order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum HumanoidBone {
    /// Hips; the single root.
    Root,
    /// Lower back.
    Spine,
    /// Neck.
    Neck,
    /// Head.
    Head,
    /// Left shoulder joint.
    LeftShoulder,
    /// Left arm.
    LeftArm,
    /// Left hand.
    LeftHand,
    /// Right shoulder joint.
    RightShoulder,
    /// Right arm.
    RightArm,
    /// Right hand.
    RightHand,
    /// Left hip joint.
    LeftHip,
    /// Left leg.
    LeftLeg,
    /// Left foot.
    LeftFoot,
    /// Right hip joint.
    RightHip,
    /// Right leg.
    RightLeg,
    /// Right foot.
    RightFoot,
}

impl HumanoidBone {
    /// All bones in arena order.
    pub const ALL: [HumanoidBone; 16] = [
        HumanoidBone::Root,
        HumanoidBone::Spine,
        HumanoidBone::Neck,
        HumanoidBone::Head,
        HumanoidBone::LeftShoulder,
        HumanoidBone::LeftArm,
        HumanoidBone::LeftHand,
        HumanoidBone::RightShoulder,
        HumanoidBone::RightArm,
        HumanoidBone::RightHand,
        HumanoidBone::LeftHip,
        HumanoidBone::LeftLeg,
        HumanoidBone::LeftFoot,
        HumanoidBone::RightHip,
        HumanoidBone::RightLeg,
        HumanoidBone::RightFoot,
    ];

    /// Returns the bone's index in a humanoid skeleton.
    pub fn id(self) -> BoneId {
        BoneId(self as u32)
    }

    /// Returns the bone name used by [`Skeleton::humanoid`].
    pub fn name(self) -> &'static str {
        match self {
            HumanoidBone::Root => "Root",
            HumanoidBone::Spine => "Spine",
            HumanoidBone::Neck => "Neck",
            HumanoidBone::Head => "Head",
            HumanoidBone::LeftShoulder => "LeftShoulder",
            HumanoidBone::LeftArm => "LeftArm",
            HumanoidBone::LeftHand => "LeftHand",
            HumanoidBone::RightShoulder => "RightShoulder",
            HumanoidBone::RightArm => "RightArm",
            HumanoidBone::RightHand => "RightHand",
            HumanoidBone::LeftHip => "LeftHip",
            HumanoidBone::LeftLeg => "LeftLeg",
            HumanoidBone::LeftFoot => "LeftFoot",
            HumanoidBone::RightHip => "RightHip",
            HumanoidBone::RightLeg => "RightLeg",
            HumanoidBone::RightFoot => "RightFoot",
        }
    }

    /// Returns the parent bone in the humanoid rig.
    pub fn parent(self) -> Option<HumanoidBone> {
        use HumanoidBone::*;
        match self {
            Root => None,
            Spine | LeftHip | RightHip => Some(Root),
            Neck | LeftShoulder | RightShoulder => Some(Spine),
            Head => Some(Neck),
            LeftArm => Some(LeftShoulder),
            LeftHand => Some(LeftArm),
            RightArm => Some(RightShoulder),
            RightHand => Some(RightArm),
            LeftLeg => Some(LeftHip),
            LeftFoot => Some(LeftLeg),
            RightLeg => Some(RightHip),
            RightFoot => Some(RightLeg),
        }
    }

    /// Rest offset from the parent, in voxel units.
    pub fn rest_offset(self) -> Vec3 {
        use HumanoidBone::*;
        match self {
            Root => Vec3::ZERO,
            Spine => Vec3::new(0.0, 2.0, 0.0),
            Neck => Vec3::new(0.0, 4.0, 0.0),
            Head => Vec3::new(0.0, 1.0, 0.0),
            LeftShoulder => Vec3::new(-1.0, 3.5, 0.0),
            LeftArm | LeftHand => Vec3::new(-1.5, 0.0, 0.0),
            RightShoulder => Vec3::new(1.0, 3.5, 0.0),
            RightArm | RightHand => Vec3::new(1.5, 0.0, 0.0),
            LeftHip => Vec3::new(-0.5, 0.0, 0.0),
            RightHip => Vec3::new(0.5, 0.0, 0.0),
            LeftLeg | LeftFoot | RightLeg | RightFoot => Vec3::new(0.0, -2.0, 0.0),
        }
    }
}

impl From<HumanoidBone> for BoneId {
    fn from(bone: HumanoidBone) -> Self {
        bone.id()
    }
}

/// A skeleton (hierarchy of bones).
///
/// Bones can only be parented to bones added before them, so the hierarchy is
/// always an acyclic forest.
#[derive(Debug, Clone, Default)]
pub struct Skeleton {
    bones: Vec<Bone>,
    /// Pre-order traversal from every root, children in index order.
    traversal: Vec<BoneId>,
}

impl Skeleton {
    /// Creates an empty skeleton.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the 16-bone humanoid rig with transforms already computed.
    pub fn humanoid() -> Self {
        let mut skeleton = Self::new();
        for bone in HumanoidBone::ALL {
            let mut record = Bone::new(bone.name()).with_position(bone.rest_offset());
            record.parent = bone.parent().map(HumanoidBone::id);
            skeleton.push(record);
        }
        skeleton.update_transforms();
        skeleton
    }

    /// Adds a bone to the skeleton.
    ///
    /// Fails if the bone names a parent that does not exist yet.
    pub fn add_bone(&mut self, bone: Bone) -> Result<BoneId, SkeletonError> {
        if let Some(parent) = bone.parent {
            if parent.index() >= self.bones.len() {
                return Err(SkeletonError::MissingParent {
                    parent: parent.0,
                    bone_count: self.bones.len(),
                });
            }
        }
        let id = self.push(bone);
        self.update_transforms();
        Ok(id)
    }

    fn push(&mut self, bone: Bone) -> BoneId {
        let id = BoneId(self.bones.len() as u32);
        self.bones.push(bone);
        self.rebuild_traversal();
        id
    }

    fn rebuild_traversal(&mut self) {
        fn visit(bones: &[Bone], id: BoneId, out: &mut Vec<BoneId>) {
            out.push(id);
            for (i, bone) in bones.iter().enumerate() {
                if bone.parent == Some(id) {
                    visit(bones, BoneId(i as u32), out);
                }
            }
        }

        let mut order = Vec::with_capacity(self.bones.len());
        for root in self.root_bones() {
            visit(&self.bones, root, &mut order);
        }
        self.traversal = order;
    }

    /// Returns the number of bones.
    pub fn bone_count(&self) -> usize {
        self.bones.len()
    }

    /// Returns true if the skeleton has no bones.
    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    /// Returns a bone by ID.
    pub fn bone(&self, id: BoneId) -> Option<&Bone> {
        self.bones.get(id.index())
    }

    /// Returns a mutable bone by ID.
    ///
    /// Changes are not reflected in the cached matrices until
    /// [`update_transforms`](Self::update_transforms) runs.
    pub fn bone_mut(&mut self, id: BoneId) -> Option<&mut Bone> {
        self.bones.get_mut(id.index())
    }

    /// Returns all bones.
    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    /// Finds a bone by name.
    pub fn find_bone(&self, name: &str) -> Option<BoneId> {
        self.bones
            .iter()
            .position(|b| b.name == name)
            .map(|i| BoneId(i as u32))
    }

    /// Returns root bones (bones without parents).
    pub fn root_bones(&self) -> Vec<BoneId> {
        self.bones
            .iter()
            .enumerate()
            .filter(|(_, b)| b.parent.is_none())
            .map(|(i, _)| BoneId(i as u32))
            .collect()
    }

    /// Returns children of a bone.
    pub fn children(&self, parent: BoneId) -> Vec<BoneId> {
        self.bones
            .iter()
            .enumerate()
            .filter(|(_, b)| b.parent == Some(parent))
            .map(|(i, _)| BoneId(i as u32))
            .collect()
    }

    /// Returns the bone order used by [`update_transforms`](Self::update_transforms).
    pub fn traversal(&self) -> &[BoneId] {
        &self.traversal
    }

    /// Recomputes every bone's local and global matrix.
    ///
    /// Parents are always visited before their children, so each global
    /// matrix is `parent.global * local`. Cost is linear in the bone count.
    pub fn update_transforms(&mut self) {
        for &id in &self.traversal {
            let index = id.index();
            let local = self.bones[index].local_trs().to_matrix();
            let global = match self.bones[index].parent {
                Some(parent) => self.bones[parent.index()].global_transform * local,
                None => local,
            };
            let bone = &mut self.bones[index];
            bone.local_transform = local;
            bone.global_transform = global;
        }
    }

    /// Sets a bone's local rotation and recomputes the tree.
    ///
    /// Returns false (and changes nothing) if the bone does not exist.
    pub fn set_local_rotation(&mut self, id: BoneId, rotation: Vec3) -> bool {
        match self.bones.get_mut(id.index()) {
            Some(bone) => {
                bone.local_rotation = rotation;
                self.update_transforms();
                true
            }
            None => false,
        }
    }

    /// Returns the cached model-space matrix for a bone.
    pub fn global_transform(&self, id: BoneId) -> Option<Mat4> {
        self.bone(id).map(Bone::global_transform)
    }

    /// Zeroes every local rotation (bind pose) and recomputes the tree.
    pub fn reset_pose(&mut self) {
        for bone in &mut self.bones {
            bone.local_rotation = Vec3::ZERO;
        }
        self.update_transforms();
    }
}
