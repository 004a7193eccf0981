//! Plain-data components of a baked planar body.
//!
//! Each field of [`PlanarBody`] corresponds to one component kind a host ECS would store.
//! Optional fields are components that are only attached for some motion types.

use nalgebra::{Isometry3, Matrix4, Translation3, UnitQuaternion, Vector3};

use crate::{collider::ColliderRef, constants::PLANAR_WORLD_INDEX, mass::PhysicsMass};

/// Opaque handle of a scene object.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Entity(pub u32);

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MotionType {
    /// Never moves.
    Static,
    /// Moves by velocity only; infinite mass, unaffected by forces.
    Kinematic,
    /// Fully simulated.
    Dynamic,
}

/// Position, rotation and uniform scale of a body.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LocalTransform {
    pub position: Vector3<f32>,
    pub rotation: UnitQuaternion<f32>,
    pub scale: f32,
}

impl LocalTransform {
    pub fn from_position_rotation(position: Vector3<f32>, rotation: UnitQuaternion<f32>) -> Self {
        Self {
            position,
            rotation,
            scale: 1.0,
        }
    }

    pub fn from_isometry(iso: &Isometry3<f32>) -> Self {
        Self::from_position_rotation(iso.translation.vector, iso.rotation)
    }

    #[inline]
    pub fn isometry(&self) -> Isometry3<f32> {
        Isometry3::from_parts(Translation3::from(self.position), self.rotation)
    }
}

impl Default for LocalTransform {
    fn default() -> Self {
        Self::from_position_rotation(Vector3::zeros(), UnitQuaternion::identity())
    }
}

/// Linear (m/s) and angular (rad/s) velocity.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct PhysicsVelocity {
    pub linear: Vector3<f32>,
    pub angular: Vector3<f32>,
}

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct PhysicsDamping {
    pub linear: f32,
    pub angular: f32,
}

/// Out-of-plane pose captured before the solve and consumed after it.
///
/// Only meaningful between the flatten and restore passes of a single step.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PlanarCache {
    pub position_z: f32,
    pub rotation: UnitQuaternion<f32>,
}

impl Default for PlanarCache {
    fn default() -> Self {
        Self {
            position_z: 0.0,
            rotation: UnitQuaternion::identity(),
        }
    }
}

/// Marks a body for render-time smoothing by the host.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct GraphicalSmoothing;

/// Previous pose a renderer interpolates from.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct InterpolationBuffer {
    pub previous_transform: Isometry3<f32>,
    pub previous_velocity: PhysicsVelocity,
}

/// Data a host needs to re-derive the world transform of an unparented body.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PostProcessData {
    pub local_to_world: Matrix4<f32>,
    pub lossy_scale: Vector3<f32>,
}

/// Explicit world transform for a body detached from its parent hierarchy.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TransformOverride {
    pub local_to_world: Matrix4<f32>,
    /// Scale applied after the physics transform, so the physics transform never
    /// carries scale itself. Present only for non-identity scale.
    pub post_transform_scale: Option<Matrix4<f32>>,
    pub post_process: PostProcessData,
}

/// A baked, plane-confined rigid body.
#[derive(Clone, Debug)]
pub struct PlanarBody {
    pub entity: Entity,
    /// Plane-confinement tag. The constraint passes only touch bodies with this set.
    pub confined: bool,
    pub motion_type: MotionType,
    pub cache: PlanarCache,
    pub transform: LocalTransform,
    /// Rigid world pose at bake time. Differs from `transform` only for parented
    /// static bodies, which keep their local pose.
    pub world_pose: Isometry3<f32>,
    pub collider: Option<ColliderRef>,
    pub mass: Option<PhysicsMass>,
    pub velocity: Option<PhysicsVelocity>,
    pub damping: Option<PhysicsDamping>,
    pub gravity_factor: Option<f32>,
    pub smoothing: Option<GraphicalSmoothing>,
    pub interpolation: Option<InterpolationBuffer>,
    pub transform_override: Option<TransformOverride>,
    pub world_index: u32,
}

impl PlanarBody {
    /// A confined body with only its transform set.
    pub fn new(entity: Entity, motion_type: MotionType, transform: LocalTransform) -> Self {
        Self {
            entity,
            confined: true,
            motion_type,
            cache: PlanarCache::default(),
            transform,
            world_pose: transform.isometry(),
            collider: None,
            mass: None,
            velocity: None,
            damping: None,
            gravity_factor: None,
            smoothing: None,
            interpolation: None,
            transform_override: None,
            world_index: PLANAR_WORLD_INDEX,
        }
    }

    #[inline]
    pub fn is_static(&self) -> bool {
        self.motion_type == MotionType::Static
    }
}
