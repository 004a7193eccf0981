use log::debug;
use nalgebra::{Matrix4, Vector2, Vector3};

use super::compound::{assemble, assemble_compound};
use crate::{
    collider::ColliderRef,
    components::{
        GraphicalSmoothing, InterpolationBuffer, LocalTransform, MotionType, PhysicsDamping,
        PhysicsVelocity, PlanarBody, PostProcessData, TransformOverride,
    },
    constants::PLANAR_WORLD_INDEX,
    layers::LayerCollisionMatrix,
    mass::{BodyMassProperties, PhysicsMass},
    math::has_non_identity_scale,
    shape::{BodySnapshot, TransformSnapshot},
};

/// Authored body type.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum BodyType {
    #[default]
    Dynamic,
    Kinematic,
    Static,
}

/// Render-time smoothing requested for a body.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Interpolation {
    #[default]
    None,
    /// Smooth between the previous and current simulated pose.
    Interpolate,
    /// Predict forward from the current pose and velocity.
    Extrapolate,
}

/// Authoring record of a 2D rigid body.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RigidBodyAuthoring {
    pub is_kinematic: bool,
    pub mass: f32,
    /// Explicit center of mass in the body's XY plane. `None` derives it from geometry.
    pub center_of_mass: Option<Vector2<f32>>,
    pub drag: f32,
    pub angular_drag: f32,
    pub gravity_scale: f32,
    pub interpolation: Interpolation,
    pub body_type: BodyType,
}

impl Default for RigidBodyAuthoring {
    fn default() -> Self {
        Self {
            is_kinematic: false,
            mass: 1.0,
            center_of_mass: None,
            drag: 0.0,
            angular_drag: 0.05,
            gravity_scale: 1.0,
            interpolation: Interpolation::None,
            body_type: BodyType::Dynamic,
        }
    }
}

/// Scene-level inputs shared by every body in one bake.
#[derive(Copy, Clone, Debug)]
pub struct BakeContext<'a> {
    pub layers: &'a LayerCollisionMatrix,
    /// The scene marks the object static (its transform is pre-baked and never moves).
    pub is_static: bool,
    pub world_index: u32,
}

impl<'a> BakeContext<'a> {
    pub fn new(layers: &'a LayerCollisionMatrix) -> Self {
        Self {
            layers,
            is_static: false,
            world_index: PLANAR_WORLD_INDEX,
        }
    }

    pub fn with_static(mut self, is_static: bool) -> Self {
        self.is_static = is_static;
        self
    }
}

/// Where a standalone collider sits relative to other physics objects.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ColliderOwnership {
    /// The collider's object (or an ancestor) carries a rigid body.
    pub attached_body: bool,
    /// An ancestor object carries a collider of its own.
    pub ancestor_collider: bool,
}

pub fn resolve_motion_type(authoring: &RigidBodyAuthoring, scene_static: bool) -> MotionType {
    if scene_static || authoring.body_type == BodyType::Static {
        MotionType::Static
    } else if authoring.is_kinematic || authoring.body_type == BodyType::Kinematic {
        MotionType::Kinematic
    } else {
        MotionType::Dynamic
    }
}

/// Mass descriptor from the body's collider, or the unit sphere when it has none.
///
/// Only dynamic bodies get finite mass; kinematic and static bodies are infinite-mass.
pub fn resolve_mass(
    collider: Option<&ColliderRef>,
    motion_type: MotionType,
    authoring: &RigidBodyAuthoring,
) -> PhysicsMass {
    let props = collider.map_or_else(BodyMassProperties::unit_sphere, |c| c.mass_properties());

    let mass = match motion_type {
        MotionType::Dynamic => PhysicsMass::dynamic(&props, authoring.mass),
        MotionType::Kinematic | MotionType::Static => PhysicsMass::kinematic(&props),
    };

    match authoring.center_of_mass {
        Some(com) => mass.with_center_of_mass(Vector3::new(com.x, com.y, 0.0)),
        None => mass,
    }
}

/// Does the body need an explicit world matrix instead of inheriting its parent's?
pub fn needs_unparent(
    transform: &TransformSnapshot,
    motion_type: MotionType,
    scene_static: bool,
) -> bool {
    motion_type != MotionType::Static
        || has_non_identity_scale(&transform.lossy_scale)
        || !transform.has_parent
        || scene_static
}

/// Physics transform and optional world-transform override for a body.
///
/// Unparented bodies get their rigid world pose with unit scale; any scale moves to a
/// separate post-transform matrix. Parented bodies keep their local pose.
pub fn normalize_world_transform(
    transform: &TransformSnapshot,
    motion_type: MotionType,
    scene_static: bool,
) -> (LocalTransform, Option<TransformOverride>) {
    if !needs_unparent(transform, motion_type, scene_static) {
        return (
            LocalTransform::from_position_rotation(
                transform.local_position,
                transform.local_rotation,
            ),
            None,
        );
    }

    // Gated on world scale; the matrix itself carries the local scale.
    let post_transform_scale = has_non_identity_scale(&transform.lossy_scale)
        .then(|| Matrix4::new_nonuniform_scaling(&transform.local_scale));

    let overridden = TransformOverride {
        local_to_world: transform.local_to_world,
        post_transform_scale,
        post_process: PostProcessData {
            local_to_world: transform.local_to_world,
            lossy_scale: transform.lossy_scale,
        },
    };

    (
        LocalTransform::from_isometry(&transform.rigid()),
        Some(overridden),
    )
}

/// Bake a 2D rigid body and its shapes into a planar body.
pub fn bake_rigid_body(
    authoring: &RigidBodyAuthoring,
    body: &BodySnapshot,
    ctx: &BakeContext<'_>,
) -> PlanarBody {
    let motion_type = resolve_motion_type(authoring, ctx.is_static);
    let (transform, transform_override) =
        normalize_world_transform(&body.transform, motion_type, ctx.is_static);
    if transform_override.is_some() {
        debug!("{:?}: unparented with explicit world transform", body.entity);
    }

    let mut baked = PlanarBody::new(body.entity, motion_type, transform);
    baked.world_index = ctx.world_index;
    baked.world_pose = body.transform.rigid();
    baked.transform_override = transform_override;

    let collider = assemble(body, ctx.layers);
    baked.mass = Some(resolve_mass(collider.as_ref(), motion_type, authoring));
    baked.collider = collider;

    if motion_type == MotionType::Static {
        return baked;
    }

    if authoring.interpolation != Interpolation::None {
        baked.smoothing = Some(GraphicalSmoothing);

        if authoring.interpolation == Interpolation::Interpolate {
            baked.interpolation = Some(InterpolationBuffer {
                previous_transform: body.transform.rigid(),
                previous_velocity: PhysicsVelocity::default(),
            });
        }
    }

    baked.velocity = Some(PhysicsVelocity::default());
    baked.gravity_factor = Some(authoring.gravity_scale);

    if motion_type == MotionType::Dynamic {
        baked.damping = Some(PhysicsDamping {
            linear: authoring.drag,
            angular: authoring.angular_drag,
        });
    }

    baked
}

/// Bake a collider object that has no rigid body of its own into a static body.
///
/// Returns `None` when the collider belongs to a rigid body or sits under another
/// collider: those are baked as part of the owning ancestor instead.
pub fn bake_static_collider(
    body: &BodySnapshot,
    ownership: ColliderOwnership,
    ctx: &BakeContext<'_>,
) -> Option<PlanarBody> {
    if ownership.attached_body || ownership.ancestor_collider {
        debug!("{:?}: collider baked by its ancestor, skipping", body.entity);
        return None;
    }

    let mut baked = PlanarBody::new(
        body.entity,
        MotionType::Static,
        LocalTransform::from_isometry(&body.transform.rigid()),
    );
    baked.world_index = ctx.world_index;
    baked.collider = assemble_compound(body, ctx.layers);
    Some(baked)
}
