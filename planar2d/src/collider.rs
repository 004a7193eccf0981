//! Immutable, reference-counted collider blobs produced by baking.
//!
//! A blob is either a single convex primitive (geometry + material + filter) or a
//! compound of child instances, each carrying its own collider reference and a rigid
//! "compound-from-child" transform. Blobs are never mutated after creation: re-baking
//! produces a new `Arc`.

use std::sync::Arc;

use nalgebra::{Isometry3, Point3, Translation3, UnitQuaternion, Vector3};
use num_traits::Zero;
use rapier3d::prelude::{
    ActiveEvents, Collider, ColliderBuilder, CoefficientCombineRule, Group, InteractionGroups,
    MassProperties, SharedShape,
};

use crate::{components::Entity, mass::BodyMassProperties};

/// Shared handle to an immutable collider blob.
pub type ColliderRef = Arc<ColliderBlob>;

/// How contacts involving a collider are resolved.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum CollisionResponse {
    /// Regular solid contact.
    #[default]
    Collide,
    /// No physical response; overlaps only raise trigger events.
    RaiseTriggerEvents,
}

/// Surface material of a collider.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Material {
    pub collision_response: CollisionResponse,
    pub friction: f32,
    pub restitution: f32,
    pub friction_combine: CoefficientCombineRule,
    pub restitution_combine: CoefficientCombineRule,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            collision_response: CollisionResponse::Collide,
            friction: 0.5,
            restitution: 0.0,
            friction_combine: CoefficientCombineRule::Average,
            restitution_combine: CoefficientCombineRule::Average,
        }
    }
}

/// Layer membership and filter bitmasks.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CollisionFilter {
    pub belongs_to: u32,
    pub collides_with: u32,
}

impl CollisionFilter {
    pub const DEFAULT: Self = Self {
        belongs_to: u32::MAX,
        collides_with: u32::MAX,
    };

    /// Two filters interact only if each one's membership passes the other's filter.
    #[inline]
    pub fn can_collide(&self, other: &CollisionFilter) -> bool {
        self.belongs_to & other.collides_with != 0 && other.belongs_to & self.collides_with != 0
    }

    pub fn interaction_groups(&self) -> InteractionGroups {
        InteractionGroups::all()
            .with_memberships(Group::from_bits_truncate(self.belongs_to))
            .with_filter(Group::from_bits_truncate(self.collides_with))
    }
}

impl Default for CollisionFilter {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// 3D primitive geometry, expressed in the collider's own frame.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum ColliderGeometry {
    Sphere {
        center: Point3<f32>,
        radius: f32,
    },
    Box {
        center: Point3<f32>,
        /// Full extents along X, Y, Z.
        size: Vector3<f32>,
        orientation: UnitQuaternion<f32>,
        bevel_radius: f32,
    },
    Capsule {
        vertex0: Point3<f32>,
        vertex1: Point3<f32>,
        radius: f32,
    },
}

impl ColliderGeometry {
    /// Rapier shape plus the pose of that shape in the collider frame.
    pub fn shape(&self) -> (Isometry3<f32>, SharedShape) {
        match *self {
            ColliderGeometry::Sphere { center, radius } => (
                Isometry3::from_parts(Translation3::from(center.coords), UnitQuaternion::identity()),
                SharedShape::ball(radius.abs()),
            ),
            ColliderGeometry::Box {
                center,
                size,
                orientation,
                bevel_radius,
            } => {
                let pose = Isometry3::from_parts(Translation3::from(center.coords), orientation);
                let half = size.abs() * 0.5;
                let shape = if bevel_radius > 0.0 {
                    let inner = half.map(|h| (h - bevel_radius).max(0.0));
                    SharedShape::round_cuboid(inner.x, inner.y, inner.z, bevel_radius)
                } else {
                    SharedShape::cuboid(half.x, half.y, half.z)
                };
                (pose, shape)
            }
            ColliderGeometry::Capsule {
                vertex0,
                vertex1,
                radius,
            } => (
                Isometry3::identity(),
                SharedShape::capsule(vertex0, vertex1, radius.abs()),
            ),
        }
    }
}

/// A single primitive collider.
#[derive(Clone, Debug, PartialEq)]
pub struct ConvexCollider {
    pub geometry: ColliderGeometry,
    pub material: Material,
    pub filter: CollisionFilter,
}

/// One child of a compound collider.
#[derive(Clone, Debug, PartialEq)]
pub struct ChildCollider {
    pub collider: ColliderRef,
    /// Rigid transform from the child's frame into the compound (body) frame.
    pub compound_from_child: Isometry3<f32>,
    /// Scene object the child geometry was authored on. Bookkeeping only.
    pub entity: Entity,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ColliderBlob {
    Convex(ConvexCollider),
    Compound(Vec<ChildCollider>),
}

impl ColliderBlob {
    pub fn convex(geometry: ColliderGeometry, material: Material, filter: CollisionFilter) -> ColliderRef {
        Arc::new(ColliderBlob::Convex(ConvexCollider {
            geometry,
            material,
            filter,
        }))
    }

    pub fn compound(children: Vec<ChildCollider>) -> ColliderRef {
        Arc::new(ColliderBlob::Compound(children))
    }

    #[inline]
    pub fn is_compound(&self) -> bool {
        matches!(self, ColliderBlob::Compound(_))
    }

    /// Compound children, or an empty slice for a convex blob.
    pub fn children(&self) -> &[ChildCollider] {
        match self {
            ColliderBlob::Convex(_) => &[],
            ColliderBlob::Compound(children) => children,
        }
    }

    /// Every primitive in the blob with its pose in the blob's root frame.
    pub fn leaves(&self) -> Vec<(Isometry3<f32>, &ConvexCollider)> {
        let mut out = Vec::new();
        self.collect_leaves(Isometry3::identity(), &mut out);
        out
    }

    fn collect_leaves<'a>(
        &'a self,
        parent: Isometry3<f32>,
        out: &mut Vec<(Isometry3<f32>, &'a ConvexCollider)>,
    ) {
        match self {
            ColliderBlob::Convex(convex) => out.push((parent, convex)),
            ColliderBlob::Compound(children) => {
                for child in children {
                    child
                        .collider
                        .collect_leaves(parent * child.compound_from_child, out);
                }
            }
        }
    }

    /// Aggregate unit-mass distribution of every primitive in the blob.
    pub fn mass_properties(&self) -> BodyMassProperties {
        let total = self
            .leaves()
            .into_iter()
            .map(|(pose, leaf)| {
                let (local, shape) = leaf.geometry.shape();
                shape.mass_properties(1.0).transform_by(&(pose * local))
            })
            .fold(MassProperties::zero(), |acc, props| acc + props);

        BodyMassProperties::from_unit_density(&total)
    }

    /// One rapier collider per primitive, positioned relative to the owning body.
    ///
    /// Colliders are given zero density: the baked [`crate::PhysicsMass`] is applied to
    /// the body directly so rapier does not add geometry mass on top of it.
    pub fn to_rapier_colliders(&self) -> Vec<Collider> {
        self.leaves()
            .into_iter()
            .map(|(pose, leaf)| {
                let (local, shape) = leaf.geometry.shape();
                let pose = pose * local;
                let mut builder = ColliderBuilder::new(shape)
                    .translation(pose.translation.vector)
                    .rotation(pose.rotation.scaled_axis())
                    .density(0.0)
                    .friction(leaf.material.friction)
                    .restitution(leaf.material.restitution)
                    .friction_combine_rule(leaf.material.friction_combine)
                    .restitution_combine_rule(leaf.material.restitution_combine)
                    .collision_groups(leaf.filter.interaction_groups());

                if leaf.material.collision_response == CollisionResponse::RaiseTriggerEvents {
                    builder = builder
                        .sensor(true)
                        .active_events(ActiveEvents::COLLISION_EVENTS);
                }
                builder.build()
            })
            .collect()
    }
}
