//! 2D authoring records and the read-only hierarchy snapshot handed to baking.
//!
//! Baking never walks a live scene graph. The host flattens a body and all of its
//! descendant shapes into a [`BodySnapshot`] (shape records plus precomputed world
//! matrices) and baking only reads that snapshot.

use nalgebra::{Isometry3, Matrix4, UnitQuaternion, Vector2, Vector3};

use crate::{
    components::Entity,
    layers::Layer,
    math::{decompose_rigid, trs_matrix},
};

/// Long axis of a 2D capsule.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum CapsuleDirection {
    #[default]
    Vertical,
    Horizontal,
}

/// Geometry of a 2D shape as authored.
///
/// Only `Circle`, `Box` and `Capsule` can be synthesized into 3D geometry; the other
/// kinds exist in authoring data but are declined by synthesis with a warning.
#[derive(Clone, Debug, PartialEq)]
pub enum ShapeKind {
    Circle {
        radius: f32,
    },
    Box {
        /// Full width and height (meters).
        size: Vector2<f32>,
    },
    Capsule {
        /// Full width and height of the capsule's bounding box (meters).
        size: Vector2<f32>,
        direction: CapsuleDirection,
    },
    Polygon {
        points: Vec<Vector2<f32>>,
    },
    Edge {
        points: Vec<Vector2<f32>>,
    },
}

impl ShapeKind {
    /// Human-readable kind name used in diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            ShapeKind::Circle { .. } => "Circle",
            ShapeKind::Box { .. } => "Box",
            ShapeKind::Capsule { .. } => "Capsule",
            ShapeKind::Polygon { .. } => "Polygon",
            ShapeKind::Edge { .. } => "Edge",
        }
    }
}

/// One authored 2D collision shape.
#[derive(Clone, Debug, PartialEq)]
pub struct ShapeAuthoring {
    pub kind: ShapeKind,
    /// Offset of the shape from its object's origin, in the object's local XY plane.
    pub offset: Vector2<f32>,
    pub layer: Layer,
    pub is_trigger: bool,
    pub friction: f32,
    pub restitution: f32,
    /// Disabled shapes are skipped entirely by baking.
    pub enabled: bool,
}

impl ShapeAuthoring {
    pub fn new(kind: ShapeKind) -> Self {
        Self {
            kind,
            offset: Vector2::zeros(),
            layer: 0,
            is_trigger: false,
            friction: 0.4,
            restitution: 0.0,
            enabled: true,
        }
    }

    pub fn circle(radius: f32) -> Self {
        Self::new(ShapeKind::Circle { radius })
    }

    pub fn rect(width: f32, height: f32) -> Self {
        Self::new(ShapeKind::Box {
            size: Vector2::new(width, height),
        })
    }

    pub fn capsule(width: f32, height: f32, direction: CapsuleDirection) -> Self {
        Self::new(ShapeKind::Capsule {
            size: Vector2::new(width, height),
            direction,
        })
    }

    pub fn with_offset(mut self, x: f32, y: f32) -> Self {
        self.offset = Vector2::new(x, y);
        self
    }

    pub fn with_layer(mut self, layer: Layer) -> Self {
        self.layer = layer;
        self
    }

    pub fn with_trigger(mut self, is_trigger: bool) -> Self {
        self.is_trigger = is_trigger;
        self
    }

    pub fn with_material(mut self, friction: f32, restitution: f32) -> Self {
        self.friction = friction;
        self.restitution = restitution;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// Frozen transform state of one scene object.
#[derive(Clone, Debug, PartialEq)]
pub struct TransformSnapshot {
    pub local_to_world: Matrix4<f32>,
    pub local_position: Vector3<f32>,
    pub local_rotation: UnitQuaternion<f32>,
    pub local_scale: Vector3<f32>,
    /// Accumulated world scale. Exact only when no ancestor is rotated relative to a
    /// non-uniformly scaled parent; otherwise an approximation, like any lossy scale.
    pub lossy_scale: Vector3<f32>,
    pub has_parent: bool,
}

impl TransformSnapshot {
    /// A parentless object at `position`/`rotation` with `scale`.
    pub fn root(
        position: Vector3<f32>,
        rotation: UnitQuaternion<f32>,
        scale: Vector3<f32>,
    ) -> Self {
        Self {
            local_to_world: trs_matrix(&position, &rotation, &scale),
            local_position: position,
            local_rotation: rotation,
            local_scale: scale,
            lossy_scale: scale,
            has_parent: false,
        }
    }

    /// A parentless object with identity rotation and unit scale.
    pub fn at(position: Vector3<f32>) -> Self {
        Self::root(position, UnitQuaternion::identity(), Vector3::repeat(1.0))
    }

    /// An object parented to `self` with the given local pose.
    pub fn child(
        &self,
        position: Vector3<f32>,
        rotation: UnitQuaternion<f32>,
        scale: Vector3<f32>,
    ) -> Self {
        Self {
            local_to_world: self.local_to_world * trs_matrix(&position, &rotation, &scale),
            local_position: position,
            local_rotation: rotation,
            local_scale: scale,
            lossy_scale: self.lossy_scale.component_mul(&scale),
            has_parent: true,
        }
    }

    /// World-space position of the object's origin.
    #[inline]
    pub fn world_position(&self) -> Vector3<f32> {
        Vector3::new(
            self.local_to_world[(0, 3)],
            self.local_to_world[(1, 3)],
            self.local_to_world[(2, 3)],
        )
    }

    /// World pose with scale/shear removed.
    #[inline]
    pub fn rigid(&self) -> Isometry3<f32> {
        decompose_rigid(&self.local_to_world)
    }
}

/// A shape found on a body root or one of its descendants.
#[derive(Clone, Debug, PartialEq)]
pub struct ShapeSnapshot {
    /// Scene object that owns the shape.
    pub entity: Entity,
    /// True if the shape sits on the body root itself rather than a descendant.
    pub on_root: bool,
    pub transform: TransformSnapshot,
    pub shape: ShapeAuthoring,
}

/// A body root and the flat list of shapes under it, in scene order.
#[derive(Clone, Debug, PartialEq)]
pub struct BodySnapshot {
    pub entity: Entity,
    pub transform: TransformSnapshot,
    pub shapes: Vec<ShapeSnapshot>,
}

impl BodySnapshot {
    pub fn new(entity: Entity, transform: TransformSnapshot) -> Self {
        Self {
            entity,
            transform,
            shapes: Vec::new(),
        }
    }

    /// Add a shape that lives on the root object itself.
    pub fn with_root_shape(mut self, shape: ShapeAuthoring) -> Self {
        self.shapes.push(ShapeSnapshot {
            entity: self.entity,
            on_root: true,
            transform: self.transform.clone(),
            shape,
        });
        self
    }

    /// Add a shape that lives on a descendant object.
    pub fn with_child_shape(
        mut self,
        entity: Entity,
        transform: TransformSnapshot,
        shape: ShapeAuthoring,
    ) -> Self {
        self.shapes.push(ShapeSnapshot {
            entity,
            on_root: false,
            transform,
            shape,
        });
        self
    }

    /// Shapes that participate in baking.
    pub fn enabled_shapes(&self) -> impl Iterator<Item = &ShapeSnapshot> {
        self.shapes.iter().filter(|s| s.shape.enabled)
    }
}
