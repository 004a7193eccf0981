use log::warn;
use nalgebra::{Point3, UnitQuaternion, Vector2, Vector3};
use rapier3d::prelude::CoefficientCombineRule;
use thiserror::Error;

use crate::{
    collider::{
        ColliderBlob, ColliderGeometry, ColliderRef, CollisionFilter, CollisionResponse, Material,
    },
    constants::BOX_DEPTH,
    layers::{Layer, LayerCollisionMatrix},
    shape::{CapsuleDirection, ShapeAuthoring, ShapeKind, ShapeSnapshot},
};

/// Which transform scale is baked into synthesized geometry.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ScalingMode {
    /// Dimensions are used as authored.
    None,
    /// Dimensions are multiplied by the object's local scale.
    Local,
    /// Dimensions are multiplied by the object's accumulated world (lossy) scale.
    Global,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SynthesisError {
    #[error("collider type {kind} is not supported")]
    UnsupportedShape { kind: &'static str },
    #[error("collision layer {layer} is out of range")]
    LayerOutOfRange { layer: Layer },
}

/// Resolve the XY scale factors applied to a shape under `mode`.
pub fn resolve_scale(mode: ScalingMode, shape: &ShapeSnapshot) -> Vector2<f32> {
    match mode {
        ScalingMode::None => Vector2::new(1.0, 1.0),
        ScalingMode::Local => shape.transform.local_scale.xy(),
        ScalingMode::Global => shape.transform.lossy_scale.xy(),
    }
}

/// Material for a 2D shape. Both coefficients combine by arithmetic mean.
pub fn produce_material(shape: &ShapeAuthoring) -> Material {
    Material {
        collision_response: if shape.is_trigger {
            CollisionResponse::RaiseTriggerEvents
        } else {
            CollisionResponse::Collide
        },
        friction: shape.friction,
        restitution: shape.restitution,
        friction_combine: CoefficientCombineRule::Average,
        restitution_combine: CoefficientCombineRule::Average,
    }
}

/// Filter for a 2D shape: member of its own layer, colliding with every layer the
/// table does not ignore for it.
pub fn produce_filter(
    shape: &ShapeAuthoring,
    layers: &LayerCollisionMatrix,
) -> Result<CollisionFilter, SynthesisError> {
    if !LayerCollisionMatrix::is_valid_layer(shape.layer) {
        return Err(SynthesisError::LayerOutOfRange { layer: shape.layer });
    }

    Ok(CollisionFilter {
        belongs_to: 1 << shape.layer,
        collides_with: layers.collides_with_mask(shape.layer),
    })
}

/// Synthesize the 3D geometry for one 2D shape.
///
/// `z_offset` places the flattened geometry along the plane normal so several shapes
/// merged into one compound keep distinct depths.
pub fn synthesize_geometry(
    shape: &ShapeAuthoring,
    scale: Vector2<f32>,
    z_offset: f32,
) -> Result<ColliderGeometry, SynthesisError> {
    let center = Point3::new(shape.offset.x, shape.offset.y, z_offset);

    match &shape.kind {
        ShapeKind::Circle { radius } => Ok(ColliderGeometry::Sphere {
            center,
            // Max axis keeps the shape circular under anisotropic scale.
            radius: radius * scale.x.max(scale.y),
        }),

        ShapeKind::Box { size } => Ok(ColliderGeometry::Box {
            center,
            size: Vector3::new(size.x * scale.x, size.y * scale.y, BOX_DEPTH),
            orientation: UnitQuaternion::identity(),
            bevel_radius: 0.0,
        }),

        ShapeKind::Capsule { size, direction } => {
            let (axis, major, minor, major_scale, minor_scale) = match direction {
                CapsuleDirection::Vertical => (Vector3::y(), size.y, size.x, scale.y, scale.x),
                CapsuleDirection::Horizontal => (Vector3::x(), size.x, size.y, scale.x, scale.y),
            };

            // Straight segment between the cap centers; zero when the capsule is
            // shorter than it is wide.
            let half_segment = ((major - minor) * 0.5).max(0.0) * major_scale;

            Ok(ColliderGeometry::Capsule {
                vertex0: center - axis * half_segment,
                vertex1: center + axis * half_segment,
                radius: minor * 0.5 * minor_scale,
            })
        }

        other => Err(SynthesisError::UnsupportedShape { kind: other.name() }),
    }
}

/// Synthesize a complete collider blob (geometry, material, filter) for one shape.
pub fn synthesize(
    shape: &ShapeSnapshot,
    mode: ScalingMode,
    z_offset: f32,
    layers: &LayerCollisionMatrix,
) -> Result<ColliderRef, SynthesisError> {
    let geometry = synthesize_geometry(&shape.shape, resolve_scale(mode, shape), z_offset)?;
    let filter = produce_filter(&shape.shape, layers)?;

    Ok(ColliderBlob::convex(
        geometry,
        produce_material(&shape.shape),
        filter,
    ))
}

/// [`synthesize`], logging and discarding failures so callers can skip the shape.
pub fn try_synthesize(
    shape: &ShapeSnapshot,
    mode: ScalingMode,
    z_offset: f32,
    layers: &LayerCollisionMatrix,
) -> Option<ColliderRef> {
    synthesize(shape, mode, z_offset, layers)
        .inspect_err(|err| warn!("skipping shape on {:?}: {err}", shape.entity))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{components::Entity, shape::TransformSnapshot};
    use nalgebra::Vector3 as V3;

    fn snapshot(shape: ShapeAuthoring, local: V3<f32>, lossy: V3<f32>) -> ShapeSnapshot {
        let mut transform = TransformSnapshot::at(V3::zeros());
        transform.local_scale = local;
        transform.lossy_scale = lossy;
        ShapeSnapshot {
            entity: Entity(1),
            on_root: true,
            transform,
            shape,
        }
    }

    fn capsule_length(geometry: &ColliderGeometry) -> f32 {
        match geometry {
            ColliderGeometry::Capsule {
                vertex0, vertex1, ..
            } => (vertex1 - vertex0).norm(),
            other => panic!("expected capsule, got {other:?}"),
        }
    }

    #[test]
    fn circle_radius_scales_uniformly_in_every_mode() {
        let s = 2.5;
        let shape = snapshot(
            ShapeAuthoring::circle(0.75),
            V3::repeat(s),
            V3::repeat(s),
        );

        for mode in [ScalingMode::Local, ScalingMode::Global] {
            let geometry =
                synthesize_geometry(&shape.shape, resolve_scale(mode, &shape), 0.0).unwrap();
            match geometry {
                ColliderGeometry::Sphere { radius, .. } => {
                    assert!((radius - 0.75 * s).abs() < 1.0e-6)
                }
                other => panic!("expected sphere, got {other:?}"),
            }
        }

        let unscaled =
            synthesize_geometry(&shape.shape, resolve_scale(ScalingMode::None, &shape), 0.0)
                .unwrap();
        assert!(matches!(unscaled, ColliderGeometry::Sphere { radius, .. } if radius == 0.75));
    }

    #[test]
    fn circle_uses_max_axis_under_anisotropic_scale() {
        let geometry =
            synthesize_geometry(&ShapeAuthoring::circle(1.0), Vector2::new(0.5, 3.0), 0.0)
                .unwrap();
        assert!(matches!(geometry, ColliderGeometry::Sphere { radius, .. } if radius == 3.0));
    }

    #[test]
    fn circle_center_uses_offset_and_z_offset() {
        let shape = ShapeAuthoring::circle(1.0).with_offset(1.0, -2.0);
        let geometry = synthesize_geometry(&shape, Vector2::new(1.0, 1.0), 0.25).unwrap();
        assert!(matches!(
            geometry,
            ColliderGeometry::Sphere { center, .. } if center == Point3::new(1.0, -2.0, 0.25)
        ));
    }

    #[test]
    fn box_scales_per_axis_with_unit_depth() {
        let geometry = synthesize_geometry(
            &ShapeAuthoring::rect(2.0, 4.0).with_offset(0.5, 0.5),
            Vector2::new(3.0, 0.5),
            -1.0,
        )
        .unwrap();

        match geometry {
            ColliderGeometry::Box {
                center,
                size,
                orientation,
                bevel_radius,
            } => {
                assert_eq!(size, V3::new(6.0, 2.0, BOX_DEPTH));
                assert_eq!(center, Point3::new(0.5, 0.5, -1.0));
                assert_eq!(orientation, UnitQuaternion::identity());
                assert_eq!(bevel_radius, 0.0);
            }
            other => panic!("expected box, got {other:?}"),
        }
    }

    #[test]
    fn capsule_length_is_major_minus_minor_times_scale() {
        let scale = Vector2::new(2.0, 3.0);

        let vertical = synthesize_geometry(
            &ShapeAuthoring::capsule(1.0, 4.0, CapsuleDirection::Vertical),
            scale,
            0.0,
        )
        .unwrap();
        assert!((capsule_length(&vertical) - (4.0 - 1.0) * 3.0).abs() < 1.0e-5);

        let horizontal = synthesize_geometry(
            &ShapeAuthoring::capsule(4.0, 1.0, CapsuleDirection::Horizontal),
            scale,
            0.0,
        )
        .unwrap();
        assert!((capsule_length(&horizontal) - (4.0 - 1.0) * 2.0).abs() < 1.0e-5);
    }

    #[test]
    fn capsule_radius_uses_minor_axis_scale() {
        let geometry = synthesize_geometry(
            &ShapeAuthoring::capsule(1.0, 4.0, CapsuleDirection::Vertical),
            Vector2::new(2.0, 3.0),
            0.0,
        )
        .unwrap();
        assert!(matches!(geometry, ColliderGeometry::Capsule { radius, .. } if radius == 1.0));
    }

    #[test]
    fn squat_capsule_collapses_to_a_point_segment() {
        for direction in [CapsuleDirection::Vertical, CapsuleDirection::Horizontal] {
            let geometry = synthesize_geometry(
                &ShapeAuthoring::capsule(3.0, 3.0, direction).with_offset(0.5, 0.0),
                Vector2::new(1.0, 1.0),
                0.0,
            )
            .unwrap();
            assert_eq!(capsule_length(&geometry), 0.0);
        }

        // Major axis shorter than the minor axis clamps instead of inverting.
        for (direction, width, height) in [
            (CapsuleDirection::Vertical, 5.0, 1.0),
            (CapsuleDirection::Horizontal, 1.0, 5.0),
        ] {
            let geometry = synthesize_geometry(
                &ShapeAuthoring::capsule(width, height, direction),
                Vector2::new(1.0, 1.0),
                0.0,
            )
            .unwrap();
            assert_eq!(capsule_length(&geometry), 0.0);
        }
    }

    #[test]
    fn horizontal_capsule_endpoints_are_symmetric_about_offset() {
        // Offset is applied after scaling, on both endpoints.
        let geometry = synthesize_geometry(
            &ShapeAuthoring::capsule(4.0, 2.0, CapsuleDirection::Horizontal)
                .with_offset(1.0, 0.5),
            Vector2::new(2.0, 1.0),
            0.0,
        )
        .unwrap();

        match geometry {
            ColliderGeometry::Capsule {
                vertex0, vertex1, ..
            } => {
                assert_eq!(vertex0, Point3::new(-1.0, 0.5, 0.0));
                assert_eq!(vertex1, Point3::new(3.0, 0.5, 0.0));
                assert!(((vertex0.x + vertex1.x) * 0.5 - 1.0).abs() < 1.0e-6);
            }
            other => panic!("expected capsule, got {other:?}"),
        }
    }

    #[test]
    fn unsupported_shapes_are_typed_failures() {
        let polygon = ShapeAuthoring::new(ShapeKind::Polygon {
            points: vec![Vector2::zeros(); 3],
        });
        assert_eq!(
            synthesize_geometry(&polygon, Vector2::new(1.0, 1.0), 0.0),
            Err(SynthesisError::UnsupportedShape { kind: "Polygon" })
        );

        let shape = snapshot(polygon, V3::repeat(1.0), V3::repeat(1.0));
        assert!(try_synthesize(&shape, ScalingMode::Local, 0.0, &LayerCollisionMatrix::new()).is_none());
    }

    #[test]
    fn trigger_raises_events_and_keeps_coefficients() {
        let material = produce_material(
            &ShapeAuthoring::circle(1.0)
                .with_trigger(true)
                .with_material(0.8, 0.3),
        );
        assert_eq!(
            material.collision_response,
            CollisionResponse::RaiseTriggerEvents
        );
        assert_eq!(material.friction, 0.8);
        assert_eq!(material.restitution, 0.3);
        assert_eq!(material.friction_combine, CoefficientCombineRule::Average);
        assert_eq!(material.restitution_combine, CoefficientCombineRule::Average);

        let solid = produce_material(&ShapeAuthoring::circle(1.0));
        assert_eq!(solid.collision_response, CollisionResponse::Collide);
    }

    #[test]
    fn filter_belongs_to_own_layer_and_respects_ignores() {
        let layers = LayerCollisionMatrix::new().with_ignored(4, 9);
        let filter = produce_filter(&ShapeAuthoring::circle(1.0).with_layer(4), &layers).unwrap();

        assert_eq!(filter.belongs_to, 1 << 4);
        assert_eq!(filter.collides_with & (1 << 9), 0);
        assert_eq!(filter.collides_with.count_ones(), 31);
    }

    #[test]
    fn filter_rejects_out_of_range_layer() {
        let result = produce_filter(
            &ShapeAuthoring::circle(1.0).with_layer(32),
            &LayerCollisionMatrix::new(),
        );
        assert_eq!(result, Err(SynthesisError::LayerOutOfRange { layer: 32 }));
    }

    #[test]
    fn synthesize_builds_convex_blob() {
        let shape = snapshot(ShapeAuthoring::rect(1.0, 1.0), V3::repeat(2.0), V3::repeat(4.0));
        let blob = synthesize(&shape, ScalingMode::Global, 0.0, &LayerCollisionMatrix::new())
            .unwrap();

        match blob.as_ref() {
            ColliderBlob::Convex(convex) => assert!(matches!(
                convex.geometry,
                ColliderGeometry::Box { size, .. } if size == V3::new(4.0, 4.0, BOX_DEPTH)
            )),
            other => panic!("expected convex blob, got {other:?}"),
        }
    }
}
