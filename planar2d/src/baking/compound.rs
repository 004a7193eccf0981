use log::debug;
use nalgebra::Isometry3;

use super::synthesize::{ScalingMode, try_synthesize};
use crate::{
    collider::{ChildCollider, ColliderBlob, ColliderRef},
    layers::LayerCollisionMatrix,
    shape::{BodySnapshot, TransformSnapshot},
};

/// Rigid transform mapping a shape's frame into its body's frame.
///
/// Both world matrices are reduced to translation + rotation first, so scale and
/// shear never leak into the compound.
pub fn compound_from_child(body: &TransformSnapshot, shape: &TransformSnapshot) -> Isometry3<f32> {
    body.rigid().inverse() * shape.rigid()
}

/// Produce the single collider of a body from its enabled shapes.
///
/// - No enabled shapes: `None`.
/// - Exactly one enabled shape, on the root: a simple collider in local scale.
/// - Anything else: a compound, see [`assemble_compound`].
pub fn assemble(body: &BodySnapshot, layers: &LayerCollisionMatrix) -> Option<ColliderRef> {
    let mut enabled = body.enabled_shapes();
    let first = enabled.next()?;

    if first.on_root && enabled.next().is_none() {
        debug!("{:?}: single root shape, baking simple collider", body.entity);
        return try_synthesize(first, ScalingMode::Local, 0.0, layers);
    }

    assemble_compound(body, layers)
}

/// Merge every enabled shape of `body` into one compound collider.
///
/// Each shape is synthesized in world (lossy) scale with its geometry shifted along
/// the plane normal by `root.z - shape.z`. That shift cancels the depth carried by the
/// child's compound-from-child transform, so every leaf ends up in the root's plane.
/// Returns `None` if no shape synthesized.
pub fn assemble_compound(body: &BodySnapshot, layers: &LayerCollisionMatrix) -> Option<ColliderRef> {
    let root_z = body.transform.world_position().z;

    let children: Vec<ChildCollider> = body
        .enabled_shapes()
        .filter_map(|shape| {
            let z_offset = root_z - shape.transform.world_position().z;
            let collider = try_synthesize(shape, ScalingMode::Global, z_offset, layers)?;

            Some(ChildCollider {
                collider,
                compound_from_child: compound_from_child(&body.transform, &shape.transform),
                entity: shape.entity,
            })
        })
        .collect();

    if children.is_empty() {
        debug!("{:?}: no shape could be synthesized, no collider", body.entity);
        return None;
    }

    debug!(
        "{:?}: baking compound collider with {} children",
        body.entity,
        children.len()
    );
    Some(ColliderBlob::compound(children))
}
