/*!
Baking: one-time conversion of 2D authoring data into planar 3D bodies.

The pipeline runs leaves first:

- synthesize: one 2D shape -> one convex collider blob (geometry, material, filter)
- compound:   a body's enabled shapes -> one simple or compound collider
- body:       rigid-body authoring + collider -> a fully configured `PlanarBody`

Baking reads only a `BodySnapshot` and an explicit `LayerCollisionMatrix`, so it is
pure: baking the same inputs twice yields equal colliders and bodies. No failure is
fatal; unsupported shapes are skipped with a warning and bodies without geometry fall
back to unit-sphere mass.
*/

pub mod body;
pub mod compound;
pub mod synthesize;

pub use body::{
    BakeContext, BodyType, ColliderOwnership, Interpolation, RigidBodyAuthoring,
    bake_rigid_body, bake_static_collider, resolve_motion_type,
};
pub use compound::{assemble, assemble_compound, compound_from_child};
pub use synthesize::{ScalingMode, SynthesisError, synthesize, try_synthesize};
