pub mod baking;
pub mod collider;
pub mod components;
pub mod constants;
pub mod constraint;
pub mod layers;
pub mod mass;
pub mod math;
pub mod shape;
pub mod world;

pub use baking::{
    BakeContext, BodyType, ColliderOwnership, Interpolation, RigidBodyAuthoring, ScalingMode,
    SynthesisError, assemble, assemble_compound, bake_rigid_body, bake_static_collider, synthesize,
};
pub use collider::{
    ChildCollider, ColliderBlob, ColliderGeometry, ColliderRef, CollisionFilter,
    CollisionResponse, ConvexCollider, Material,
};
pub use components::{
    Entity, LocalTransform, MotionType, PhysicsDamping, PhysicsVelocity, PlanarBody, PlanarCache,
    TransformOverride,
};
pub use constants::{BOX_DEPTH, LAYER_COUNT, PLANAR_WORLD_INDEX};
pub use constraint::{begin_step, end_step, simulate_step};
pub use layers::{Layer, LayerCollisionMatrix};
pub use mass::{BodyMassProperties, MassDistribution, PhysicsMass};
pub use shape::{
    BodySnapshot, CapsuleDirection, ShapeAuthoring, ShapeKind, ShapeSnapshot, TransformSnapshot,
};
pub use world::{PlanarWorld, PlanarWorldSettings};
