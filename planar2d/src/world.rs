//! Rapier-backed host world for baked planar bodies.
//!
//! This is the piece that plugs the planar constraint passes into a real 3D solver:
//! baked [`PlanarBody`] records are mirrored into rapier sets, and every
//! [`PlanarWorld::step`] runs
//!
//! 1. flatten (all bodies, parallel),
//! 2. push flattened pose, velocity and mass into rapier,
//! 3. one unmodified rapier pipeline step,
//! 4. pull pose and velocity back,
//! 5. restore (all bodies, parallel).
//!
//! Design goals
//! - Rapier never sees out-of-plane state: it only ever runs between the two passes.
//! - The `PlanarBody` records stay the source of truth; rapier handles are an index.
//! - Only bodies baked for this world's `world_index` are accepted.

use log::{debug, trace};
use nalgebra::{Isometry3, Translation3, Vector3};
use rapier3d::prelude::*;

use crate::{
    components::{MotionType, PlanarBody},
    constants::{DEFAULT_TIMESTEP, GRAVITY_MPS2, PLANAR_WORLD_INDEX},
    constraint::{begin_step, end_step},
    math::planar_rotation,
};

/// Pose (meters, radians) or velocity change below which a push does not wake a body.
const WAKE_EPS: f32 = 1.0e-6;

/// Tunables for a [`PlanarWorld`].
#[derive(Clone, Debug)]
pub struct PlanarWorldSettings {
    /// Gravity in m/s^2; only X and Y matter for planar bodies.
    pub gravity: Vector3<f32>,
    /// Fixed timestep in seconds.
    pub dt: f32,
    /// Physics world index this world simulates.
    pub world_index: u32,
}

impl Default for PlanarWorldSettings {
    fn default() -> Self {
        Self {
            gravity: Vector3::new(0.0, -GRAVITY_MPS2, 0.0),
            dt: DEFAULT_TIMESTEP,
            world_index: PLANAR_WORLD_INDEX,
        }
    }
}

/// Planar bodies plus the rapier state that simulates them.
pub struct PlanarWorld {
    pub settings: PlanarWorldSettings,
    bodies: Vec<PlanarBody>,
    handles: Vec<RigidBodyHandle>,
    rigid_bodies: RigidBodySet,
    colliders: ColliderSet,
    integration_parameters: IntegrationParameters,
    pipeline: PhysicsPipeline,
    islands: IslandManager,
    broad_phase: BroadPhaseBvh,
    narrow_phase: NarrowPhase,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
}

impl Default for PlanarWorld {
    fn default() -> Self {
        Self::new(PlanarWorldSettings::default())
    }
}

impl PlanarWorld {
    pub fn new(settings: PlanarWorldSettings) -> Self {
        let integration_parameters = IntegrationParameters {
            dt: settings.dt,
            ..IntegrationParameters::default()
        };

        Self {
            settings,
            bodies: Vec::new(),
            handles: Vec::new(),
            rigid_bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            integration_parameters,
            pipeline: PhysicsPipeline::new(),
            islands: IslandManager::new(),
            broad_phase: BroadPhaseBvh::new(),
            narrow_phase: NarrowPhase::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
        }
    }

    /// Insert a baked body. Returns its index, or `None` if it was baked for another world.
    pub fn insert(&mut self, body: PlanarBody) -> Option<usize> {
        if body.world_index != self.settings.world_index {
            debug!(
                "{:?}: baked for world {}, not {}",
                body.entity, body.world_index, self.settings.world_index
            );
            return None;
        }

        let handle = self.rigid_bodies.insert(rigid_body_from(&body));
        if let Some(collider) = &body.collider {
            for c in collider.to_rapier_colliders() {
                self.colliders
                    .insert_with_parent(c, handle, &mut self.rigid_bodies);
            }
        }

        self.bodies.push(body);
        self.handles.push(handle);
        Some(self.bodies.len() - 1)
    }

    pub fn bodies(&self) -> &[PlanarBody] {
        &self.bodies
    }

    pub fn bodies_mut(&mut self) -> &mut [PlanarBody] {
        &mut self.bodies
    }

    pub fn body(&self, index: usize) -> Option<&PlanarBody> {
        self.bodies.get(index)
    }

    /// Rapier body mirroring the body at `index`.
    pub fn rigid_body(&self, index: usize) -> Option<&RigidBody> {
        let handle = self.handles.get(index)?;
        self.rigid_bodies.get(*handle)
    }

    /// Advance the simulation by one fixed step.
    pub fn step(&mut self) {
        trace!("planar step: flatten {} bodies", self.bodies.len());
        begin_step(&mut self.bodies);

        self.push_state();

        let gravity = self.settings.gravity;
        self.integration_parameters.dt = self.settings.dt;
        self.pipeline.step(
            &gravity,
            &self.integration_parameters,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            &(),
            &(),
        );

        self.pull_state();

        trace!("planar step: restore {} bodies", self.bodies.len());
        end_step(&mut self.bodies);
    }

    fn push_state(&mut self) {
        for (body, handle) in self.bodies.iter().zip(&self.handles) {
            // Fixed bodies keep the world pose they were inserted with.
            if body.is_static() {
                continue;
            }
            let Some(rb) = self.rigid_bodies.get_mut(*handle) else {
                continue;
            };

            let moved = (rb.translation() - body.transform.position).norm() > WAKE_EPS
                || rb.rotation().angle_to(&body.transform.rotation) > WAKE_EPS;
            let velocity_changed = body.velocity.is_some_and(|v| {
                (rb.linvel() - v.linear).norm() > WAKE_EPS
                    || (rb.angvel() - v.angular).norm() > WAKE_EPS
            });
            if moved || velocity_changed {
                rb.wake_up(true);
            }

            rb.set_translation(body.transform.position, false);
            rb.set_rotation(body.transform.rotation, false);

            if let Some(velocity) = &body.velocity {
                rb.set_linvel(velocity.linear, false);
                rb.set_angvel(velocity.angular, false);
            }
            if body.motion_type == MotionType::Dynamic {
                if let Some(mass) = &body.mass {
                    rb.set_additional_mass_properties(mass.to_rapier(), false);
                }
            }
        }
    }

    fn pull_state(&mut self) {
        for (body, handle) in self.bodies.iter_mut().zip(&self.handles) {
            if body.motion_type == MotionType::Static {
                continue;
            }
            let Some(rb) = self.rigid_bodies.get(*handle) else {
                continue;
            };

            body.transform.position = *rb.translation();
            body.transform.rotation = *rb.rotation();

            if let Some(velocity) = body.velocity.as_mut() {
                velocity.linear = *rb.linvel();
                velocity.angular = *rb.angvel();
            }
        }
    }
}

/// Rapier rigid body mirroring a baked body's motion type and components.
fn rigid_body_from(body: &PlanarBody) -> RigidBody {
    let builder = match body.motion_type {
        MotionType::Static => RigidBodyBuilder::fixed(),
        MotionType::Kinematic => RigidBodyBuilder::kinematic_velocity_based(),
        MotionType::Dynamic => RigidBodyBuilder::dynamic(),
    };

    let mut builder = builder
        .pose(planar_pose(&body.world_pose))
        .gravity_scale(body.gravity_factor.unwrap_or(0.0));

    if let Some(damping) = &body.damping {
        builder = builder
            .linear_damping(damping.linear)
            .angular_damping(damping.angular);
    }
    if let Some(velocity) = &body.velocity {
        builder = builder.linvel(velocity.linear).angvel(velocity.angular);
    }
    if body.motion_type == MotionType::Dynamic {
        if let Some(mass) = &body.mass {
            builder = builder.additional_mass_properties(mass.to_rapier());
        }
    }

    builder.build()
}

/// `pose` dropped onto z = 0 with yaw-only rotation.
fn planar_pose(pose: &Isometry3<f32>) -> Isometry3<f32> {
    let mut translation = pose.translation.vector;
    translation.z = 0.0;
    Isometry3::from_parts(Translation3::from(translation), planar_rotation(&pose.rotation))
}
