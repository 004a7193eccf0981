//! Plane confinement around an unmodified 3D solve.
//!
//! Every step runs two passes over all confined bodies:
//! - [`begin_step`] (flatten): cache the out-of-plane pose, then project transform,
//!   mass frame and velocity into the XY plane so the solver only sees planar state.
//! - [`end_step`] (restore): bring the cached depth and out-of-plane rotation back,
//!   keeping the yaw the solver produced, and strip out-of-plane velocity again.
//!
//! Each body is touched independently, so both passes run data-parallel (rayon with the
//! `parallel` feature). Each pass returns only once every body is processed, which is
//! the barrier the solve sits between.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::{
    components::{LocalTransform, PhysicsVelocity, PlanarBody, PlanarCache},
    mass::PhysicsMass,
    math::{planar_rotation, with_yaw, yaw},
};

/// Cache depth and rotation, then drop the body onto z = 0 with yaw-only rotation.
#[inline]
pub fn flatten_transform(transform: &mut LocalTransform, cache: &mut PlanarCache) {
    cache.position_z = transform.position.z;
    cache.rotation = transform.rotation;

    transform.position.z = 0.0;
    transform.rotation = planar_rotation(&transform.rotation);
}

/// Zero the mass frame's depth and out-of-plane rotation.
#[inline]
pub fn flatten_mass(mass: &mut PhysicsMass) {
    mass.transform.translation.vector.z = 0.0;
    mass.transform.rotation = planar_rotation(&mass.transform.rotation);
}

/// Keep only in-plane linear velocity and angular velocity about the plane normal.
#[inline]
pub fn confine_velocity(velocity: &mut PhysicsVelocity) {
    velocity.linear.z = 0.0;
    velocity.angular.x = 0.0;
    velocity.angular.y = 0.0;
}

/// Restore cached depth, and rebuild rotation from the cached out-of-plane part plus
/// the yaw currently on the transform.
#[inline]
pub fn restore_transform(transform: &mut LocalTransform, cache: &PlanarCache) {
    transform.position.z = cache.position_z;
    transform.rotation = with_yaw(&cache.rotation, yaw(&transform.rotation));
}

/// Flatten pass for one body.
pub fn flatten_body(body: &mut PlanarBody) {
    flatten_transform(&mut body.transform, &mut body.cache);
    if let Some(mass) = body.mass.as_mut() {
        flatten_mass(mass);
    }
    if let Some(velocity) = body.velocity.as_mut() {
        confine_velocity(velocity);
    }
}

/// Restore pass for one body.
pub fn restore_body(body: &mut PlanarBody) {
    restore_transform(&mut body.transform, &body.cache);
    if let Some(velocity) = body.velocity.as_mut() {
        confine_velocity(velocity);
    }
}

/// Flatten every confined body. Returns once all bodies are processed.
pub fn begin_step(bodies: &mut [PlanarBody]) {
    #[cfg(feature = "parallel")]
    {
        bodies
            .par_iter_mut()
            .filter(|body| body.confined)
            .for_each(flatten_body);
    }
    #[cfg(not(feature = "parallel"))]
    {
        bodies
            .iter_mut()
            .filter(|body| body.confined)
            .for_each(flatten_body);
    }
}

/// Restore every confined body. Returns once all bodies are processed.
pub fn end_step(bodies: &mut [PlanarBody]) {
    #[cfg(feature = "parallel")]
    {
        bodies
            .par_iter_mut()
            .filter(|body| body.confined)
            .for_each(restore_body);
    }
    #[cfg(not(feature = "parallel"))]
    {
        bodies
            .iter_mut()
            .filter(|body| body.confined)
            .for_each(restore_body);
    }
}

/// Run `solve` bracketed by the flatten and restore passes.
pub fn simulate_step<F>(bodies: &mut [PlanarBody], solve: F)
where
    F: FnOnce(&mut [PlanarBody]),
{
    begin_step(bodies);
    solve(bodies);
    end_step(bodies);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        components::{Entity, MotionType},
        mass::BodyMassProperties,
    };
    use nalgebra::{Isometry3, Translation3, UnitQuaternion, Vector3};

    fn body(position: Vector3<f32>, rotation: UnitQuaternion<f32>) -> PlanarBody {
        let mut body = PlanarBody::new(
            Entity(1),
            MotionType::Dynamic,
            LocalTransform::from_position_rotation(position, rotation),
        );
        body.mass = Some(PhysicsMass::dynamic(&BodyMassProperties::unit_sphere(), 1.0));
        body.velocity = Some(PhysicsVelocity {
            linear: Vector3::new(1.0, 2.0, 3.0),
            angular: Vector3::new(4.0, 5.0, 6.0),
        });
        body
    }

    fn assert_velocity_planar(body: &PlanarBody) {
        let v = body.velocity.unwrap();
        assert_eq!(v.linear.z, 0.0);
        assert_eq!(v.angular.x, 0.0);
        assert_eq!(v.angular.y, 0.0);
    }

    #[test]
    fn flatten_projects_transform_and_caches_it() {
        let rotation = UnitQuaternion::from_euler_angles(0.3, -0.4, 1.2);
        let mut bodies = vec![body(Vector3::new(1.0, 2.0, 5.0), rotation)];
        begin_step(&mut bodies);

        let b = &bodies[0];
        assert_eq!(b.transform.position, Vector3::new(1.0, 2.0, 0.0));
        assert_eq!(b.cache.position_z, 5.0);
        assert_eq!(b.cache.rotation, rotation);

        let (roll, pitch, yaw) = b.transform.rotation.euler_angles();
        assert!(roll.abs() < 1.0e-6);
        assert!(pitch.abs() < 1.0e-6);
        assert!((yaw - 1.2).abs() < 1.0e-5);
    }

    #[test]
    fn flatten_projects_mass_frame() {
        let mut b = body(Vector3::zeros(), UnitQuaternion::identity());
        b.mass = Some(PhysicsMass {
            transform: Isometry3::from_parts(
                Translation3::new(0.5, 0.5, 2.0),
                UnitQuaternion::from_euler_angles(0.2, 0.1, 0.7),
            ),
            inverse_mass: 1.0,
            inverse_inertia: Vector3::repeat(1.0),
        });
        flatten_body(&mut b);

        let mass = b.mass.unwrap();
        assert_eq!(mass.transform.translation.vector, Vector3::new(0.5, 0.5, 0.0));
        let (roll, pitch, yaw) = mass.transform.rotation.euler_angles();
        assert!(roll.abs() < 1.0e-6 && pitch.abs() < 1.0e-6);
        assert!((yaw - 0.7).abs() < 1.0e-5);
    }

    #[test]
    fn velocity_is_planar_after_both_passes_whatever_the_solver_does() {
        let mut bodies = vec![body(Vector3::zeros(), UnitQuaternion::identity())];

        begin_step(&mut bodies);
        assert_velocity_planar(&bodies[0]);
        let v = bodies[0].velocity.unwrap();
        assert_eq!(v.linear.xy(), nalgebra::Vector2::new(1.0, 2.0));
        assert_eq!(v.angular.z, 6.0);

        // Solver reintroduces out-of-plane motion through coupling.
        bodies[0].velocity = Some(PhysicsVelocity {
            linear: Vector3::new(1.0, 1.0, -9.0),
            angular: Vector3::new(0.5, -0.5, 2.0),
        });
        end_step(&mut bodies);
        assert_velocity_planar(&bodies[0]);
        assert_eq!(bodies[0].velocity.unwrap().angular.z, 2.0);
    }

    #[test]
    fn cycle_is_identity_for_planar_body() {
        let rotation = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), -2.1);
        let position = Vector3::new(3.0, -1.0, 0.0);
        let mut bodies = vec![body(position, rotation)];

        simulate_step(&mut bodies, |_| {});

        let t = bodies[0].transform;
        assert!((t.position - position).norm() < 1.0e-6);
        assert!(t.rotation.angle_to(&rotation) < 1.0e-5);
    }

    #[test]
    fn restore_preserves_out_of_plane_rotation_without_drift() {
        let rotation = UnitQuaternion::from_euler_angles(0.25, -0.15, 0.8);
        let mut bodies = vec![body(Vector3::new(0.0, 0.0, -4.0), rotation)];

        // Run several steps with no planar change from the solver.
        for _ in 0..10 {
            simulate_step(&mut bodies, |_| {});
        }

        let t = bodies[0].transform;
        assert_eq!(t.position.z, -4.0);
        assert!(t.rotation.angle_to(&rotation) < 1.0e-4);
    }

    #[test]
    fn cycle_is_identity_at_ninety_degree_pitch() {
        for pitch in [std::f32::consts::FRAC_PI_2, -std::f32::consts::FRAC_PI_2, -1.5707] {
            let rotation = UnitQuaternion::from_euler_angles(0.0, pitch, 2.0);
            let mut bodies = vec![body(Vector3::new(0.0, 0.0, 0.5), rotation)];

            simulate_step(&mut bodies, |_| {});

            assert!(bodies[0].transform.rotation.angle_to(&rotation) < 1.0e-5);
        }
    }

    #[test]
    fn restore_honors_solver_yaw() {
        let rotation = UnitQuaternion::from_euler_angles(0.25, -0.15, 0.8);
        let mut bodies = vec![body(Vector3::new(0.0, 0.0, 1.5), rotation)];

        simulate_step(&mut bodies, |bodies| {
            let t = &mut bodies[0].transform;
            assert_eq!(t.position.z, 0.0);
            t.rotation = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), 1.3);
            t.position.x += 2.0;
        });

        let t = bodies[0].transform;
        let (roll, pitch, yaw) = t.rotation.euler_angles();
        assert!((roll - 0.25).abs() < 1.0e-5);
        assert!((pitch + 0.15).abs() < 1.0e-5);
        assert!((yaw - 1.3).abs() < 1.0e-5);
        assert_eq!(t.position.z, 1.5);
        assert_eq!(t.position.x, 2.0);
    }

    #[test]
    fn unconfined_bodies_are_untouched() {
        let rotation = UnitQuaternion::from_euler_angles(0.25, 0.0, 0.0);
        let mut b = body(Vector3::new(0.0, 0.0, 2.0), rotation);
        b.confined = false;
        let mut bodies = vec![b];

        begin_step(&mut bodies);
        assert_eq!(bodies[0].transform.position.z, 2.0);
        assert_eq!(bodies[0].velocity.unwrap().linear.z, 3.0);
    }

    #[test]
    fn static_body_without_motion_components_is_flattened() {
        let mut b = PlanarBody::new(
            Entity(2),
            MotionType::Static,
            LocalTransform::from_position_rotation(Vector3::new(0.0, 0.0, 1.0), UnitQuaternion::identity()),
        );
        flatten_body(&mut b);
        assert_eq!(b.transform.position.z, 0.0);
        restore_body(&mut b);
        assert_eq!(b.transform.position.z, 1.0);
        assert!(b.velocity.is_none());
    }

    #[test]
    fn many_bodies_are_processed() {
        let mut bodies: Vec<PlanarBody> = (0..256)
            .map(|i| body(Vector3::new(i as f32, 0.0, 1.0), UnitQuaternion::identity()))
            .collect();

        begin_step(&mut bodies);
        assert!(bodies.iter().all(|b| b.transform.position.z == 0.0));
        end_step(&mut bodies);
        assert!(bodies.iter().all(|b| b.transform.position.z == 1.0));
    }
}
