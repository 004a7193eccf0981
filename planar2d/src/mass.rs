use nalgebra::{Isometry3, Point3, Translation3, UnitQuaternion, Vector3};
use num_traits::Zero;
use rapier3d::prelude::MassProperties;

use crate::{constants::MIN_VOLUME, math::safe_recip};

/// Mass distribution of a body with unit mass.
///
/// `transform` places the center of mass and orients the principal inertia axes in
/// body space; `inertia_tensor` holds the principal moments for a body of mass 1.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MassDistribution {
    pub transform: Isometry3<f32>,
    pub inertia_tensor: Vector3<f32>,
}

/// Geometry-derived mass properties: a unit-mass distribution plus the volume it came from.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BodyMassProperties {
    pub mass_distribution: MassDistribution,
    pub volume: f32,
}

impl BodyMassProperties {
    /// Solid sphere of radius 1 centered at the body origin.
    ///
    /// Used whenever a body has no geometry so its mass and inertia stay well-defined.
    pub fn unit_sphere() -> Self {
        Self {
            mass_distribution: MassDistribution {
                transform: Isometry3::identity(),
                inertia_tensor: Vector3::repeat(0.4),
            },
            volume: 4.0 / 3.0 * std::f32::consts::PI,
        }
    }

    /// Convert rapier mass properties computed at density 1 (so mass == volume).
    pub fn from_unit_density(props: &MassProperties) -> Self {
        let volume = props.mass();
        let inertia_tensor = if volume > MIN_VOLUME {
            props.principal_inertia() / volume
        } else {
            Vector3::zeros()
        };

        Self {
            mass_distribution: MassDistribution {
                transform: Isometry3::from_parts(
                    Translation3::from(props.local_com.coords),
                    props.principal_inertia_local_frame,
                ),
                inertia_tensor,
            },
            volume,
        }
    }
}

/// Runtime mass descriptor attached to a body.
///
/// Kinematic (and static) bodies use zero inverse mass and inertia, i.e. infinite mass.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PhysicsMass {
    /// Center of mass and inertia orientation in body space.
    pub transform: Isometry3<f32>,
    pub inverse_mass: f32,
    pub inverse_inertia: Vector3<f32>,
}

impl PhysicsMass {
    /// Fully simulated body of total `mass` with the given distribution.
    pub fn dynamic(props: &BodyMassProperties, mass: f32) -> Self {
        let inertia = props.mass_distribution.inertia_tensor * mass;
        Self {
            transform: props.mass_distribution.transform,
            inverse_mass: safe_recip(mass),
            inverse_inertia: inertia.map(safe_recip),
        }
    }

    /// Infinite-mass body that keeps the distribution's center-of-mass frame.
    pub fn kinematic(props: &BodyMassProperties) -> Self {
        Self {
            transform: props.mass_distribution.transform,
            inverse_mass: 0.0,
            inverse_inertia: Vector3::zeros(),
        }
    }

    /// Replace the center of mass, keeping the inertia orientation.
    pub fn with_center_of_mass(mut self, center: Vector3<f32>) -> Self {
        self.transform.translation = Translation3::from(center);
        self
    }

    #[inline]
    pub fn center_of_mass(&self) -> Point3<f32> {
        Point3::from(self.transform.translation.vector)
    }

    #[inline]
    pub fn inertia_orientation(&self) -> UnitQuaternion<f32> {
        self.transform.rotation
    }

    #[inline]
    pub fn is_kinematic(&self) -> bool {
        self.inverse_mass == 0.0 && self.inverse_inertia == Vector3::zeros()
    }

    /// Mass properties in the form rapier expects for a body's additional mass.
    ///
    /// Kinematic descriptors map to zero mass, which rapier ignores for non-dynamic bodies.
    pub fn to_rapier(&self) -> MassProperties {
        if self.is_kinematic() {
            return MassProperties::zero();
        }

        MassProperties::with_principal_inertia_frame(
            self.center_of_mass(),
            safe_recip(self.inverse_mass),
            self.inverse_inertia.map(safe_recip),
            self.inertia_orientation(),
        )
    }
}
