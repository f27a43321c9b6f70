//! Physical properties of a moving body.
//!
//! [`PhysicalProperties`] is validated once at construction and never mutated
//! afterwards. Mechanisms share it by reference (`Arc`).
//!
//! [`PhysicalPropertiesConfig`] is the TOML form, using plain arrays so the
//! description files stay readable:
//!
//! ```toml
//! [mechanisms.properties]
//! mass = 10.0
//! center_of_gravity = [0.0, 0.0, 0.5]
//! moment_of_inertia = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 0.1]]
//! ```

use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::GRAVITY;

/// Validation errors for physical properties and materials.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PhysicsError {
    /// Mass must be finite and strictly positive.
    #[error("mass must be finite and > 0, got {0}")]
    InvalidMass(f64),

    /// A vector or matrix entry is NaN or infinite.
    #[error("{0} contains a non-finite entry")]
    NonFinite(&'static str),

    /// A material coefficient is outside [0, 1].
    #[error("material {name} must be within [0, 1], got {value}")]
    MaterialOutOfRange {
        /// Coefficient name.
        name: &'static str,
        /// Offending value.
        value: f64,
    },
}

/// Surface/contact material of a body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Material {
    /// Coefficient of friction (0-1).
    pub friction: f64,
    /// Coefficient of restitution (0-1).
    pub restitution: f64,
    /// Damping factor (0-1).
    pub damping: f64,
}

impl Material {
    /// Create a validated material.
    pub fn new(friction: f64, restitution: f64, damping: f64) -> Result<Self, PhysicsError> {
        let m = Self {
            friction,
            restitution,
            damping,
        };
        m.validate()?;
        Ok(m)
    }

    /// Check that every coefficient lies in [0, 1].
    pub fn validate(&self) -> Result<(), PhysicsError> {
        for (name, value) in [
            ("friction", self.friction),
            ("restitution", self.restitution),
            ("damping", self.damping),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(PhysicsError::MaterialOutOfRange { name, value });
            }
        }
        Ok(())
    }
}

/// Immutable mass properties of one mechanism.
#[derive(Debug, Clone, PartialEq)]
pub struct PhysicalProperties {
    mass: f64,
    center_of_gravity: Vector3<f64>,
    moment_of_inertia: Matrix3<f64>,
    material: Option<Material>,
}

impl PhysicalProperties {
    /// Create validated properties.
    ///
    /// # Errors
    /// - `InvalidMass` if `mass` is not finite or not > 0.
    /// - `NonFinite` if the center of gravity or inertia has NaN/inf entries.
    /// - `MaterialOutOfRange` if the material is invalid.
    pub fn new(
        mass: f64,
        center_of_gravity: Vector3<f64>,
        moment_of_inertia: Matrix3<f64>,
        material: Option<Material>,
    ) -> Result<Self, PhysicsError> {
        if !mass.is_finite() || mass <= 0.0 {
            return Err(PhysicsError::InvalidMass(mass));
        }
        if center_of_gravity.iter().any(|v| !v.is_finite()) {
            return Err(PhysicsError::NonFinite("center_of_gravity"));
        }
        if moment_of_inertia.iter().any(|v| !v.is_finite()) {
            return Err(PhysicsError::NonFinite("moment_of_inertia"));
        }
        if let Some(m) = &material {
            m.validate()?;
        }
        Ok(Self {
            mass,
            center_of_gravity,
            moment_of_inertia,
            material,
        })
    }

    /// Point mass at `center_of_gravity` with identity inertia. Handy for tests and sketches.
    pub fn point_mass(mass: f64, center_of_gravity: Vector3<f64>) -> Result<Self, PhysicsError> {
        Self::new(mass, center_of_gravity, Matrix3::identity(), None)
    }

    /// Mass [kg].
    #[inline]
    pub fn mass(&self) -> f64 {
        self.mass
    }

    /// Center of gravity [m], in the system frame.
    #[inline]
    pub fn center_of_gravity(&self) -> &Vector3<f64> {
        &self.center_of_gravity
    }

    /// Inertia tensor [kg·m²].
    #[inline]
    pub fn moment_of_inertia(&self) -> &Matrix3<f64> {
        &self.moment_of_inertia
    }

    /// Optional surface material.
    #[inline]
    pub fn material(&self) -> Option<&Material> {
        self.material.as_ref()
    }

    /// Weight vector `(0, 0, −g·m)` [N].
    #[inline]
    pub fn gravity_force(&self) -> Vector3<f64> {
        Vector3::new(0.0, 0.0, -GRAVITY * self.mass)
    }
}

/// TOML representation of [`PhysicalProperties`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhysicalPropertiesConfig {
    /// Mass [kg].
    pub mass: f64,
    /// Center of gravity [m].
    #[serde(default)]
    pub center_of_gravity: [f64; 3],
    /// Row-major inertia tensor [kg·m²] (default: identity).
    #[serde(default = "default_inertia")]
    pub moment_of_inertia: [[f64; 3]; 3],
    /// Optional material.
    #[serde(default)]
    pub material: Option<Material>,
}

fn default_inertia() -> [[f64; 3]; 3] {
    [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]
}

impl PhysicalPropertiesConfig {
    /// Convert into validated properties.
    pub fn to_properties(&self) -> Result<PhysicalProperties, PhysicsError> {
        let [r0, r1, r2] = self.moment_of_inertia;
        let moi = Matrix3::new(
            r0[0], r0[1], r0[2], //
            r1[0], r1[1], r1[2], //
            r2[0], r2[1], r2[2],
        );
        PhysicalProperties::new(
            self.mass,
            Vector3::from(self.center_of_gravity),
            moi,
            self.material,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn rejects_non_positive_mass() {
        let r = PhysicalProperties::point_mass(0.0, Vector3::zeros());
        assert_eq!(r, Err(PhysicsError::InvalidMass(0.0)));
        let r = PhysicalProperties::point_mass(-1.0, Vector3::zeros());
        assert!(matches!(r, Err(PhysicsError::InvalidMass(_))));
        let r = PhysicalProperties::point_mass(f64::NAN, Vector3::zeros());
        assert!(matches!(r, Err(PhysicsError::InvalidMass(_))));
    }

    #[test]
    fn rejects_non_finite_cog() {
        let r = PhysicalProperties::point_mass(1.0, Vector3::new(0.0, f64::INFINITY, 0.0));
        assert_eq!(r, Err(PhysicsError::NonFinite("center_of_gravity")));
    }

    #[test]
    fn gravity_points_down() {
        let p = PhysicalProperties::point_mass(10.0, Vector3::zeros()).unwrap();
        let g = p.gravity_force();
        assert_eq!(g.x, 0.0);
        assert_eq!(g.y, 0.0);
        assert_relative_eq!(g.z, -98.1, epsilon = 1e-12);
    }

    #[test]
    fn material_bounds() {
        assert!(Material::new(0.5, 0.2, 0.1).is_ok());
        let r = Material::new(1.5, 0.2, 0.1);
        assert!(matches!(
            r,
            Err(PhysicsError::MaterialOutOfRange { name: "friction", .. })
        ));
    }

    #[test]
    fn config_converts_row_major() {
        let cfg: PhysicalPropertiesConfig = toml::from_str(
            r#"
mass = 5.0
center_of_gravity = [0.3, 0.0, 0.0]
moment_of_inertia = [[0.1, 0.2, 0.0], [0.0, 0.1, 0.0], [0.0, 0.0, 0.5]]
"#,
        )
        .unwrap();
        let p = cfg.to_properties().unwrap();
        assert_eq!(p.mass(), 5.0);
        assert_eq!(p.moment_of_inertia()[(0, 1)], 0.2);
        assert_eq!(p.moment_of_inertia()[(1, 0)], 0.0);
        assert_eq!(p.center_of_gravity().x, 0.3);
        assert!(p.material().is_none());
    }

    #[test]
    fn config_default_inertia_is_identity() {
        let cfg: PhysicalPropertiesConfig = toml::from_str("mass = 2.0").unwrap();
        let p = cfg.to_properties().unwrap();
        assert_eq!(*p.moment_of_inertia(), Matrix3::identity());
    }
}
