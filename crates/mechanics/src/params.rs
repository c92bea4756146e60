//! Physical constants of the acrobot.

use serde::{Deserialize, Serialize};

use crate::error::{DynamicsError, DynamicsResult};

/// Physical parameters of a two-link acrobot actuated at the elbow.
///
/// The model places the mass of each link at its far end and adds the
/// rotational inertia `i1`/`i2` about the respective joint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AcrobotParams {
    /// Mass of the first (shoulder) link (kg)
    pub m1: f64,
    /// Mass of the second (elbow) link (kg)
    pub m2: f64,
    /// Moment of inertia of the first link (kg·m²)
    pub i1: f64,
    /// Moment of inertia of the second link (kg·m²)
    pub i2: f64,
    /// Length of the first link (m)
    pub l1: f64,
    /// Length of the second link (m)
    pub l2: f64,
    /// Gravitational acceleration (m/s²)
    pub g: f64,
    /// Viscous damping at both joints (N·m·s/rad)
    pub b: f64,
    /// Maximum elbow torque magnitude (N·m)
    pub torque_limit: f64,
}

impl Default for AcrobotParams {
    fn default() -> Self {
        AcrobotParams {
            m1: 1.0,
            m2: 1.0,
            i1: 1.0,
            i2: 1.0,
            l1: 0.5,
            l2: 0.5,
            g: 9.8,
            b: 0.0,
            torque_limit: 15.0,
        }
    }
}

impl AcrobotParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_masses(mut self, m1: f64, m2: f64) -> Self {
        self.m1 = m1;
        self.m2 = m2;
        self
    }

    pub fn with_inertias(mut self, i1: f64, i2: f64) -> Self {
        self.i1 = i1;
        self.i2 = i2;
        self
    }

    pub fn with_lengths(mut self, l1: f64, l2: f64) -> Self {
        self.l1 = l1;
        self.l2 = l2;
        self
    }

    pub fn with_gravity(mut self, g: f64) -> Self {
        self.g = g;
        self
    }

    pub fn with_damping(mut self, b: f64) -> Self {
        self.b = b;
        self
    }

    pub fn with_torque_limit(mut self, torque_limit: f64) -> Self {
        self.torque_limit = torque_limit;
        self
    }

    /// Clamp a torque command to the actuator range.
    ///
    /// NaN passes through unchanged so that callers can detect it.
    pub fn saturate(&self, torque: f64) -> f64 {
        torque.clamp(-self.torque_limit, self.torque_limit)
    }

    /// Check that the constants describe a physically valid acrobot.
    pub fn validate(&self) -> DynamicsResult<()> {
        let strictly_positive = [
            ("m1", self.m1),
            ("m2", self.m2),
            ("i1", self.i1),
            ("i2", self.i2),
            ("l1", self.l1),
            ("l2", self.l2),
            ("g", self.g),
            ("torque_limit", self.torque_limit),
        ];
        for (name, value) in strictly_positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(DynamicsError::InvalidParameter { name, value });
            }
        }
        if !self.b.is_finite() || self.b < 0.0 {
            return Err(DynamicsError::InvalidParameter {
                name: "b",
                value: self.b,
            });
        }

        // det M is concave in cos(theta2), so its minimum over [-1, 1] sits at an endpoint
        for cos_theta2 in [-1.0, 1.0] {
            let determinant = self.mass_matrix_determinant(cos_theta2);
            let trace = self.m11(cos_theta2) + self.i2;
            if determinant <= 0.0 || trace <= 0.0 {
                return Err(DynamicsError::IndefiniteMassMatrix {
                    cos_theta2,
                    determinant,
                });
            }
        }
        Ok(())
    }

    /// Coupling coefficient `m2·L1·L2` shared by the inertia and Coriolis terms.
    pub(crate) fn coupling(&self) -> f64 {
        self.m2 * self.l1 * self.l2
    }

    pub(crate) fn m11(&self, cos_theta2: f64) -> f64 {
        self.i1 + self.i2 + self.m2 * self.l1 * self.l1 + 2.0 * self.coupling() * cos_theta2
    }

    pub(crate) fn m12(&self, cos_theta2: f64) -> f64 {
        self.i2 + self.coupling() * cos_theta2
    }

    fn mass_matrix_determinant(&self, cos_theta2: f64) -> f64 {
        let m12 = self.m12(cos_theta2);
        self.m11(cos_theta2) * self.i2 - m12 * m12
    }
}
