//! Forward kinematics for trajectory consumers (plots, animations).
//!
//! Frame: origin at the shoulder pivot, x to the right, y up. An angle of zero
//! hangs straight down; π points straight up.

use nalgebra::Point2;
use simcore::AcrobotState;

use crate::params::AcrobotParams;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkPositions {
    pub elbow: Point2<f64>,
    pub tip: Point2<f64>,
}

impl AcrobotParams {
    /// Cartesian positions of the elbow joint and the tip of the second link.
    pub fn link_positions(&self, state: &AcrobotState) -> LinkPositions {
        let absolute2 = state.theta1 + state.theta2;
        let elbow = Point2::new(
            self.l1 * state.theta1.sin(),
            -self.l1 * state.theta1.cos(),
        );
        let tip = Point2::new(
            elbow.x + self.l2 * absolute2.sin(),
            elbow.y - self.l2 * absolute2.cos(),
        );
        LinkPositions { elbow, tip }
    }
}
