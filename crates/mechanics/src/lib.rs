pub mod dynamics;
pub mod energy;
pub mod error;
pub mod kinematics;
pub mod linearize;
pub mod params;

pub use dynamics::Acrobot;
pub use error::{DynamicsError, DynamicsResult};
pub use kinematics::LinkPositions;
pub use linearize::LinearSystem;
pub use params::AcrobotParams;
