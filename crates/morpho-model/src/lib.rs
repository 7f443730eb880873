// morpho-model: Robot morphology (link/joint tree) and prop descriptions.

pub mod prop;
pub mod robot;

pub use prop::Prop;
pub use robot::{JointKind, Link, RobotModel};

pub mod prelude {
    pub use crate::prop::Prop;
    pub use crate::robot::{JointKind, Link, RobotModel};
}
