pub mod name;
pub mod registry;

pub use name::TimerName;
pub use registry::{TimerFired, TimerRegistry};
