pub mod instance;
pub mod registry;

pub use instance::{AppInstance, AppState, Frame, FrameId};
pub use registry::{AppId, AppRegistry};
