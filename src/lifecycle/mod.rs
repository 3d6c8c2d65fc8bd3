pub mod background;
pub mod events;
pub mod kernel;
pub mod load;
pub mod recents;

pub use background::{BackgroundEntry, BackgroundPool};
pub use events::{AppMessage, Decision, Intent, LoadFailure, SystemMessage, TimeoutStage};
pub use kernel::{
    BackgroundSummary, Kernel, KernelHandle, KernelSnapshot, LaunchOutcome, LoadReporter,
    LoadSummary,
};
pub use load::{LoadAttempt, LoadStage};
pub use recents::{RecentAppRecord, RecentApps, RECENT_APPS_KEY};
