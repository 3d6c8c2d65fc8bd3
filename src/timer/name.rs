use std::fmt;

use crate::apps::AppId;

/// Every timer the shell arms, keyed by the app it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TimerName {
    /// First-stage "app is slow" deadline of a load attempt.
    SlowLoad(AppId),
    /// Progress ticks while the user chose to wait.
    WaitProgress(AppId),
    /// End of the wait window.
    FinalTimeout(AppId),
    /// Release of a backgrounded instance.
    Eviction(AppId),
    /// Staleness of a recents record.
    RecentExpiry(AppId),
}

impl TimerName {
    pub fn app_id(&self) -> &AppId {
        match self {
            TimerName::SlowLoad(id)
            | TimerName::WaitProgress(id)
            | TimerName::FinalTimeout(id)
            | TimerName::Eviction(id)
            | TimerName::RecentExpiry(id) => id,
        }
    }

    pub fn is_load_timer(&self) -> bool {
        matches!(
            self,
            TimerName::SlowLoad(_) | TimerName::WaitProgress(_) | TimerName::FinalTimeout(_)
        )
    }

    /// Load-related timers of one app.
    pub fn is_load_timer_for(&self, app_id: &AppId) -> bool {
        self.is_load_timer() && self.app_id() == app_id
    }
}

impl fmt::Display for TimerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimerName::SlowLoad(id) => write!(f, "load.slow:{id}"),
            TimerName::WaitProgress(id) => write!(f, "load.progress:{id}"),
            TimerName::FinalTimeout(id) => write!(f, "load.final:{id}"),
            TimerName::Eviction(id) => write!(f, "background.evict:{id}"),
            TimerName::RecentExpiry(id) => write!(f, "recents.expire:{id}"),
        }
    }
}
