use chrono::{DateTime, Utc};
use std::{collections::HashMap, time::Duration};
use tokio::time::Instant;

use crate::{
    apps::{AppId, AppInstance, AppState},
    timer::{TimerName, TimerRegistry},
};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info};

#[derive(Debug)]
pub struct BackgroundEntry {
    pub instance: AppInstance,
    pub backgrounded_at: DateTime<Utc>,
    pub eviction_deadline: Instant,
}

/// Off-screen instances waiting to be restored or evicted. Each entry owns its
/// instance and has exactly one eviction timer armed under its app id.
pub struct BackgroundPool {
    entries: HashMap<AppId, BackgroundEntry>,
    ttl: Duration,
}

impl BackgroundPool {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
        }
    }

    /// Parks `instance` and arms its eviction for `backgrounded_at + ttl`.
    /// An entry already present for the same id is replaced and handed back so
    /// the caller can release its frame.
    pub fn add(
        &mut self,
        mut instance: AppInstance,
        backgrounded_at: DateTime<Utc>,
        timers: &mut TimerRegistry<TimerName>,
    ) -> Option<AppInstance> {
        let app_id = instance.id.clone();
        let timer = TimerName::Eviction(app_id.clone());
        timers.cancel(&timer);

        let previous = self.entries.remove(&app_id).map(|entry| entry.instance);

        instance.state = AppState::Background;
        timers.schedule(timer, self.ttl);
        self.entries.insert(
            app_id.clone(),
            BackgroundEntry {
                instance,
                backgrounded_at,
                eviction_deadline: Instant::now() + self.ttl,
            },
        );

        log_info!(
            "app {} moved to background, evicted in {}s unless restored",
            app_id,
            self.ttl.as_secs()
        );
        self.log_occupancy();
        previous
    }

    /// Takes the instance back out, cancelling its eviction first.
    pub fn restore(
        &mut self,
        app_id: &AppId,
        timers: &mut TimerRegistry<TimerName>,
    ) -> Option<AppInstance> {
        if !self.entries.contains_key(app_id) {
            return None;
        }
        timers.cancel(&TimerName::Eviction(app_id.clone()));
        let entry = self.entries.remove(app_id)?;

        log_info!("app {} restored from background", app_id);
        self.log_occupancy();
        Some(entry.instance)
    }

    /// Driven by the eviction timer. Returns the instance so its frame can be
    /// released; `None` if the entry was already restored.
    pub fn evict(&mut self, app_id: &AppId) -> Option<AppInstance> {
        let entry = self.entries.remove(app_id)?;
        log_info!(
            "app {} evicted after {}s in background",
            app_id,
            self.ttl.as_secs()
        );
        self.log_occupancy();
        Some(entry.instance)
    }

    /// Everything still parked, for shutdown.
    pub fn drain(&mut self, timers: &mut TimerRegistry<TimerName>) -> Vec<AppInstance> {
        self.entries
            .drain()
            .map(|(app_id, entry)| {
                timers.cancel(&TimerName::Eviction(app_id));
                entry.instance
            })
            .collect()
    }

    pub fn contains(&self, app_id: &AppId) -> bool {
        self.entries.contains_key(app_id)
    }

    pub fn get(&self, app_id: &AppId) -> Option<&BackgroundEntry> {
        self.entries.get(app_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(app, time left before eviction)`, soonest first.
    pub fn deadlines(&self) -> Vec<(AppId, Duration)> {
        let now = Instant::now();
        let mut out: Vec<(AppId, Duration)> = self
            .entries
            .iter()
            .map(|(app_id, entry)| {
                (
                    app_id.clone(),
                    entry.eviction_deadline.saturating_duration_since(now),
                )
            })
            .collect();
        out.sort_by_key(|(_, left)| *left);
        out
    }

    fn log_occupancy(&self) {
        log_debug!("background pool holds {} app(s)", self.entries.len());
    }
}
