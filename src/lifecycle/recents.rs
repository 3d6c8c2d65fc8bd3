use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, time::Duration};

use crate::{
    apps::AppId,
    kv::KvStore,
    timer::{TimerName, TimerRegistry},
};

const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info, log_warn};

pub const RECENT_APPS_KEY: &str = "recentApps";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentAppRecord {
    pub app_id: AppId,
    pub resource_url: String,
    /// PNG bytes of the synthesised thumbnail.
    #[serde(default)]
    pub preview: Vec<u8>,
    /// When the app left the foreground; expiry is measured from here.
    pub timestamp: DateTime<Utc>,
}

impl RecentAppRecord {
    /// Time left before the record goes stale, `None` once it has.
    pub fn remaining(&self, ttl: Duration, now: DateTime<Utc>) -> Option<Duration> {
        let age = now
            .signed_duration_since(self.timestamp)
            .to_std()
            .unwrap_or(Duration::ZERO);
        ttl.checked_sub(age).filter(|left| !left.is_zero())
    }
}

/// Identifies one outstanding push while its preview renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PushTicket(u64);

/// Bounded most-recent-first list of apps that left the foreground, persisted
/// under [`RECENT_APPS_KEY`] after every change.
pub struct RecentApps {
    records: Vec<RecentAppRecord>,
    capacity: usize,
    ttl: Duration,
    store: KvStore,
    pending: HashMap<AppId, PushTicket>,
    next_ticket: u64,
}

impl RecentApps {
    /// Loads the persisted list, drops stale records and re-saves the survivors.
    /// Survivors' expiry timers are armed by [`RecentApps::arm_restored`].
    pub fn load(store: KvStore, capacity: usize, ttl: Duration) -> Self {
        let saved: Vec<RecentAppRecord> = match store.get(RECENT_APPS_KEY) {
            Ok(Some(records)) => records,
            Ok(None) => Vec::new(),
            Err(err) => {
                log_error!("Failed to load recent apps: {err:?}");
                Vec::new()
            }
        };

        let now = Utc::now();
        let total = saved.len();
        let mut records: Vec<RecentAppRecord> = saved
            .into_iter()
            .filter(|record| record.remaining(ttl, now).is_some())
            .collect();
        records.truncate(capacity);

        if total != records.len() {
            log_info!(
                "Dropped {} stale recent app(s) on load",
                total - records.len()
            );
        }

        let recents = Self {
            records,
            capacity,
            ttl,
            store,
            pending: HashMap::new(),
            next_ticket: 0,
        };
        if total > 0 {
            recents.persist();
        }
        recents
    }

    /// Arms expiry for records that survived [`RecentApps::load`], using the
    /// time they have left rather than a fresh window.
    pub fn arm_restored(&self, timers: &mut TimerRegistry<TimerName>) {
        let now = Utc::now();
        for record in &self.records {
            if let Some(left) = record.remaining(self.ttl, now) {
                timers.schedule(TimerName::RecentExpiry(record.app_id.clone()), left);
            }
        }
    }

    /// Reserves a push for `app_id`. The record is only inserted once
    /// [`RecentApps::complete_push`] is called with the same ticket.
    pub fn begin_push(&mut self, app_id: &AppId) -> PushTicket {
        self.next_ticket += 1;
        let ticket = PushTicket(self.next_ticket);
        self.pending.insert(app_id.clone(), ticket);
        ticket
    }

    /// Inserts `record` by its timestamp, newest first, dropping any older record
    /// for the same app and anything beyond capacity. Previews render
    /// concurrently, so completions may arrive out of order. Returns false when
    /// the push was superseded or cancelled while its preview rendered.
    pub fn complete_push(
        &mut self,
        ticket: PushTicket,
        record: RecentAppRecord,
        timers: &mut TimerRegistry<TimerName>,
    ) -> bool {
        if self.pending.get(&record.app_id) != Some(&ticket) {
            log_info!("Discarding superseded recents push for {}", record.app_id);
            return false;
        }
        self.pending.remove(&record.app_id);

        let app_id = record.app_id.clone();
        let left = record
            .remaining(self.ttl, Utc::now())
            .unwrap_or(Duration::ZERO);

        self.records.retain(|existing| existing.app_id != app_id);
        let position = self
            .records
            .iter()
            .position(|existing| existing.timestamp <= record.timestamp)
            .unwrap_or(self.records.len());
        self.records.insert(position, record);
        for dropped in self.records.split_off(self.capacity.min(self.records.len())) {
            timers.cancel(&TimerName::RecentExpiry(dropped.app_id));
        }

        self.persist();
        if self.get(&app_id).is_some() {
            timers.schedule(TimerName::RecentExpiry(app_id.clone()), left);
        }
        log_info!("Added {} to recent apps ({} total)", app_id, self.records.len());
        true
    }

    /// Explicit removal by the user.
    pub fn remove(&mut self, app_id: &AppId, timers: &mut TimerRegistry<TimerName>) -> bool {
        self.pending.remove(app_id);
        timers.cancel(&TimerName::RecentExpiry(app_id.clone()));
        self.drop_record(app_id)
    }

    /// Staleness or eviction of the underlying instance. The record may already
    /// be gone; that is fine.
    pub fn expire(&mut self, app_id: &AppId, timers: &mut TimerRegistry<TimerName>) -> bool {
        timers.cancel(&TimerName::RecentExpiry(app_id.clone()));
        let removed = self.drop_record(app_id);
        if removed {
            log_info!("Recent app {} expired", app_id);
        }
        removed
    }

    pub fn clear(&mut self, timers: &mut TimerRegistry<TimerName>) {
        self.records.clear();
        self.pending.clear();
        timers.cancel_matching(|name| matches!(name, TimerName::RecentExpiry(_)));
        self.persist();
        log_info!("Cleared recent apps");
    }

    /// While an app is in the foreground its record cannot go stale.
    pub fn suspend_expiry(&mut self, app_id: &AppId, timers: &mut TimerRegistry<TimerName>) {
        timers.cancel(&TimerName::RecentExpiry(app_id.clone()));
    }

    pub fn records(&self) -> &[RecentAppRecord] {
        &self.records
    }

    pub fn get(&self, app_id: &AppId) -> Option<&RecentAppRecord> {
        self.records.iter().find(|record| &record.app_id == app_id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn drop_record(&mut self, app_id: &AppId) -> bool {
        let before = self.records.len();
        self.records.retain(|record| &record.app_id != app_id);
        let removed = self.records.len() != before;
        if removed {
            self.persist();
        }
        removed
    }

    fn persist(&self) {
        if let Err(err) = self.store.set(RECENT_APPS_KEY, &self.records) {
            log_warn!("Failed to save recent apps: {err:?}");
        }
    }
}
