use std::{collections::HashMap, path::PathBuf};

use anyhow::{anyhow, bail, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{mpsc, oneshot};

use crate::{
    apps::{AppId, AppInstance, AppRegistry, AppState, Frame, FrameId},
    config::{ShellConfig, Timings},
    host::AppHost,
    kv::KvStore,
    presenter::Presenter,
    preview,
    timer::{TimerFired, TimerName, TimerRegistry},
};

use super::{
    background::BackgroundPool,
    events::{AppMessage, Decision, Intent, LoadFailure, SystemMessage},
    load::{LoadAttempt, LoadStage},
    recents::{PushTicket, RecentAppRecord, RecentApps},
};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error, log_info, log_warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum LaunchOutcome {
    /// Brought back from the background pool without reloading.
    Restored,
    /// A load attempt was started.
    Loading,
    /// The app was already in the foreground.
    AlreadyForeground,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackgroundSummary {
    pub app_id: AppId,
    pub evicts_in_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadSummary {
    pub app_id: AppId,
    pub stage: LoadStage,
    pub failure: Option<LoadFailure>,
}

/// Point-in-time view of the kernel, for diagnostics and tests.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KernelSnapshot {
    pub locked: bool,
    pub foreground: Option<AppId>,
    pub foreground_frame: Option<FrameId>,
    pub background: Vec<BackgroundSummary>,
    pub recents: Vec<AppId>,
    pub loading: Vec<LoadSummary>,
    pub armed_timers: Vec<String>,
}

impl KernelSnapshot {
    pub fn in_background(&self, app_id: &AppId) -> bool {
        self.background.iter().any(|entry| &entry.app_id == app_id)
    }

    pub fn attempt(&self, app_id: &AppId) -> Option<&LoadSummary> {
        self.loading.iter().find(|attempt| &attempt.app_id == app_id)
    }

    /// Timers still armed for `app_id`, by display name.
    pub fn timers_for(&self, app_id: &AppId) -> Vec<&str> {
        let suffix = format!(":{app_id}");
        self.armed_timers
            .iter()
            .filter(|name| name.ends_with(&suffix))
            .map(String::as_str)
            .collect()
    }
}

enum Command {
    Launch {
        app_id: AppId,
        reply: oneshot::Sender<Result<LaunchOutcome>>,
    },
    LaunchRecent {
        app_id: AppId,
        reply: oneshot::Sender<Result<LaunchOutcome>>,
    },
    Close {
        reply: oneshot::Sender<()>,
    },
    GoBack {
        reply: oneshot::Sender<bool>,
    },
    Decide {
        app_id: AppId,
        decision: Decision,
        reply: oneshot::Sender<Result<()>>,
    },
    RemoveRecent {
        app_id: AppId,
        reply: oneshot::Sender<bool>,
    },
    ClearRecents {
        reply: oneshot::Sender<()>,
    },
    Message {
        frame: FrameId,
        raw: String,
        reply: oneshot::Sender<Result<()>>,
    },
    SetLocked {
        locked: bool,
        reply: oneshot::Sender<()>,
    },
    Snapshot {
        reply: oneshot::Sender<KernelSnapshot>,
    },
    RecentRecords {
        reply: oneshot::Sender<Vec<RecentAppRecord>>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

enum Event {
    LoadFinished {
        app_id: AppId,
        frame: FrameId,
        outcome: std::result::Result<(), String>,
    },
    Timer(TimerFired<TimerName>),
    PreviewReady {
        ticket: PushTicket,
        record: RecentAppRecord,
    },
}

/// Handed to the host with every load; reports the outcome exactly once.
pub struct LoadReporter {
    app_id: AppId,
    frame: FrameId,
    events: mpsc::UnboundedSender<Event>,
}

impl LoadReporter {
    pub fn app_id(&self) -> &AppId {
        &self.app_id
    }

    pub fn frame(&self) -> FrameId {
        self.frame
    }

    pub fn succeeded(self) {
        self.finish(Ok(()));
    }

    pub fn failed(self, reason: impl Into<String>) {
        self.finish(Err(reason.into()));
    }

    fn finish(self, outcome: std::result::Result<(), String>) {
        let _ = self.events.send(Event::LoadFinished {
            app_id: self.app_id,
            frame: self.frame,
            outcome,
        });
    }
}

/// Cloneable front door to a running [`Kernel`].
#[derive(Clone)]
pub struct KernelHandle {
    commands: mpsc::UnboundedSender<Command>,
}

impl KernelHandle {
    async fn request<T>(&self, build: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.commands
            .send(build(reply_tx))
            .map_err(|_| anyhow!("kernel is not running"))?;
        reply_rx
            .await
            .map_err(|_| anyhow!("kernel stopped before replying"))
    }

    pub async fn launch(&self, app_id: impl Into<AppId>) -> Result<LaunchOutcome> {
        let app_id = app_id.into();
        self.request(move |reply| Command::Launch { app_id, reply })
            .await?
    }

    /// Opens an entry of the recent-apps switcher.
    pub async fn launch_recent(&self, app_id: impl Into<AppId>) -> Result<LaunchOutcome> {
        let app_id = app_id.into();
        self.request(move |reply| Command::LaunchRecent { app_id, reply })
            .await?
    }

    /// Sends the foreground app to the background and shows the home screen.
    pub async fn close(&self) -> Result<()> {
        self.request(|reply| Command::Close { reply }).await
    }

    /// Forwards "back" to the foreground app; false when there is none.
    pub async fn go_back(&self) -> Result<bool> {
        self.request(|reply| Command::GoBack { reply }).await
    }

    pub async fn decide(&self, app_id: impl Into<AppId>, decision: Decision) -> Result<()> {
        let app_id = app_id.into();
        self.request(move |reply| Command::Decide {
            app_id,
            decision,
            reply,
        })
        .await?
    }

    pub async fn remove_recent(&self, app_id: impl Into<AppId>) -> Result<bool> {
        let app_id = app_id.into();
        self.request(move |reply| Command::RemoveRecent { app_id, reply })
            .await
    }

    pub async fn clear_recents(&self) -> Result<()> {
        self.request(|reply| Command::ClearRecents { reply }).await
    }

    /// Delivers a raw `{type: ...}` message posted by the frame `frame`.
    pub async fn deliver_message(&self, frame: FrameId, raw: impl Into<String>) -> Result<()> {
        let raw = raw.into();
        self.request(move |reply| Command::Message { frame, raw, reply })
            .await?
    }

    /// The device-unlock broadcast.
    pub async fn unlocked(&self) -> Result<()> {
        self.request(|reply| Command::SetLocked {
            locked: false,
            reply,
        })
        .await
    }

    pub async fn lock(&self) -> Result<()> {
        self.request(|reply| Command::SetLocked {
            locked: true,
            reply,
        })
        .await
    }

    pub async fn snapshot(&self) -> Result<KernelSnapshot> {
        self.request(|reply| Command::Snapshot { reply }).await
    }

    pub async fn recent_records(&self) -> Result<Vec<RecentAppRecord>> {
        self.request(|reply| Command::RecentRecords { reply }).await
    }

    /// Releases every frame and stops the kernel task.
    pub async fn shutdown(&self) -> Result<()> {
        self.request(|reply| Command::Shutdown { reply }).await
    }
}

/// Owns the foreground slot, the background pool, the recents stack and every
/// in-flight load attempt. Runs as a single task; commands, timer firings and
/// load results are handled one at a time, so nothing here needs a lock.
pub struct Kernel {
    host: Box<dyn AppHost>,
    presenter: Box<dyn Presenter>,
    registry: AppRegistry,
    timings: Timings,
    web_root: PathBuf,
    locked: bool,
    foreground: Option<AppInstance>,
    pool: BackgroundPool,
    recents: RecentApps,
    attempts: HashMap<AppId, LoadAttempt>,
    timers: TimerRegistry<TimerName>,
    events: mpsc::UnboundedSender<Event>,
    next_frame: u64,
}

impl Kernel {
    /// Builds the kernel, reconciles the persisted recents list and starts the
    /// kernel task. Must be called from inside a tokio runtime.
    pub fn spawn(
        config: &ShellConfig,
        store: KvStore,
        host: Box<dyn AppHost>,
        presenter: Box<dyn Presenter>,
    ) -> KernelHandle {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let timer_tx = event_tx.clone();
        let mut timers = TimerRegistry::new(move |fired| {
            let _ = timer_tx.send(Event::Timer(fired));
        });

        let timings = config.timings.clone();
        let recents = RecentApps::load(store, config.recents_capacity, timings.background_ttl());
        recents.arm_restored(&mut timers);

        let kernel = Kernel {
            host,
            presenter,
            registry: AppRegistry::discover(&config.apps),
            pool: BackgroundPool::new(timings.background_ttl()),
            timings,
            web_root: config.web_root.clone(),
            locked: true,
            foreground: None,
            recents,
            attempts: HashMap::new(),
            timers,
            events: event_tx,
            next_frame: 0,
        };

        tokio::spawn(kernel.run(command_rx, event_rx));

        KernelHandle {
            commands: command_tx,
        }
    }

    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut events: mpsc::UnboundedReceiver<Event>,
    ) {
        log_info!(
            "Kernel started with {} app(s) and {} recent app(s)",
            self.registry.len(),
            self.recents.len()
        );

        loop {
            tokio::select! {
                biased;
                Some(event) = events.recv() => self.handle_event(event),
                command = commands.recv() => match command {
                    Some(command) => {
                        if !self.handle_command(command) {
                            break;
                        }
                    }
                    None => {
                        self.shutdown();
                        break;
                    }
                },
            }
        }

        log_info!("Kernel stopped");
    }

    /// Returns false once the kernel should stop.
    fn handle_command(&mut self, command: Command) -> bool {
        match command {
            Command::Launch { app_id, reply } => {
                let _ = reply.send(self.launch(app_id));
            }
            Command::LaunchRecent { app_id, reply } => {
                let _ = reply.send(self.launch_recent(app_id));
            }
            Command::Close { reply } => {
                self.close();
                let _ = reply.send(());
            }
            Command::GoBack { reply } => {
                let _ = reply.send(self.go_back());
            }
            Command::Decide {
                app_id,
                decision,
                reply,
            } => {
                let result = self.decide(app_id, decision);
                if let Err(err) = &result {
                    log_warn!("Rejected decision: {err}");
                }
                let _ = reply.send(result);
            }
            Command::RemoveRecent { app_id, reply } => {
                let _ = reply.send(self.recents.remove(&app_id, &mut self.timers));
            }
            Command::ClearRecents { reply } => {
                self.recents.clear(&mut self.timers);
                let _ = reply.send(());
            }
            Command::Message { frame, raw, reply } => {
                let _ = reply.send(self.on_app_message(frame, &raw));
            }
            Command::SetLocked { locked, reply } => {
                if self.locked != locked {
                    log_info!("Device {}", if locked { "locked" } else { "unlocked" });
                }
                self.locked = locked;
                let _ = reply.send(());
            }
            Command::Snapshot { reply } => {
                let _ = reply.send(self.snapshot());
            }
            Command::RecentRecords { reply } => {
                let _ = reply.send(self.recents.records().to_vec());
            }
            Command::Shutdown { reply } => {
                self.shutdown();
                let _ = reply.send(());
                return false;
            }
        }
        true
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::LoadFinished {
                app_id,
                frame,
                outcome,
            } => self.on_load_finished(app_id, frame, outcome),
            Event::Timer(fired) => self.on_timer(fired),
            Event::PreviewReady { ticket, record } => {
                let app_id = record.app_id.clone();
                if self.recents.complete_push(ticket, record, &mut self.timers)
                    && self.foreground_id() == Some(&app_id)
                {
                    self.recents.suspend_expiry(&app_id, &mut self.timers);
                }
            }
        }
    }

    // ---- launcher ------------------------------------------------------

    fn launch(&mut self, app_id: AppId) -> Result<LaunchOutcome> {
        if self.locked {
            bail!("device is locked; cannot launch {app_id}");
        }

        if let Some(current) = &self.foreground {
            if current.id == app_id {
                self.host.present(current);
                return Ok(LaunchOutcome::AlreadyForeground);
            }
        }

        if self.pool.contains(&app_id) {
            self.background_foreground();
            let instance = self
                .pool
                .restore(&app_id, &mut self.timers)
                .ok_or_else(|| anyhow!("{app_id} vanished from the background pool"))?;
            self.bring_to_foreground(instance);
            return Ok(LaunchOutcome::Restored);
        }

        self.registry.check_launchable(&app_id);
        self.background_foreground();
        self.begin_load(app_id);
        Ok(LaunchOutcome::Loading)
    }

    fn launch_recent(&mut self, app_id: AppId) -> Result<LaunchOutcome> {
        if self.recents.get(&app_id).is_none() {
            bail!("{app_id} is not in recent apps");
        }
        self.launch(app_id)
    }

    fn close(&mut self) {
        self.background_foreground();
        self.host.show_home();
    }

    fn go_back(&mut self) -> bool {
        match &self.foreground {
            Some(instance) => {
                self.host.post_message(instance, SystemMessage::Back);
                true
            }
            None => false,
        }
    }

    fn on_app_message(&mut self, frame: FrameId, raw: &str) -> Result<()> {
        let Some(message) = AppMessage::parse(raw)? else {
            log_warn!("Ignoring unsupported app message {raw}");
            return Ok(());
        };

        let from_foreground = self
            .foreground
            .as_ref()
            .map(|instance| instance.frame_id() == frame)
            .unwrap_or(false);
        if !from_foreground {
            log_warn!("Ignoring {message:?} from {frame}, which is not in the foreground");
            return Ok(());
        }

        match message {
            AppMessage::AppClose => self.close(),
        }
        Ok(())
    }

    fn foreground_id(&self) -> Option<&AppId> {
        self.foreground.as_ref().map(|instance| &instance.id)
    }

    fn bring_to_foreground(&mut self, mut instance: AppInstance) {
        instance.state = AppState::Foreground;
        self.host.present(&instance);
        self.recents.suspend_expiry(&instance.id, &mut self.timers);
        log_info!("{} is now in the foreground", instance.id);
        self.foreground = Some(instance);
    }

    /// Moves the foreground app, if any, to the background pool and the recents stack.
    fn background_foreground(&mut self) {
        let Some(instance) = self.foreground.take() else {
            return;
        };

        let app_id = instance.id.clone();
        let resource_url = instance.frame.url().to_string();
        let backgrounded_at = Utc::now();

        self.host.send_to_background(&instance);
        if let Some(replaced) = self.pool.add(instance, backgrounded_at, &mut self.timers) {
            self.host.release(replaced);
        }
        self.push_recent(app_id, resource_url, backgrounded_at);
    }

    fn push_recent(&mut self, app_id: AppId, resource_url: String, timestamp: DateTime<Utc>) {
        let ticket = self.recents.begin_push(&app_id);
        let events = self.events.clone();
        let web_root = self.web_root.clone();

        tokio::spawn(async move {
            let preview_id = app_id.clone();
            let preview = match tokio::task::spawn_blocking(move || {
                preview::build_preview(&preview_id, &web_root)
            })
            .await
            {
                Ok(Ok(bytes)) => bytes,
                Ok(Err(err)) => {
                    log::warn!("Preview for {app_id} failed: {err:?}");
                    Vec::new()
                }
                Err(err) => {
                    log::warn!("Preview worker for {app_id} failed: {err}");
                    Vec::new()
                }
            };

            let _ = events.send(Event::PreviewReady {
                ticket,
                record: RecentAppRecord {
                    app_id,
                    resource_url,
                    preview,
                    timestamp,
                },
            });
        });
    }

    // ---- load / timeout state machine ------------------------------------

    fn begin_load(&mut self, app_id: AppId) {
        if let Some(previous) = self.attempts.remove(&app_id) {
            log_info!("Restarting load of {app_id}");
            self.discard_attempt(previous);
        }

        self.next_frame += 1;
        let frame = Frame::new(FrameId::new(self.next_frame), app_id.resource_url());
        let instance = AppInstance::loading(app_id.clone(), frame);
        let reporter = LoadReporter {
            app_id: app_id.clone(),
            frame: instance.frame_id(),
            events: self.events.clone(),
        };

        log_info!("Launching {app_id} from {}", instance.frame.url());
        self.host.load(&instance, reporter);
        self.timers
            .schedule(TimerName::SlowLoad(app_id.clone()), self.timings.slow_load());
        self.attempts.insert(app_id, LoadAttempt::begin(instance));
    }

    fn cancel_load_timers(&mut self, app_id: &AppId) {
        self.timers
            .cancel_matching(|name| name.is_load_timer_for(app_id));
    }

    /// Ends an attempt without a foreground app coming out of it: timers first,
    /// then the frame, then the dialog.
    fn discard_attempt(&mut self, mut attempt: LoadAttempt) {
        self.cancel_load_timers(&attempt.app_id);
        if let Some(instance) = attempt.instance.take() {
            self.host.release(instance);
        }
        if attempt.dialog_open {
            self.presenter.present(Intent::Hide {
                app_id: attempt.app_id.clone(),
            });
        }
        if self.foreground.is_none() {
            self.host.show_home();
        }
    }

    fn on_load_finished(
        &mut self,
        app_id: AppId,
        frame: FrameId,
        outcome: std::result::Result<(), String>,
    ) {
        let owned = self
            .attempts
            .get(&app_id)
            .map(|attempt| attempt.owns_frame(frame))
            .unwrap_or(false);
        if !owned {
            log_debug!("Ignoring stale load result for {app_id} ({frame})");
            return;
        }
        let Some(mut attempt) = self.attempts.remove(&app_id) else {
            return;
        };
        self.cancel_load_timers(&app_id);

        match outcome {
            Ok(()) => {
                let Some(instance) = attempt.instance.take() else {
                    return;
                };
                log_info!(
                    "{app_id} loaded in {}ms",
                    attempt.started_at.elapsed().as_millis()
                );
                if attempt.dialog_open {
                    self.presenter.present(Intent::Hide {
                        app_id: app_id.clone(),
                    });
                }
                // Another launch may have finished first.
                self.background_foreground();
                self.bring_to_foreground(instance);
            }
            Err(reason) => {
                log_error!("Failed to load {app_id}: {reason}");
                if let Some(mut instance) = attempt.instance.take() {
                    instance.state = AppState::Failed;
                    self.host.release(instance);
                }
                attempt.stage = LoadStage::Failed;
                attempt.failure = Some(LoadFailure::NetworkFailure);
                attempt.dialog_open = true;
                self.presenter.present(Intent::network_error(&app_id));
                if self.foreground.is_none() {
                    self.host.show_home();
                }
                self.attempts.insert(app_id, attempt);
            }
        }
    }

    fn on_timer(&mut self, fired: TimerFired<TimerName>) {
        if !self.timers.accept(&fired) {
            return;
        }

        match fired.name {
            TimerName::SlowLoad(app_id) => self.on_slow_load(app_id),
            TimerName::WaitProgress(app_id) => self.on_wait_progress(app_id),
            TimerName::FinalTimeout(app_id) => self.on_final_timeout(app_id),
            TimerName::Eviction(app_id) => self.on_eviction(app_id),
            TimerName::RecentExpiry(app_id) => {
                self.recents.expire(&app_id, &mut self.timers);
            }
        }
    }

    fn on_slow_load(&mut self, app_id: AppId) {
        let Some(attempt) = self.attempts.get_mut(&app_id) else {
            return;
        };
        if attempt.stage != LoadStage::First {
            return;
        }

        log_warn!("{app_id} has not loaded within {:?}", self.timings.slow_load());
        attempt.failure = Some(LoadFailure::TimeoutFirst);
        attempt.dialog_open = true;
        self.presenter.present(Intent::first_timeout(&app_id));
    }

    fn on_wait_progress(&mut self, app_id: AppId) {
        let percent = match self.attempts.get(&app_id) {
            Some(attempt) if attempt.stage == LoadStage::Waiting => {
                attempt.waiting_percent(self.timings.wait())
            }
            _ => {
                self.timers.cancel(&TimerName::WaitProgress(app_id));
                return;
            }
        };
        self.presenter
            .present(Intent::ShowProgress { app_id, percent });
    }

    fn on_final_timeout(&mut self, app_id: AppId) {
        let waiting = self
            .attempts
            .get(&app_id)
            .map(|attempt| attempt.stage == LoadStage::Waiting)
            .unwrap_or(false);
        if !waiting {
            return;
        }

        self.cancel_load_timers(&app_id);
        let Some(attempt) = self.attempts.get_mut(&app_id) else {
            return;
        };
        log_warn!("{app_id} did not load after waiting; giving up");
        attempt.stage = LoadStage::Final;
        attempt.failure = Some(LoadFailure::TimeoutFinal);
        let released = attempt.instance.take();

        if let Some(mut instance) = released {
            instance.state = AppState::Failed;
            self.host.release(instance);
        }
        self.presenter.present(Intent::final_timeout(&app_id));
        if self.foreground.is_none() {
            self.host.show_home();
        }
    }

    fn decide(&mut self, app_id: AppId, decision: Decision) -> Result<()> {
        let Some(attempt) = self.attempts.get_mut(&app_id) else {
            bail!("no pending launch of {app_id}");
        };
        if !attempt.offers(decision) {
            bail!(
                "{decision} is not offered for {app_id} in stage {:?}",
                attempt.stage
            );
        }
        if decision == Decision::Retry && self.locked {
            bail!("device is locked; cannot retry {app_id}");
        }

        log_info!("User chose {decision} for {app_id}");
        match decision {
            Decision::Wait => {
                attempt.start_waiting();
                self.timers.cancel(&TimerName::SlowLoad(app_id.clone()));
                self.timers.schedule_repeating(
                    TimerName::WaitProgress(app_id.clone()),
                    self.timings.progress_tick(),
                );
                self.timers
                    .schedule(TimerName::FinalTimeout(app_id.clone()), self.timings.wait());
                self.presenter.present(Intent::ShowProgress {
                    app_id,
                    percent: 0,
                });
            }
            Decision::Dismiss => {
                if let Some(attempt) = self.attempts.remove(&app_id) {
                    self.discard_attempt(attempt);
                }
            }
            Decision::Retry => {
                if let Some(attempt) = self.attempts.remove(&app_id) {
                    self.discard_attempt(attempt);
                }
                self.launch(app_id)?;
            }
        }
        Ok(())
    }

    // ---- background pool -------------------------------------------------

    fn on_eviction(&mut self, app_id: AppId) {
        if let Some(instance) = self.pool.evict(&app_id) {
            self.host.release(instance);
        }
        self.recents.expire(&app_id, &mut self.timers);
    }

    // ---- housekeeping ----------------------------------------------------

    fn snapshot(&self) -> KernelSnapshot {
        let mut loading: Vec<LoadSummary> = self
            .attempts
            .values()
            .map(|attempt| LoadSummary {
                app_id: attempt.app_id.clone(),
                stage: attempt.stage,
                failure: attempt.failure,
            })
            .collect();
        loading.sort_by(|a, b| a.app_id.cmp(&b.app_id));

        let mut armed_timers: Vec<String> =
            self.timers.armed_names().map(ToString::to_string).collect();
        armed_timers.sort();

        KernelSnapshot {
            locked: self.locked,
            foreground: self.foreground_id().cloned(),
            foreground_frame: self.foreground.as_ref().map(AppInstance::frame_id),
            background: self
                .pool
                .deadlines()
                .into_iter()
                .map(|(app_id, left)| BackgroundSummary {
                    app_id,
                    evicts_in_ms: left.as_millis() as u64,
                })
                .collect(),
            recents: self
                .recents
                .records()
                .iter()
                .map(|record| record.app_id.clone())
                .collect(),
            loading,
            armed_timers,
        }
    }

    fn shutdown(&mut self) {
        self.timers.cancel_all();
        if let Some(instance) = self.foreground.take() {
            self.host.release(instance);
        }
        for instance in self.pool.drain(&mut self.timers) {
            self.host.release(instance);
        }
        let attempts: Vec<LoadAttempt> = self.attempts.drain().map(|(_, attempt)| attempt).collect();
        for mut attempt in attempts {
            if let Some(instance) = attempt.instance.take() {
                self.host.release(instance);
            }
        }
        log_info!("Kernel released all frames");
    }
}
