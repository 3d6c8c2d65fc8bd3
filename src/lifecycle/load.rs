use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;

use crate::apps::{AppId, AppInstance, FrameId};

use super::events::{Decision, LoadFailure};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LoadStage {
    /// Loading, slow timer armed.
    First,
    /// Loading, user chose to wait; progress and final timers armed.
    Waiting,
    /// Gave up; frame released, waiting for the user to acknowledge.
    Final,
    /// Load reported an error; frame released, dismiss or retry pending.
    Failed,
}

impl LoadStage {
    pub fn is_loading(self) -> bool {
        matches!(self, LoadStage::First | LoadStage::Waiting)
    }

    /// Decisions the dialog of this stage offers.
    pub fn accepts(self, decision: Decision) -> bool {
        match decision {
            Decision::Dismiss => true,
            Decision::Wait => self == LoadStage::First,
            Decision::Retry => self == LoadStage::Failed,
        }
    }
}

/// One in-flight launch. Owns the loading instance until it either becomes the
/// foreground app or is discarded.
#[derive(Debug)]
pub struct LoadAttempt {
    pub app_id: AppId,
    pub stage: LoadStage,
    pub started_at: Instant,
    pub waiting_since: Option<Instant>,
    pub failure: Option<LoadFailure>,
    /// Only present while the stage is loading.
    pub instance: Option<AppInstance>,
    /// Whether a dialog for this attempt is currently on screen.
    pub dialog_open: bool,
}

impl LoadAttempt {
    pub fn begin(instance: AppInstance) -> Self {
        Self {
            app_id: instance.id.clone(),
            stage: LoadStage::First,
            started_at: Instant::now(),
            waiting_since: None,
            failure: None,
            instance: Some(instance),
            dialog_open: false,
        }
    }

    /// True when a load signal for `frame` belongs to this attempt.
    pub fn owns_frame(&self, frame: FrameId) -> bool {
        self.stage.is_loading()
            && self
                .instance
                .as_ref()
                .map(|instance| instance.frame_id() == frame)
                .unwrap_or(false)
    }

    pub fn frame_id(&self) -> Option<FrameId> {
        self.instance.as_ref().map(AppInstance::frame_id)
    }

    /// A decision is only offered while this attempt's dialog is on screen,
    /// so nothing can be decided in `First` before the slow timer fires.
    pub fn offers(&self, decision: Decision) -> bool {
        self.dialog_open && self.stage.accepts(decision)
    }

    pub fn start_waiting(&mut self) {
        self.stage = LoadStage::Waiting;
        self.waiting_since = Some(Instant::now());
        self.dialog_open = true;
    }

    pub fn waiting_percent(&self, window: Duration) -> u8 {
        match self.waiting_since {
            Some(since) => progress_percent(since.elapsed(), window),
            None => 0,
        }
    }
}

/// Elapsed share of the wait window, clamped to 0..=100.
pub fn progress_percent(elapsed: Duration, window: Duration) -> u8 {
    if window.is_zero() {
        return 100;
    }
    let ratio = elapsed.as_secs_f64() / window.as_secs_f64();
    (ratio * 100.0).round().clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_is_clamped_and_rounded() {
        let window = Duration::from_secs(30);
        assert_eq!(progress_percent(Duration::ZERO, window), 0);
        assert_eq!(progress_percent(Duration::from_secs(15), window), 50);
        assert_eq!(progress_percent(Duration::from_millis(100), window), 0);
        assert_eq!(progress_percent(Duration::from_millis(300), window), 1);
        assert_eq!(progress_percent(Duration::from_secs(45), window), 100);
        assert_eq!(progress_percent(Duration::from_secs(1), Duration::ZERO), 100);
    }

    #[test]
    fn nothing_is_offered_before_the_dialog_opens() {
        let frame = crate::apps::Frame::new(FrameId::new(1), "app/com.gallery.los.html".into());
        let mut attempt = LoadAttempt::begin(AppInstance::loading(AppId::from("gallery"), frame));
        assert!(!attempt.offers(Decision::Wait));
        assert!(!attempt.offers(Decision::Dismiss));

        attempt.dialog_open = true;
        assert!(attempt.offers(Decision::Wait));
        assert!(attempt.offers(Decision::Dismiss));
        assert!(!attempt.offers(Decision::Retry));
    }

    #[test]
    fn offered_decisions_per_stage() {
        assert!(LoadStage::First.accepts(Decision::Wait));
        assert!(LoadStage::First.accepts(Decision::Dismiss));
        assert!(!LoadStage::First.accepts(Decision::Retry));

        assert!(LoadStage::Waiting.accepts(Decision::Dismiss));
        assert!(!LoadStage::Waiting.accepts(Decision::Wait));

        assert!(LoadStage::Final.accepts(Decision::Dismiss));
        assert!(!LoadStage::Final.accepts(Decision::Wait));
        assert!(!LoadStage::Final.accepts(Decision::Retry));

        assert!(LoadStage::Failed.accepts(Decision::Retry));
        assert!(!LoadStage::Failed.accepts(Decision::Wait));
    }
}
