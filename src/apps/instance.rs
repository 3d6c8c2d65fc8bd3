use serde::{Deserialize, Serialize};
use std::fmt;

use super::AppId;

/// Identity of one frame. Never reused, so a load signal for a frame that has
/// since been released can be recognised as stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrameId(u64);

impl FrameId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "frame#{}", self.0)
    }
}

/// The hosted resource of an app. Not `Clone`: whichever slot holds
/// the frame owns it, and it is handed back to the host to be released.
#[derive(Debug)]
pub struct Frame {
    id: FrameId,
    url: String,
}

impl Frame {
    pub(crate) fn new(id: FrameId, url: String) -> Self {
        Self { id, url }
    }

    pub fn id(&self) -> FrameId {
        self.id
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AppState {
    Loading,
    Foreground,
    Background,
    Failed,
}

#[derive(Debug)]
pub struct AppInstance {
    pub id: AppId,
    pub frame: Frame,
    pub state: AppState,
}

impl AppInstance {
    pub fn loading(id: AppId, frame: Frame) -> Self {
        Self {
            id,
            frame,
            state: AppState::Loading,
        }
    }

    pub fn frame_id(&self) -> FrameId {
        self.frame.id()
    }
}
