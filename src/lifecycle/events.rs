use serde::{Deserialize, Serialize};
use std::fmt;

use crate::apps::AppId;

/// What the user may answer to a dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Decision {
    Dismiss,
    Wait,
    Retry,
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Decision::Dismiss => "dismiss",
            Decision::Wait => "wait",
            Decision::Retry => "retry",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TimeoutStage {
    First,
    Final,
}

/// Failure kinds of a launch. An unresolvable app id has no kind of its own:
/// it simply never loads and ends up as `NetworkFailure` or a timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LoadFailure {
    TimeoutFirst,
    TimeoutFinal,
    NetworkFailure,
}

/// Everything the shell asks the presentation layer to show.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Intent {
    #[serde(rename_all = "camelCase")]
    ShowTimeout {
        app_id: AppId,
        label: String,
        stage: TimeoutStage,
        actions: Vec<Decision>,
    },
    #[serde(rename_all = "camelCase")]
    ShowNetworkError {
        app_id: AppId,
        label: String,
        actions: Vec<Decision>,
    },
    #[serde(rename_all = "camelCase")]
    ShowProgress { app_id: AppId, percent: u8 },
    #[serde(rename_all = "camelCase")]
    Hide { app_id: AppId },
}

impl Intent {
    pub fn first_timeout(app_id: &AppId) -> Self {
        Intent::ShowTimeout {
            app_id: app_id.clone(),
            label: app_id.label(),
            stage: TimeoutStage::First,
            actions: vec![Decision::Dismiss, Decision::Wait],
        }
    }

    pub fn final_timeout(app_id: &AppId) -> Self {
        Intent::ShowTimeout {
            app_id: app_id.clone(),
            label: app_id.label(),
            stage: TimeoutStage::Final,
            actions: vec![Decision::Dismiss],
        }
    }

    pub fn network_error(app_id: &AppId) -> Self {
        Intent::ShowNetworkError {
            app_id: app_id.clone(),
            label: app_id.label(),
            actions: vec![Decision::Dismiss, Decision::Retry],
        }
    }

    pub fn app_id(&self) -> &AppId {
        match self {
            Intent::ShowTimeout { app_id, .. }
            | Intent::ShowNetworkError { app_id, .. }
            | Intent::ShowProgress { app_id, .. }
            | Intent::Hide { app_id } => app_id,
        }
    }
}

/// Messages a hosted app sends to the shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum AppMessage {
    AppClose,
}

impl AppMessage {
    /// `None` for well-formed messages of a type the shell does not handle.
    pub fn parse(raw: &str) -> anyhow::Result<Option<Self>> {
        #[derive(Deserialize)]
        struct Envelope {
            #[serde(rename = "type")]
            kind: String,
        }

        let envelope: Envelope = serde_json::from_str(raw)?;
        match envelope.kind.as_str() {
            "app-close" => Ok(Some(AppMessage::AppClose)),
            _ => Ok(None),
        }
    }
}

/// Messages the shell forwards to the foreground app.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum SystemMessage {
    #[serde(rename = "system-back")]
    Back,
}
