use serde::{Deserialize, Serialize};
use std::{collections::BTreeSet, fmt};

const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

/// Opaque name of an app, e.g. `"calcul"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AppId(String);

impl AppId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Fixed naming rule; there is no lookup table behind it.
    pub fn resource_url(&self) -> String {
        format!("app/com.{}.los.html", self.0)
    }

    /// Human-readable name for dialogs, falling back to the raw id.
    pub fn label(&self) -> String {
        let label = match self.0.as_str() {
            "camera" => "Camera",
            "gallery" => "Gallery",
            "calcul" => "Calculator",
            "notes" => "Notes",
            "security" => "Security",
            "browser" => "Browser",
            "mail" => "Mail",
            other => other,
        };
        label.to_string()
    }
}

impl fmt::Display for AppId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AppId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for AppId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// The set of apps declared on the home screen.
#[derive(Debug, Clone, Default)]
pub struct AppRegistry {
    apps: BTreeSet<AppId>,
}

impl AppRegistry {
    /// Enumerates the declared affordances once at startup. Blank and duplicate
    /// entries are skipped.
    pub fn discover<I, S>(declared: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let apps: BTreeSet<AppId> = declared
            .into_iter()
            .map(|name| name.as_ref().trim().to_string())
            .filter(|name| !name.is_empty())
            .map(AppId::from)
            .collect();

        log_info!("Discovered {} apps", apps.len());
        Self { apps }
    }

    pub fn contains(&self, app_id: &AppId) -> bool {
        self.apps.contains(app_id)
    }

    pub fn apps(&self) -> impl Iterator<Item = &AppId> {
        self.apps.iter()
    }

    pub fn len(&self) -> usize {
        self.apps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.apps.is_empty()
    }

    /// Undeclared ids are still launchable; they fail through the normal load path.
    pub fn check_launchable(&self, app_id: &AppId) {
        if !self.contains(app_id) {
            log_warn!(
                "Launching undeclared app '{}' ({}); it will fail like any unreachable resource",
                app_id,
                app_id.resource_url()
            );
        }
    }
}
