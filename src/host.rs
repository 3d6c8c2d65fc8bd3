use std::path::PathBuf;

use crate::{
    apps::AppInstance,
    lifecycle::{LoadReporter, SystemMessage},
};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info, log_warn};

/// The surface that actually hosts app frames. Calls arrive on the kernel task
/// and must not block; a load reports back later through its [`LoadReporter`].
pub trait AppHost: Send + 'static {
    /// Starts loading the instance's frame.
    fn load(&mut self, instance: &AppInstance, reporter: LoadReporter);
    /// Shows the instance full-screen and hides the home screen.
    fn present(&mut self, instance: &AppInstance);
    /// Keeps the frame alive but off-screen.
    fn send_to_background(&mut self, instance: &AppInstance);
    fn show_home(&mut self);
    /// Destroys the frame.
    fn release(&mut self, instance: AppInstance);
    fn post_message(&mut self, instance: &AppInstance, message: SystemMessage);
}

/// Host backed by the files under a web root: a frame "loads" when its
/// resource exists and fails otherwise.
pub struct FileAppHost {
    web_root: PathBuf,
}

impl FileAppHost {
    pub fn new(web_root: PathBuf) -> Self {
        Self { web_root }
    }
}

impl AppHost for FileAppHost {
    fn load(&mut self, instance: &AppInstance, reporter: LoadReporter) {
        let path = self.web_root.join(instance.frame.url());
        log_info!("Loading {} from {}", instance.id, path.display());

        tokio::spawn(async move {
            match tokio::fs::metadata(&path).await {
                Ok(meta) if meta.is_file() => reporter.succeeded(),
                Ok(_) => reporter.failed(format!("{} is not a file", path.display())),
                Err(err) => reporter.failed(format!("{}: {err}", path.display())),
            }
        });
    }

    fn present(&mut self, instance: &AppInstance) {
        log_info!("Presenting {} ({})", instance.id, instance.frame_id());
    }

    fn send_to_background(&mut self, instance: &AppInstance) {
        log_debug!("Moving {} off-screen", instance.id);
    }

    fn show_home(&mut self) {
        log_debug!("Showing home screen");
    }

    fn release(&mut self, instance: AppInstance) {
        log_info!(
            "Released {} ({}, was {:?})",
            instance.id,
            instance.frame_id(),
            instance.state
        );
    }

    fn post_message(&mut self, instance: &AppInstance, message: SystemMessage) {
        match serde_json::to_string(&message) {
            Ok(payload) => log_info!("Posting {} to {}", payload, instance.id),
            Err(err) => log_warn!("Could not encode {message:?}: {err}"),
        }
    }
}
