use crate::lifecycle::{Decision, Intent, TimeoutStage};

/// Renders the dialogs the shell asks for. Answers come back through
/// `KernelHandle::decide`.
pub trait Presenter: Send + 'static {
    fn present(&mut self, intent: Intent);
}

/// Writes every intent to the log; used by the command-line driver.
#[derive(Debug, Default)]
pub struct LogPresenter;

impl Presenter for LogPresenter {
    fn present(&mut self, intent: Intent) {
        match intent {
            Intent::ShowTimeout {
                app_id,
                label,
                stage,
                actions,
            } => {
                let message = match stage {
                    TimeoutStage::First => format!("\"{label}\" is taking long to load."),
                    TimeoutStage::Final => format!("\"{label}\" is unavailable."),
                };
                log::warn!(
                    "[dialog] App not responding: {message} ({})",
                    describe_actions(&app_id.to_string(), &actions)
                );
            }
            Intent::ShowNetworkError {
                app_id,
                label,
                actions,
            } => {
                log::warn!(
                    "[dialog] Network error: could not load \"{label}\". ({})",
                    describe_actions(&app_id.to_string(), &actions)
                );
            }
            Intent::ShowProgress { app_id, percent } => {
                // Every tenth percent is enough for a log.
                if percent % 10 == 0 {
                    log::info!("[dialog] waiting for {app_id}: {percent}%");
                }
            }
            Intent::Hide { app_id } => log::info!("[dialog] closed for {app_id}"),
        }
    }
}

fn describe_actions(app_id: &str, actions: &[Decision]) -> String {
    actions
        .iter()
        .map(|decision| format!("`{decision} {app_id}`"))
        .collect::<Vec<_>>()
        .join(" or ")
}
