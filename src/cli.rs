//! Line-oriented driver used by the binary in place of a touch screen.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use crate::{
    apps::AppId,
    db::{
        models::{LockKind, PHOTO_MEDIA_TYPE},
        Database,
    },
    lifecycle::{Decision, KernelHandle},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliCommand {
    Launch(AppId),
    Close,
    Back,
    Recents,
    OpenRecent(AppId),
    RemoveRecent(AppId),
    ClearRecents,
    Decide(AppId, Decision),
    Unlock,
    Lock,
    /// Raw JSON posted by the foreground app.
    Message(String),
    /// Stores the lock-screen digest handed over by the lock screen.
    SetLock(LockKind, String),
    ClearLock,
    /// Imports an image file into the photo library.
    AddPhoto(PathBuf),
    Status,
    Help,
    Quit,
}

pub const HELP: &str = "commands: launch <id> | close | back | recents | open-recent <id> | \
remove-recent <id> | clear-recents | wait|dismiss|retry <id> | unlock | lock | \
message <json> | set-lock pin|pattern <hex> | clear-lock | add-photo <path> | status | quit";

fn app_arg(command: &str, rest: &str) -> Result<AppId> {
    let id = rest.trim();
    if id.is_empty() || id.contains(char::is_whitespace) {
        bail!("usage: {command} <app id>");
    }
    Ok(AppId::from(id))
}

/// `Ok(None)` for blank lines.
pub fn parse_line(line: &str) -> Result<Option<CliCommand>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (command, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let parsed = match command {
        "launch" => CliCommand::Launch(app_arg(command, rest)?),
        "close" => CliCommand::Close,
        "back" => CliCommand::Back,
        "recents" => CliCommand::Recents,
        "open-recent" => CliCommand::OpenRecent(app_arg(command, rest)?),
        "remove-recent" => CliCommand::RemoveRecent(app_arg(command, rest)?),
        "clear-recents" => CliCommand::ClearRecents,
        "wait" => CliCommand::Decide(app_arg(command, rest)?, Decision::Wait),
        "dismiss" => CliCommand::Decide(app_arg(command, rest)?, Decision::Dismiss),
        "retry" => CliCommand::Decide(app_arg(command, rest)?, Decision::Retry),
        "unlock" => CliCommand::Unlock,
        "lock" => CliCommand::Lock,
        "message" => {
            let raw = rest.trim();
            if raw.is_empty() {
                bail!("usage: message <json>");
            }
            CliCommand::Message(raw.to_string())
        }
        "set-lock" => {
            let mut args = rest.split_whitespace();
            match (args.next(), args.next(), args.next()) {
                (Some(kind), Some(hash), None) => {
                    CliCommand::SetLock(LockKind::parse(kind)?, hash.to_string())
                }
                _ => bail!("usage: set-lock pin|pattern <hex>"),
            }
        }
        "clear-lock" => CliCommand::ClearLock,
        "add-photo" => {
            let path = rest.trim();
            if path.is_empty() {
                bail!("usage: add-photo <path>");
            }
            CliCommand::AddPhoto(PathBuf::from(path))
        }
        "status" => CliCommand::Status,
        "help" | "?" => CliCommand::Help,
        "quit" | "exit" => CliCommand::Quit,
        other => bail!("unknown command {other:?}; {HELP}"),
    };
    Ok(Some(parsed))
}

/// Runs one command against the kernel. Returns false when the driver should stop.
pub async fn execute(handle: &KernelHandle, db: &Database, command: CliCommand) -> Result<bool> {
    match command {
        CliCommand::Launch(app_id) => {
            let outcome = handle.launch(app_id.clone()).await?;
            log::info!("launch {app_id}: {outcome:?}");
        }
        CliCommand::Close => handle.close().await?,
        CliCommand::Back => {
            if !handle.go_back().await? {
                log::info!("no app in the foreground");
            }
        }
        CliCommand::Recents => {
            let records = handle.recent_records().await?;
            if records.is_empty() {
                log::info!("no recent apps");
            }
            for record in records {
                log::info!(
                    "{} ({}) since {} preview {} bytes",
                    record.app_id,
                    record.resource_url,
                    record.timestamp.to_rfc3339(),
                    record.preview.len()
                );
            }
        }
        CliCommand::OpenRecent(app_id) => {
            let outcome = handle.launch_recent(app_id.clone()).await?;
            log::info!("open recent {app_id}: {outcome:?}");
        }
        CliCommand::RemoveRecent(app_id) => {
            if !handle.remove_recent(app_id.clone()).await? {
                log::info!("{app_id} was not in recent apps");
            }
        }
        CliCommand::ClearRecents => handle.clear_recents().await?,
        CliCommand::Decide(app_id, decision) => handle.decide(app_id, decision).await?,
        CliCommand::Unlock => handle.unlocked().await?,
        CliCommand::Lock => handle.lock().await?,
        CliCommand::Message(raw) => {
            let snapshot = handle.snapshot().await?;
            let frame = snapshot
                .foreground_frame
                .context("no app in the foreground to send the message")?;
            handle.deliver_message(frame, raw).await?;
        }
        CliCommand::SetLock(kind, hash) => {
            let credential = db.set_lock_credential(kind, hash).await?;
            log::info!("lock credential set ({:?})", credential.kind);
        }
        CliCommand::ClearLock => {
            if !db.clear_lock_credential().await? {
                log::info!("no lock credential to clear");
            }
        }
        CliCommand::AddPhoto(path) => {
            let data = tokio::fs::read(&path)
                .await
                .with_context(|| format!("failed to read {}", path.display()))?;
            let format = image::guess_format(&data)
                .with_context(|| format!("{} is not a supported image", path.display()))?;
            let record = db
                .insert_media(PHOTO_MEDIA_TYPE, format.to_mime_type(), data)
                .await?;
            log::info!("added photo {} ({})", record.id, record.mime);
        }
        CliCommand::Status => {
            let snapshot = handle.snapshot().await?;
            log::info!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
        CliCommand::Help => log::info!("{HELP}"),
        CliCommand::Quit => return Ok(false),
    }
    Ok(true)
}
