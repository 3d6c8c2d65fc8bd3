use std::{
    path::{Path, PathBuf},
    sync::{mpsc, Arc, Mutex},
    thread::{self, JoinHandle},
};

use anyhow::{anyhow, Context, Result};
use log::{error, info};
use rusqlite::Connection;
use tokio::sync::oneshot;

pub mod helpers;
mod migrations;
pub mod models;
pub mod repositories;

use migrations::run_migrations;

type DbTask = Box<dyn FnOnce(&mut Connection) + Send + 'static>;

enum DbCommand {
    Execute(DbTask),
    Shutdown,
}

struct DatabaseInner {
    sender: mpsc::Sender<DbCommand>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for DatabaseInner {
    fn drop(&mut self) {
        let mut guard = match self.worker.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(handle) = guard.take() {
            if let Err(err) = self.sender.send(DbCommand::Shutdown) {
                error!("Failed to send shutdown to DB thread: {err}");
            }
            if let Err(join_err) = handle.join() {
                error!("Failed to join DB thread: {join_err:?}");
            }
        }
    }
}

/// Document store for the lock credential and media. SQLite runs on its own
/// thread; callers queue closures through [`Database::execute`].
#[derive(Clone)]
pub struct Database {
    inner: Arc<DatabaseInner>,
    db_path: Arc<PathBuf>,
}

impl Database {
    pub fn new(db_path: PathBuf) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create database directory {}", parent.display())
            })?;
        }

        let (command_tx, command_rx) = mpsc::channel::<DbCommand>();
        let (ready_tx, ready_rx) = mpsc::channel();
        let path_for_thread = db_path.clone();

        let worker = thread::Builder::new()
            .name("lostbox-db".into())
            .spawn(move || {
                let mut conn = match Connection::open(&path_for_thread) {
                    Ok(connection) => connection,
                    Err(err) => {
                        let _ = ready_tx.send(Err(anyhow::Error::new(err)
                            .context("failed to open SQLite database")));
                        return;
                    }
                };

                if let Err(err) = conn.pragma_update(None, "journal_mode", "WAL") {
                    error!("Failed to enable WAL mode: {err}");
                }

                let init_result =
                    run_migrations(&mut conn).context("failed to run database migrations");
                if ready_tx.send(init_result).is_err() {
                    error!("DB initialization receiver dropped before ready signal");
                    return;
                }

                while let Ok(command) = command_rx.recv() {
                    match command {
                        DbCommand::Execute(task) => task(&mut conn),
                        DbCommand::Shutdown => break,
                    }
                }

                info!("Database thread shutting down");
            })
            .with_context(|| "failed to spawn database worker thread")?;

        ready_rx
            .recv()
            .context("database worker exited before signaling readiness")??;

        info!("Database initialized at {}", db_path.as_path().display());

        Ok(Self {
            inner: Arc::new(DatabaseInner {
                sender: command_tx,
                worker: Mutex::new(Some(worker)),
            }),
            db_path: Arc::new(db_path),
        })
    }

    pub fn path(&self) -> &Path {
        self.db_path.as_path()
    }

    pub async fn execute<F, T>(&self, task: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let sender = self.inner.sender.clone();
        let (reply_tx, reply_rx) = oneshot::channel();

        let command = DbCommand::Execute(Box::new(move |conn| {
            let result = task(conn);
            if reply_tx.send(result).is_err() {
                error!("DB caller dropped before receiving result");
            }
        }));

        sender
            .send(command)
            .map_err(|err| anyhow!("failed to send command to DB thread: {err}"))?;

        reply_rx
            .await
            .map_err(|_| anyhow!("database thread terminated unexpectedly"))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{LockKind, PHOTO_MEDIA_TYPE};

    fn open() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().expect("temp dir");
        let db = Database::new(dir.path().join("nested/lostbox.sqlite3")).expect("open db");
        (dir, db)
    }

    #[tokio::test]
    async fn lock_credential_round_trip_and_overwrite() {
        let (_dir, db) = open();
        assert!(db.lock_credential().await.expect("read").is_none());

        db.set_lock_credential(LockKind::Pin, "03ac67".into())
            .await
            .expect("set pin");
        db.set_lock_credential(LockKind::Pattern, "9f86d0".into())
            .await
            .expect("set pattern");

        let stored = db.lock_credential().await.expect("read").expect("present");
        assert_eq!(stored.kind, LockKind::Pattern);
        assert_eq!(stored.hash, "9f86d0");

        assert!(db.clear_lock_credential().await.expect("clear"));
        assert!(!db.clear_lock_credential().await.expect("clear again"));
        assert!(db.lock_credential().await.expect("read").is_none());
    }

    #[tokio::test]
    async fn non_hex_hash_is_rejected() {
        let (_dir, db) = open();
        assert!(db
            .set_lock_credential(LockKind::Pin, "1234!".into())
            .await
            .is_err());
        assert!(db
            .set_lock_credential(LockKind::Pin, "ABCDEF".into())
            .await
            .is_err());
    }

    #[tokio::test]
    async fn media_is_filtered_by_type() {
        let (_dir, db) = open();
        let photo = db
            .insert_media(PHOTO_MEDIA_TYPE, "image/png", vec![1, 2, 3])
            .await
            .expect("insert photo");
        db.insert_media("video", "video/mp4", vec![9])
            .await
            .expect("insert video");

        assert!(photo.id.starts_with("media_"));
        let photos = db.media_by_type(PHOTO_MEDIA_TYPE).await.expect("query");
        assert_eq!(photos.len(), 1);
        assert_eq!(photos[0].id, photo.id);
        assert_eq!(photos[0].data, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn data_survives_reopen() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("lostbox.sqlite3");
        {
            let db = Database::new(path.clone()).expect("open");
            db.set_lock_credential(LockKind::Pin, "abc123".into())
                .await
                .expect("set");
        }

        let db = Database::new(path).expect("reopen");
        let stored = db.lock_credential().await.expect("read").expect("present");
        assert_eq!(stored.hash, "abc123");
    }
}
