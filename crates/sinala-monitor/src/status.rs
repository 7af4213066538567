use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use sinala_core::{ConnectionState, RiskTier};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::warn;

/// What the monitor last showed, as written to the status file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusSnapshot {
    pub state: ConnectionState,
    pub last_reading: Option<i64>,
    pub tier: Option<RiskTier>,
    /// Title of the last notification that stays on screen.
    pub alert: Option<String>,
}

impl Default for StatusSnapshot {
    fn default() -> Self {
        Self {
            state: ConnectionState::Disconnected,
            last_reading: None,
            tier: None,
            alert: None,
        }
    }
}

#[derive(Serialize)]
struct StatusFile<'a> {
    #[serde(flatten)]
    snapshot: &'a StatusSnapshot,
    #[serde(serialize_with = "serialize_iso")]
    started_at: DateTime<Utc>,
    #[serde(serialize_with = "serialize_iso")]
    updated_at: DateTime<Utc>,
}

/// Serialize as ISO 8601 with millisecond precision.
fn serialize_iso<S: serde::Serializer>(dt: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&dt.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string())
}

/// Publishes snapshots to a background writer. Bursts of updates coalesce.
///
/// Call [`close`](Self::close) before exiting: it is the only point where the
/// file is guaranteed to hold the latest snapshot.
pub struct StatusHandle {
    tx: watch::Sender<StatusSnapshot>,
    writer: JoinHandle<()>,
    path: PathBuf,
    started_at: DateTime<Utc>,
}

impl StatusHandle {
    /// Spawn the writer task for `path`.
    pub fn spawn(path: PathBuf) -> Self {
        let (tx, mut rx) = watch::channel(StatusSnapshot::default());
        let started_at = Utc::now();
        let writer_path = path.clone();
        let writer = tokio::spawn(async move {
            loop {
                let snapshot = rx.borrow_and_update().clone();
                write_status(&writer_path, &snapshot, started_at).await;
                if rx.changed().await.is_err() {
                    break;
                }
            }
        });
        Self {
            tx,
            writer,
            path,
            started_at,
        }
    }

    pub fn update(&self, f: impl FnOnce(&mut StatusSnapshot)) {
        self.tx.send_modify(f);
    }

    /// Apply a last update, stop the writer and write the final snapshot.
    pub async fn close(self, f: impl FnOnce(&mut StatusSnapshot)) {
        let Self {
            tx,
            writer,
            path,
            started_at,
        } = self;
        tx.send_modify(f);
        let snapshot = tx.borrow().clone();
        drop(tx);
        if let Err(e) = writer.await {
            warn!(error = %e, "status writer task failed");
        }
        write_status(&path, &snapshot, started_at).await;
    }
}

/// Atomic write: write to a temp file in the same directory, then rename.
pub async fn write_status(path: &Path, snapshot: &StatusSnapshot, started_at: DateTime<Utc>) {
    let status = StatusFile {
        snapshot,
        started_at,
        updated_at: Utc::now(),
    };

    let json = match serde_json::to_string_pretty(&status) {
        Ok(j) => j,
        Err(e) => {
            warn!(error = %e, "failed to serialize status");
            return;
        }
    };

    let tmp = path.with_extension("tmp");
    if let Err(e) = tokio::fs::write(&tmp, json.as_bytes()).await {
        warn!(error = %e, path = %tmp.display(), "failed to write status temp file");
        return;
    }
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        warn!(error = %e, "failed to rename status file");
    }
}
