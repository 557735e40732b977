/// Retention sweep for the capture directory
///
/// Every file older than the retention window is deleted. The sweep runs
/// once at startup and then on a fixed interval. Other writers keep using
/// the directory while it runs, so a file that disappears between listing
/// and deleting is treated as already cleaned.
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use walkdir::WalkDir;

use crate::error::{BoothError, Result};

/// How long captures are kept and how often the sweep runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    pub max_age: Duration,
    pub interval: Duration,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            max_age: Duration::from_secs(12 * 60 * 60),
            interval: Duration::from_secs(60 * 60),
        }
    }
}

/// What one sweep did
#[derive(Debug, Default)]
pub struct SweepReport {
    pub scanned: usize,
    pub deleted: Vec<PathBuf>,
    /// Per-file errors; none of them stopped the sweep
    pub failures: Vec<BoothError>,
}

/// Delete every file in `dir` whose age at `now` exceeds `max_age`
///
/// Fails only when the directory itself cannot be listed.
pub fn delete_old_files(dir: &Path, max_age: Duration, now: SystemTime) -> Result<SweepReport> {
    let mut report = SweepReport::default();

    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => {
                return Err(BoothError::FileStat {
                    path: dir.to_path_buf(),
                    source: walk_io_error(e),
                });
            }
            Err(e) => {
                let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| dir.to_path_buf());
                let source = walk_io_error(e);
                if source.kind() != io::ErrorKind::NotFound {
                    report.failures.push(BoothError::FileStat { path, source });
                }
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }
        report.scanned += 1;

        match remove_if_expired(entry.path(), max_age, now) {
            Ok(true) => {
                info!("🗑 Deleted old file: {}", entry.path().display());
                report.deleted.push(entry.into_path());
            }
            Ok(false) => {}
            Err(e) => {
                error!("❌ {}", e);
                report.failures.push(e);
            }
        }
    }

    Ok(report)
}

/// Delete `path` if it is older than `max_age`
///
/// Returns `Ok(false)` when the file is young enough or already gone.
pub fn remove_if_expired(path: &Path, max_age: Duration, now: SystemTime) -> Result<bool> {
    let modified = match std::fs::metadata(path).and_then(|m| m.modified()) {
        Ok(modified) => modified,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(source) => {
            return Err(BoothError::FileStat {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    // Files stamped in the future count as brand new
    let age = now.duration_since(modified).unwrap_or_default();
    if age <= max_age {
        return Ok(false);
    }

    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!("{} vanished before delete", path.display());
            Ok(false)
        }
        Err(source) => Err(BoothError::FileDelete {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn walk_io_error(e: walkdir::Error) -> io::Error {
    e.into_io_error()
        .unwrap_or_else(|| io::Error::new(io::ErrorKind::Other, "filesystem loop"))
}

/// Spawn the background sweeper: once now, then every `policy.interval`
pub fn spawn_retention_task(
    dir: PathBuf,
    policy: RetentionPolicy,
    cancel: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(policy.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Retention sweep shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    let dir = dir.clone();
                    let max_age = policy.max_age;
                    let swept = tokio::task::spawn_blocking(move || {
                        delete_old_files(&dir, max_age, SystemTime::now())
                    })
                    .await;

                    match swept {
                        Ok(Ok(report)) => debug!(
                            "Sweep done: {} scanned, {} deleted, {} failed",
                            report.scanned,
                            report.deleted.len(),
                            report.failures.len()
                        ),
                        Ok(Err(e)) => error!("❌ Error reading captured directory: {}", e),
                        Err(e) => error!("❌ Sweep task failed: {}", e),
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::encoder::PlaceholderEncoder;
    use crate::capture::store::CaptureStore;
    use crate::bus::{to_data_url, PhotoPayload};
    use crate::state::data::{AspectRatio, LayoutId};
    use std::fs::File;
    use std::sync::Arc;
    use tempfile::TempDir;

    const HOUR: Duration = Duration::from_secs(60 * 60);

    fn touch(dir: &Path, name: &str, modified: SystemTime) -> PathBuf {
        let path = dir.join(name);
        let file = File::create(&path).unwrap();
        file.set_modified(modified).unwrap();
        path
    }

    #[test]
    fn test_only_expired_files_are_deleted() {
        let temp = TempDir::new().unwrap();
        let now = SystemTime::now();
        let old = touch(temp.path(), "old.jpg", now - 13 * HOUR);
        let recent = touch(temp.path(), "recent.jpg", now - 11 * HOUR);
        let fresh = touch(temp.path(), "fresh.jpg", now - HOUR);

        let max_age = RetentionPolicy::default().max_age;
        let report = delete_old_files(temp.path(), max_age, now).unwrap();
        assert_eq!(report.scanned, 3);
        assert_eq!(report.deleted, vec![old.clone()]);
        assert!(report.failures.is_empty());
        assert!(!old.exists());
        assert!(recent.exists());
        assert!(fresh.exists());

        // A second pass finds nothing new
        let again = delete_old_files(temp.path(), max_age, now).unwrap();
        assert!(again.deleted.is_empty());
        assert!(again.failures.is_empty());
        assert_eq!(again.scanned, 2);
    }

    #[test]
    fn test_subdirectories_are_left_alone() {
        let temp = TempDir::new().unwrap();
        let now = SystemTime::now();
        std::fs::create_dir(temp.path().join("nested")).unwrap();
        touch(&temp.path().join("nested"), "deep.jpg", now - 20 * HOUR);

        let report = delete_old_files(temp.path(), 12 * HOUR, now).unwrap();
        assert_eq!(report.scanned, 0);
        assert!(temp.path().join("nested").join("deep.jpg").exists());
    }

    #[test]
    fn test_vanished_file_counts_as_cleaned() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("gone.jpg");
        assert!(!remove_if_expired(&missing, 12 * HOUR, SystemTime::now()).unwrap());
    }

    #[test]
    fn test_future_mtime_is_kept() {
        let temp = TempDir::new().unwrap();
        let now = SystemTime::now();
        let ahead = touch(temp.path(), "ahead.jpg", now + HOUR);
        assert!(!remove_if_expired(&ahead, 12 * HOUR, now).unwrap());
        assert!(ahead.exists());
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let temp = TempDir::new().unwrap();
        let result = delete_old_files(&temp.path().join("nope"), 12 * HOUR, SystemTime::now());
        assert!(matches!(result, Err(BoothError::FileStat { .. })));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_sweep_during_session_writes_keeps_new_files() {
        let temp = TempDir::new().unwrap();
        let store = Arc::new(
            CaptureStore::open(temp.path(), Arc::new(PlaceholderEncoder::new(Duration::ZERO)))
                .unwrap(),
        );
        let stale = touch(temp.path(), "photo_old.jpg", SystemTime::now() - 13 * HOUR);

        let mut writes = Vec::new();
        for index in 1..=8 {
            let store = Arc::clone(&store);
            writes.push(tokio::spawn(async move {
                let payload = PhotoPayload {
                    image_data: to_data_url(&crate::testing::jpeg_bytes()),
                    language: "english".into(),
                    aspect_ratio: AspectRatio::Square,
                    layout: LayoutId::Square2,
                    photo_index: index,
                };
                store.save_photo(&payload).await.unwrap()
            }));
        }
        let dir = temp.path().to_path_buf();
        let sweep = tokio::task::spawn_blocking(move || {
            delete_old_files(&dir, 12 * HOUR, SystemTime::now())
        });

        let mut saved = Vec::new();
        for write in writes {
            saved.push(write.await.unwrap());
        }
        let report = sweep.await.unwrap().unwrap();

        assert!(report.failures.is_empty());
        assert!(!stale.exists());
        for artifact in saved {
            assert!(artifact.path.exists(), "{} was swept", artifact.path.display());
        }
    }

    #[tokio::test]
    async fn test_retention_task_sweeps_at_startup() {
        let temp = TempDir::new().unwrap();
        let old = touch(temp.path(), "old.jpg", SystemTime::now() - 13 * HOUR);
        let cancel = CancellationToken::new();

        let handle = spawn_retention_task(
            temp.path().to_path_buf(),
            RetentionPolicy::default(),
            cancel.clone(),
        );

        for _ in 0..100 {
            if !old.exists() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert!(!old.exists());

        cancel.cancel();
        handle.await.unwrap();
    }
}
