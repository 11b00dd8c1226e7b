//! Tails a local game log file, forwarding new lines over a channel and
//! synthesizing a `Rotated` marker when the watched path is recreated or
//! truncated out from under the reader. Log rotation is treated as an
//! implicit map boundary alongside the `new-game` line.

use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::mpsc as std_mpsc;

use notify::{Event as NotifyEvent, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::warn;

/// One unit of output from a tailed file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TailedLine {
    Line(String),
    /// The file was recreated or truncated; any in-flight chain-id
    /// correlation spanning the boundary should be treated as stale.
    Rotated,
}

/// A running tail of a single file. Drop to stop the background watcher.
pub struct LocalTailSource {
    rx: mpsc::Receiver<TailedLine>,
    _task: JoinHandle<()>,
}

impl LocalTailSource {
    /// Start tailing `path` from its current end-of-file. `buffer` bounds
    /// the channel between the blocking watcher thread and the async
    /// consumer; a slow consumer backpressures the watcher, not the reader.
    pub fn spawn(path: impl AsRef<Path>, buffer: usize) -> Self {
        let path = path.as_ref().to_path_buf();
        let (tx, rx) = mpsc::channel(buffer.max(1));
        let task = tokio::task::spawn_blocking(move || tail_blocking(path, tx));
        Self { rx, _task: task }
    }

    /// For tests: drive the engine from a synthetic sequence of lines
    /// without touching the filesystem or a real watcher.
    #[cfg(test)]
    pub fn from_channel(rx: mpsc::Receiver<TailedLine>) -> Self {
        let task = tokio::spawn(async {});
        Self { rx, _task: task }
    }

    pub async fn next_line(&mut self) -> Option<TailedLine> {
        self.rx.recv().await
    }
}

struct Cursor {
    file: BufReader<File>,
    position: u64,
}

fn open_at_end(path: &Path) -> std::io::Result<Cursor> {
    let mut file = File::open(path)?;
    let position = file.seek(SeekFrom::End(0))?;
    Ok(Cursor {
        file: BufReader::new(file),
        position,
    })
}

fn open_at_start(path: &Path) -> std::io::Result<Cursor> {
    let file = File::open(path)?;
    Ok(Cursor {
        file: BufReader::new(file),
        position: 0,
    })
}

fn drain_new_lines(cursor: &mut Cursor, tx: &mpsc::Sender<TailedLine>) -> bool {
    loop {
        let mut line = String::new();
        match cursor.file.read_line(&mut line) {
            Ok(0) => return true,
            Ok(n) => {
                cursor.position += n as u64;
                let line = line.trim_end_matches(['\n', '\r']).to_string();
                if tx.blocking_send(TailedLine::Line(line)).is_err() {
                    return false;
                }
            }
            Err(err) => {
                warn!(?err, "error reading tailed log file");
                return true;
            }
        }
    }
}

fn tail_blocking(path: PathBuf, tx: mpsc::Sender<TailedLine>) {
    let (watch_tx, watch_rx) = std_mpsc::channel::<notify::Result<NotifyEvent>>();
    let mut watcher: RecommendedWatcher = match notify::recommended_watcher(watch_tx) {
        Ok(w) => w,
        Err(err) => {
            warn!(?err, "failed to create log file watcher");
            return;
        }
    };

    let watch_dir = path.parent().unwrap_or_else(|| Path::new("."));
    if let Err(err) = watcher.watch(watch_dir, RecursiveMode::NonRecursive) {
        warn!(?err, path = %path.display(), "failed to watch log directory");
        return;
    }

    let mut cursor = match open_at_end(&path) {
        Ok(c) => c,
        Err(err) => {
            warn!(?err, path = %path.display(), "failed to open log file for tailing");
            return;
        }
    };

    loop {
        match watch_rx.recv() {
            Ok(Ok(event)) => {
                if !event.paths.iter().any(|p| p == &path) {
                    continue;
                }
                match event.kind {
                    EventKind::Remove(_) | EventKind::Create(_) => {
                        if tx.blocking_send(TailedLine::Rotated).is_err() {
                            return;
                        }
                        match open_at_start(&path) {
                            Ok(c) => cursor = c,
                            Err(err) => {
                                warn!(?err, "failed to reopen rotated log file");
                                return;
                            }
                        }
                    }
                    EventKind::Modify(_) => {
                        if let Ok(metadata) = std::fs::metadata(&path) {
                            if metadata.len() < cursor.position {
                                if tx.blocking_send(TailedLine::Rotated).is_err() {
                                    return;
                                }
                                cursor = match open_at_start(&path) {
                                    Ok(c) => c,
                                    Err(err) => {
                                        warn!(?err, "failed to reopen truncated log file");
                                        return;
                                    }
                                };
                            }
                        }
                        if !drain_new_lines(&mut cursor, &tx) {
                            return;
                        }
                    }
                    _ => {}
                }
            }
            Ok(Err(err)) => warn!(?err, "file watcher error"),
            Err(_) => return,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn from_channel_forwards_synthetic_lines() {
        let (tx, rx) = mpsc::channel(4);
        tx.send(TailedLine::Line("hello".to_string())).await.unwrap();
        tx.send(TailedLine::Rotated).await.unwrap();
        drop(tx);

        let mut source = LocalTailSource::from_channel(rx);
        assert_eq!(source.next_line().await, Some(TailedLine::Line("hello".to_string())));
        assert_eq!(source.next_line().await, Some(TailedLine::Rotated));
        assert_eq!(source.next_line().await, None);
    }
}
