// VisitLog - GPL-3.0-or-later
// This file is part of VisitLog.
//
// Copyright (C) 2026 Daniel Freiermuth
//
// VisitLog is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// VisitLog is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with VisitLog.  If not, see <https://www.gnu.org/licenses/>.

//! Single-writer worker that owns a [`Session`].
//!
//! File reads run as independent tasks and finish in any order. Their results,
//! like every user command, are queued to one worker task that applies them
//! one at a time, so two reads completing together can never lose an update.

use crate::core::filter::DateRange;
use crate::core::log_file::{display_name, LoadedFile, LogFileLoader};
use crate::core::session::{Session, Snapshot, Status};
use crate::error::LoadError;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

enum Command {
    Load(PathBuf),
    Ingest { name: String, content: String },
    Remove(String),
    Clear,
    SetSearchTerm(String),
    SetDateRange(Option<DateRange>),
    SetLandingOnly(bool),
    Snapshot(oneshot::Sender<Snapshot>),
}

/// Completion of a background read
struct ReadDone {
    name: String,
    result: Result<LoadedFile, LoadError>,
}

/// Handle to submit commands to the worker.
///
/// Clone this to submit from multiple places.
/// When all handles are dropped and pending reads are done, the worker exits.
#[derive(Clone)]
pub struct SessionHandle {
    command_tx: mpsc::UnboundedSender<Command>,
}

impl SessionHandle {
    fn send(&self, command: Command) {
        if self.command_tx.send(command).is_err() {
            tracing::warn!("Session worker has stopped, command dropped");
        }
    }

    /// Read a file from disk and ingest it once read
    pub fn load(&self, path: impl Into<PathBuf>) {
        self.send(Command::Load(path.into()));
    }

    /// Ingest content that is already in memory
    pub fn ingest(&self, name: &str, content: String) {
        self.send(Command::Ingest {
            name: name.to_string(),
            content,
        });
    }

    pub fn remove(&self, name: &str) {
        self.send(Command::Remove(name.to_string()));
    }

    pub fn clear(&self) {
        self.send(Command::Clear);
    }

    pub fn set_search_term(&self, term: &str) {
        self.send(Command::SetSearchTerm(term.to_string()));
    }

    pub fn set_date_range(&self, range: Option<DateRange>) {
        self.send(Command::SetDateRange(range));
    }

    pub fn set_landing_only(&self, landing_only: bool) {
        self.send(Command::SetLandingOnly(landing_only));
    }

    /// Current view, after every command submitted before this one.
    ///
    /// Reads still in flight are not waited for. Returns `None` if the worker
    /// has stopped.
    pub async fn snapshot(&self) -> Option<Snapshot> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Snapshot(tx));
        rx.await.ok()
    }
}

/// Owns the session and applies commands in arrival order
pub struct SessionWorker {
    session: Session,
    loader: LogFileLoader,
    status_tx: mpsc::UnboundedSender<Status>,
    read_tx: mpsc::UnboundedSender<ReadDone>,
    in_flight: usize,
    /// Name each loaded path is tracked under in the store
    source_names: HashMap<PathBuf, String>,
}

impl SessionWorker {
    /// Start the worker on the current tokio runtime.
    ///
    /// Returns the command handle, a stream of status messages, and the join
    /// handle that yields the final session once the worker exits.
    pub fn spawn(
        session: Session,
        loader: LogFileLoader,
    ) -> (
        SessionHandle,
        mpsc::UnboundedReceiver<Status>,
        JoinHandle<Session>,
    ) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = mpsc::unbounded_channel();
        let (read_tx, read_rx) = mpsc::unbounded_channel();

        let worker = Self {
            session,
            loader,
            status_tx,
            read_tx,
            in_flight: 0,
            source_names: HashMap::new(),
        };
        let join = tokio::spawn(worker.run(command_rx, read_rx));

        (SessionHandle { command_tx }, status_rx, join)
    }

    async fn run(
        mut self,
        mut command_rx: mpsc::UnboundedReceiver<Command>,
        mut read_rx: mpsc::UnboundedReceiver<ReadDone>,
    ) -> Session {
        tracing::debug!("Session worker started");
        let mut commands_open = true;

        // Exits once no handle is left and no read can still report back
        while commands_open || self.in_flight > 0 {
            tokio::select! {
                command = command_rx.recv(), if commands_open => match command {
                    Some(command) => self.handle(command),
                    None => commands_open = false,
                },
                Some(done) = read_rx.recv(), if self.in_flight > 0 => {
                    self.in_flight -= 1;
                    self.finish_read(done);
                }
            }
        }

        tracing::debug!("Session worker stopped");
        self.session
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::Load(path) => self.start_read(path),
            Command::Ingest { name, content } => {
                let status = self.session.ingest(&name, &content);
                self.report(status);
            }
            Command::Remove(name) => {
                self.source_names.retain(|_, tracked| *tracked != name);
                let status = self.session.remove(&name);
                self.report(status);
            }
            Command::Clear => {
                self.source_names.clear();
                let status = self.session.clear();
                self.report(status);
            }
            Command::SetSearchTerm(term) => self.session.set_search_term(&term),
            Command::SetDateRange(range) => self.session.set_date_range(range),
            Command::SetLandingOnly(landing_only) => self.session.set_landing_only(landing_only),
            Command::Snapshot(reply) => {
                let _ = reply.send(self.session.snapshot());
            }
        }
    }

    /// Name to track `path` under.
    ///
    /// Reloading the same path reuses its name, so the new content replaces the
    /// old. A different file with the same file name gets a numbered suffix.
    fn source_name(&mut self, path: &Path) -> String {
        let id = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        if let Some(name) = self.source_names.get(&id) {
            return name.clone();
        }

        let base = display_name(path);
        let taken = |name: &str| {
            self.session.store().contains_file(name)
                || self.source_names.values().any(|tracked| tracked == name)
        };
        let name = if taken(&base) {
            let mut n = 2;
            loop {
                let candidate = format!("{base} ({n})");
                if !taken(&candidate) {
                    tracing::info!("{} is tracked as {candidate}", path.display());
                    break candidate;
                }
                n += 1;
            }
        } else {
            base
        };

        self.source_names.insert(id, name.clone());
        name
    }

    fn start_read(&mut self, path: PathBuf) {
        let name = self.source_name(&path);
        let loader = self.loader.clone();
        let read_tx = self.read_tx.clone();
        self.in_flight += 1;

        tokio::spawn(async move {
            let result = loader.read(path).await;
            let _ = read_tx.send(ReadDone { name, result });
        });
    }

    fn finish_read(&mut self, done: ReadDone) {
        let status = match done.result {
            Ok(file) => self.session.ingest(&done.name, &file.content),
            Err(e) => {
                if !self.session.store().contains_file(&done.name) {
                    self.source_names.retain(|_, tracked| *tracked != done.name);
                }
                Status::ReadFailed {
                    file: done.name,
                    error: e.to_string(),
                }
            }
        };
        self.report(status);
    }

    fn report(&self, status: Status) {
        if status.is_error() {
            tracing::warn!("{status}");
        } else {
            tracing::info!("{status}");
        }
        // Nobody listening is fine
        let _ = self.status_tx.send(status);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    const FILE_A: &str = "\
2024-01-15 10:30:00 GET / - 200 GET / - http://external.com/page 192.168.1.1
2024-01-15 10:31:00 GET /about - 200 a@b.co / - - 192.168.1.2
";
    const FILE_B: &str = "2024-01-16 09:00:00 GET /x - 200 GET / - - 10.0.0.1\n";

    fn spawn() -> (
        SessionHandle,
        mpsc::UnboundedReceiver<Status>,
        JoinHandle<Session>,
    ) {
        SessionWorker::spawn(Session::default(), LogFileLoader::default())
    }

    #[tokio::test]
    async fn test_concurrent_loads_are_all_applied() {
        let dir = tempfile::tempdir().unwrap();
        let mut expected = HashSet::new();
        let (handle, mut status_rx, join) = spawn();
        for i in 0..8 {
            let path = dir.path().join(format!("access{i}.log"));
            std::fs::write(&path, FILE_A).unwrap();
            expected.insert(format!("access{i}.log"));
            handle.load(path);
        }
        drop(handle);

        let session = join.await.unwrap();
        assert_eq!(session.store().total_records(), 16);

        let mut processed = HashSet::new();
        while let Ok(status) = status_rx.try_recv() {
            if let Status::FileProcessed { file, count } = status {
                assert_eq!(count, 2);
                processed.insert(file);
            }
        }
        assert_eq!(processed, expected);
    }

    #[tokio::test]
    async fn test_read_failure_is_reported_and_others_continue() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.log");
        std::fs::write(&good, FILE_B).unwrap();

        let (handle, mut status_rx, join) = spawn();
        handle.load(dir.path().join("missing.log"));
        handle.load(good);
        drop(handle);

        let session = join.await.unwrap();
        assert_eq!(session.store().total_records(), 1);

        let statuses: Vec<Status> = std::iter::from_fn(|| status_rx.try_recv().ok()).collect();
        assert_eq!(statuses.len(), 2);
        assert!(statuses.iter().any(|s| matches!(
            s,
            Status::ReadFailed { file, .. } if file == "missing.log"
        )));
    }

    #[tokio::test]
    async fn test_commands_apply_in_order() {
        let (handle, mut status_rx, join) = spawn();
        handle.ingest("a.log", FILE_A.to_string());
        handle.ingest("b.log", FILE_B.to_string());
        handle.set_search_term("192.168");

        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.total, 3);
        assert_eq!(snapshot.visible_count(), 2);
        assert_eq!(snapshot.files.len(), 2);

        handle.remove("a.log");
        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.total, 1);
        assert_eq!(snapshot.visible_count(), 0);

        handle.clear();
        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.total, 0);
        assert!(snapshot.query.search_term.is_empty());

        drop(handle);
        join.await.unwrap();
        let last = std::iter::from_fn(|| status_rx.try_recv().ok()).last();
        assert_eq!(last, Some(Status::Cleared));
    }

    #[tokio::test]
    async fn test_same_file_name_in_two_directories() {
        let dir = tempfile::tempdir().unwrap();
        let mut paths = Vec::new();
        for sub in ["d1", "d2"] {
            std::fs::create_dir(dir.path().join(sub)).unwrap();
            let path = dir.path().join(sub).join("access.log");
            std::fs::write(&path, FILE_B).unwrap();
            paths.push(path);
        }

        let (handle, mut status_rx, join) = spawn();
        for path in &paths {
            handle.load(path.clone());
        }
        drop(handle);

        let session = join.await.unwrap();
        assert_eq!(session.store().total_records(), 2);

        let mut names: Vec<String> = session
            .store()
            .get_source_info()
            .into_iter()
            .map(|s| s.name)
            .collect();
        names.sort();
        assert_eq!(names, vec!["access.log", "access.log (2)"]);

        let statuses: Vec<Status> = std::iter::from_fn(|| status_rx.try_recv().ok()).collect();
        assert_eq!(statuses.len(), 2);
        assert!(statuses.iter().all(|s| !s.is_error()));
    }

    #[tokio::test]
    async fn test_reloading_same_path_replaces() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("access.log");
        std::fs::write(&path, FILE_A).unwrap();

        let (handle, mut status_rx, join) = spawn();
        handle.load(path.clone());
        // First read has landed once its status arrives
        assert!(matches!(
            status_rx.recv().await,
            Some(Status::FileProcessed { .. })
        ));

        std::fs::write(&path, FILE_B).unwrap();
        handle.load(path);
        drop(handle);

        let session = join.await.unwrap();
        assert_eq!(session.store().total_records(), 1);
        assert_eq!(session.store().get_source_info().len(), 1);
        assert_eq!(session.store().get_source_info()[0].name, "access.log");
    }

    #[tokio::test]
    async fn test_empty_file_status() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.txt");
        std::fs::write(&path, "").unwrap();

        let (handle, mut status_rx, join) = spawn();
        handle.load(path);
        drop(handle);
        join.await.unwrap();

        assert_eq!(
            status_rx.try_recv().ok(),
            Some(Status::EmptyFile {
                file: "empty.txt".to_string()
            })
        );
    }
}
