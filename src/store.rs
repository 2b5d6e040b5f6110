use std::collections::{HashMap, HashSet};
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{info, warn};

use crate::error::StoreError;
use crate::identity::session_file_name;
use crate::session::Session;

/// Per-employee session lists backed by one JSON file each.
///
/// The in-memory list is the source of truth for the running process; files
/// are rewritten in full after every change.
#[derive(Debug)]
pub struct SessionStore {
    dir: PathBuf,
    ledgers: HashMap<String, Vec<Session>>,
    /// Employees whose file exists but could not be read; never overwritten.
    unread: HashSet<String>,
}

impl SessionStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            ledgers: HashMap::new(),
            unread: HashSet::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, employee: &str) -> PathBuf {
        self.dir.join(session_file_name(employee))
    }

    /// Sessions currently held for `employee`, empty if never loaded
    pub fn sessions(&self, employee: &str) -> &[Session] {
        self.ledgers.get(employee).map(Vec::as_slice).unwrap_or(&[])
    }

    /// (Re)read the employee's file into memory.
    ///
    /// A missing file is an empty list. A file with bad contents leaves the
    /// list empty, is moved aside to `<file>.corrupt`, and the error is
    /// returned so the caller can warn about it. A file that cannot be read
    /// at all stays where it is and is not written to until a later load
    /// succeeds. Sessions recorded in the meantime are kept and appended to
    /// whatever that load finds.
    pub fn load(&mut self, employee: &str) -> Result<&[Session], StoreError> {
        let path = self.path_for(employee);
        let pending = if self.unread.contains(employee) {
            self.ledgers.remove(employee).unwrap_or_default()
        } else {
            Vec::new()
        };

        let mut sessions = match read_sessions(&path) {
            Ok(sessions) => sessions,
            Err(err) => {
                let blocked = !err.is_corrupt() || !quarantine(&path);
                if blocked {
                    self.unread.insert(employee.to_string());
                } else {
                    self.unread.remove(employee);
                }
                self.ledgers.insert(employee.to_string(), pending);
                return Err(err);
            }
        };
        info!(employee, count = sessions.len(), path = %path.display(), "sessions loaded");
        sessions.extend(pending);
        self.unread.remove(employee);
        self.ledgers.insert(employee.to_string(), sessions);
        Ok(self.sessions(employee))
    }

    /// Record a finished session and rewrite the employee's file.
    ///
    /// The session stays in memory even when the write fails. When the
    /// existing file cannot be read the write is refused so its history is
    /// not replaced.
    pub fn append_and_save(&mut self, employee: &str, session: Session) -> Result<(), StoreError> {
        if self.unread.contains(employee) || !self.ledgers.contains_key(employee) {
            if let Err(err) = self.load(employee) {
                if self.unread.contains(employee) {
                    warn!(employee, error = %err, "session kept in memory, existing file left untouched");
                    self.ledgers.entry(employee.to_string()).or_default().push(session);
                    return Err(err);
                }
                warn!(employee, error = %err, "starting a fresh session list");
            }
        }
        let path = self.path_for(employee);
        let ledger = self.ledgers.entry(employee.to_string()).or_default();
        ledger.push(session);

        match write_sessions(&path, ledger) {
            Ok(()) => {
                info!(employee, count = ledger.len(), "sessions saved");
                Ok(())
            }
            Err(source) => {
                warn!(employee, path = %path.display(), error = %source, "failed to save sessions");
                Err(StoreError::PersistenceFailure {
                    action: "write",
                    path,
                    source,
                })
            }
        }
    }

    /// Forget every session for `employee` and delete the backing file.
    pub fn clear(&mut self, employee: &str) -> Result<(), StoreError> {
        self.ledgers.insert(employee.to_string(), Vec::new());
        self.unread.remove(employee);
        let path = self.path_for(employee);
        match fs::remove_file(&path) {
            Ok(()) => {
                info!(employee, path = %path.display(), "session file removed");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => {
                warn!(employee, path = %path.display(), error = %source, "failed to remove session file");
                Err(StoreError::PersistenceFailure {
                    action: "delete",
                    path,
                    source,
                })
            }
        }
    }
}

fn read_sessions(path: &Path) -> Result<Vec<Session>, StoreError> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(StoreError::PersistenceFailure {
                action: "read",
                path: path.to_path_buf(),
                source,
            })
        }
    };
    serde_json::from_slice(&bytes).map_err(|e| StoreError::CorruptData {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

fn write_sessions(path: &Path, sessions: &[Session]) -> io::Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir)?;

    let tmp = NamedTempFile::new_in(dir)?;
    let mut writer = BufWriter::new(tmp);
    serde_json::to_writer_pretty(&mut writer, sessions)?;
    writer.flush()?;
    let tmp = writer.into_inner().map_err(|e| e.into_error())?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Move a corrupt file to `<file>.corrupt`, or `<file>.corrupt.N` when
/// earlier backups exist. Returns whether the file is out of the way.
fn quarantine(path: &Path) -> bool {
    let backup = (0u32..)
        .map(|n| {
            let mut name = path.as_os_str().to_owned();
            name.push(".corrupt");
            if n > 0 {
                name.push(format!(".{n}"));
            }
            PathBuf::from(name)
        })
        .find(|candidate| fs::symlink_metadata(candidate).is_err());
    let Some(backup) = backup else {
        return false;
    };
    match fs::rename(path, &backup) {
        Ok(()) => {
            warn!(path = %path.display(), backup = %backup.display(), "corrupt session file moved aside");
            true
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "could not move corrupt session file");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::TIMESTAMP_FORMAT;
    use assert_matches::assert_matches;
    use chrono::NaiveDateTime;
    use tempfile::tempdir;

    fn session(start: &str, end: &str, secs: f64) -> Session {
        Session::new(
            NaiveDateTime::parse_from_str(start, TIMESTAMP_FORMAT).unwrap(),
            NaiveDateTime::parse_from_str(end, TIMESTAMP_FORMAT).unwrap(),
            secs,
        )
    }

    #[test]
    fn load_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let mut store = SessionStore::new(dir.path());
        assert!(store.load("nobody").unwrap().is_empty());
    }

    #[test]
    fn append_then_load_roundtrips_in_order() {
        let dir = tempdir().unwrap();
        let saved = vec![
            session("2024-01-02 09:00:00", "2024-01-02 10:00:00", 3599.25),
            session("2024-01-01 13:00:00", "2024-01-01 13:00:50", 50.0),
        ];
        let mut store = SessionStore::new(dir.path());
        for s in &saved {
            store.append_and_save("dmitryace", s.clone()).unwrap();
        }

        let mut fresh = SessionStore::new(dir.path());
        assert_eq!(fresh.load("dmitryace").unwrap(), saved.as_slice());
    }

    #[test]
    fn file_uses_tuple_format() {
        let dir = tempdir().unwrap();
        let mut store = SessionStore::new(dir.path());
        store
            .append_and_save(
                "ivanov_ivan",
                session("2024-01-02 09:00:00", "2024-01-02 09:00:17", 17.0),
            )
            .unwrap();
        let raw = fs::read_to_string(dir.path().join("sessions_ivanov_ivan.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(
            value,
            serde_json::json!([["2024-01-02 09:00:00", "2024-01-02 09:00:17", 17.0]])
        );
    }

    #[test]
    fn append_keeps_existing_file_contents() {
        let dir = tempdir().unwrap();
        let mut first = SessionStore::new(dir.path());
        first
            .append_and_save("a", session("2024-01-01 08:00:00", "2024-01-01 08:01:00", 60.0))
            .unwrap();

        let mut second = SessionStore::new(dir.path());
        second
            .append_and_save("a", session("2024-01-02 08:00:00", "2024-01-02 08:02:00", 120.0))
            .unwrap();
        assert_eq!(second.sessions("a").len(), 2);
    }

    #[test]
    fn corrupt_file_degrades_to_empty() {
        let dir = tempdir().unwrap();
        let mut store = SessionStore::new(dir.path());
        let path = store.path_for("broken");
        fs::write(&path, r#"[["yesterday", "today", 1]]"#).unwrap();

        assert_matches!(store.load("broken"), Err(StoreError::CorruptData { .. }));
        assert!(store.sessions("broken").is_empty());
        assert!(!path.exists());
        assert!(dir.path().join("sessions_broken.json.corrupt").exists());
    }

    #[test]
    fn wrong_field_types_are_corrupt() {
        let dir = tempdir().unwrap();
        let mut store = SessionStore::new(dir.path());
        fs::write(
            store.path_for("typed"),
            r#"[["2024-01-02 09:00:00", "2024-01-02 09:00:17", "17"]]"#,
        )
        .unwrap();
        assert_matches!(store.load("typed"), Err(StoreError::CorruptData { .. }));
    }

    #[test]
    fn failed_write_keeps_session_in_memory() {
        let dir = tempdir().unwrap();
        // a regular file where the sessions directory should be
        let blocker = dir.path().join("sessions");
        fs::write(&blocker, b"").unwrap();
        let mut store = SessionStore::new(&blocker);

        let res = store.append_and_save(
            "x",
            session("2024-01-02 09:00:00", "2024-01-02 09:00:05", 5.0),
        );
        assert_matches!(res, Err(StoreError::PersistenceFailure { action: "write", .. }));
        assert_eq!(store.sessions("x").len(), 1);
    }

    #[test]
    fn clear_without_file_succeeds() {
        let dir = tempdir().unwrap();
        let mut store = SessionStore::new(dir.path());
        store.clear("ghost").unwrap();
        assert!(store.sessions("ghost").is_empty());
    }

    #[test]
    fn clear_removes_file_and_memory() {
        let dir = tempdir().unwrap();
        let mut store = SessionStore::new(dir.path());
        store
            .append_and_save("a", session("2024-01-01 08:00:00", "2024-01-01 08:01:00", 60.0))
            .unwrap();
        let path = store.path_for("a");
        assert!(path.exists());

        store.clear("a").unwrap();
        assert!(!path.exists());
        assert!(store.sessions("a").is_empty());
        assert!(store.load("a").unwrap().is_empty());
    }

    #[test]
    fn repeated_corruption_keeps_every_backup() {
        let dir = tempdir().unwrap();
        let mut store = SessionStore::new(dir.path());
        let path = store.path_for("broken");

        fs::write(&path, "first").unwrap();
        assert_matches!(store.load("broken"), Err(StoreError::CorruptData { .. }));
        fs::write(&path, "second").unwrap();
        assert_matches!(store.load("broken"), Err(StoreError::CorruptData { .. }));

        let first = dir.path().join("sessions_broken.json.corrupt");
        let second = dir.path().join("sessions_broken.json.corrupt.1");
        assert_eq!(fs::read_to_string(first).unwrap(), "first");
        assert_eq!(fs::read_to_string(second).unwrap(), "second");
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_file_is_never_overwritten() {
        let dir = tempdir().unwrap();
        let mut store = SessionStore::new(dir.path());
        let path = store.path_for("looped");
        // reading a self-referencing symlink fails with something other than NotFound
        std::os::unix::fs::symlink(&path, &path).unwrap();

        assert_matches!(
            store.load("looped"),
            Err(StoreError::PersistenceFailure { action: "read", .. })
        );
        let res = store.append_and_save(
            "looped",
            session("2024-01-02 09:00:00", "2024-01-02 10:00:00", 3600.0),
        );
        assert_matches!(res, Err(StoreError::PersistenceFailure { action: "read", .. }));
        assert!(fs::symlink_metadata(&path).unwrap().file_type().is_symlink());
        assert_eq!(store.sessions("looped").len(), 1);

        // once the file is readable again its history comes first
        fs::remove_file(&path).unwrap();
        let mut earlier = SessionStore::new(dir.path());
        earlier
            .append_and_save("looped", session("2024-01-01 08:00:00", "2024-01-01 08:01:00", 60.0))
            .unwrap();
        store
            .append_and_save("looped", session("2024-01-03 08:00:00", "2024-01-03 08:00:30", 30.0))
            .unwrap();

        let durations: Vec<f64> = SessionStore::new(dir.path())
            .load("looped")
            .unwrap()
            .iter()
            .map(Session::duration_seconds)
            .collect();
        assert_eq!(durations, vec![60.0, 3600.0, 30.0]);
    }

    #[test]
    fn clear_delete_failure_still_empties_memory() {
        let dir = tempdir().unwrap();
        let mut store = SessionStore::new(dir.path());
        store
            .append_and_save("x", session("2024-01-01 08:00:00", "2024-01-01 08:01:00", 60.0))
            .unwrap();
        assert_eq!(store.sessions("x").len(), 1);

        // a directory in place of the file cannot be removed with remove_file
        let path = store.path_for("x");
        fs::remove_file(&path).unwrap();
        fs::create_dir(&path).unwrap();

        assert_matches!(
            store.clear("x"),
            Err(StoreError::PersistenceFailure { action: "delete", .. })
        );
        assert!(store.sessions("x").is_empty());
    }

    #[test]
    fn ledgers_are_kept_per_employee() {
        let dir = tempdir().unwrap();
        let mut store = SessionStore::new(dir.path());
        store
            .append_and_save("a", session("2024-01-01 08:00:00", "2024-01-01 08:01:00", 60.0))
            .unwrap();
        assert!(store.load("b").unwrap().is_empty());
        assert_eq!(store.sessions("a").len(), 1);
    }
}
