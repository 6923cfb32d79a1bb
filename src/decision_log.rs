//! Append-only, subscribable record of routing/execution attempts.
//!
//! The log is the only persisted artifact: entries survive restarts in a
//! versioned JSON file until explicitly cleared. All operations are
//! synchronous; persistence failures are logged and swallowed so the
//! in-memory log and the notify path never fail.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

use crate::constants::{events, storage};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogStatus {
    Processing,
    Success,
    Reverted,
}

impl LogStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, LogStatus::Success | LogStatus::Reverted)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Visibility {
    Public,
    Confidential,
}

/// One step of a multi-phase operation, for feed-style rendering.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Phase {
    pub title: String,
    /// Offset relative to the entry's start, e.g. "+1.2s"
    pub offset: String,
    pub status: LogStatus,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: u64,
    pub agent: String,
    pub action: String,
    pub amount: String,
    pub visibility: Visibility,
    pub status: LogStatus,
    pub time: String,
    #[serde(default)]
    pub console: Vec<String>,
    #[serde(default)]
    pub phases: Vec<Phase>,
}

/// Fields for a new entry; id, time and the Processing default are
/// assigned by `append`.
#[derive(Clone, Debug)]
pub struct EntryDraft {
    pub agent: String,
    pub action: String,
    pub amount: String,
    pub visibility: Visibility,
    pub status: Option<LogStatus>,
    pub console: Vec<String>,
    pub phases: Vec<Phase>,
}

impl EntryDraft {
    pub fn new(agent: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            agent: agent.into(),
            action: action.into(),
            amount: "N/A".to_string(),
            visibility: Visibility::Public,
            status: None,
            console: Vec::new(),
            phases: Vec::new(),
        }
    }

    pub fn amount(mut self, amount: impl Into<String>) -> Self {
        self.amount = amount.into();
        self
    }

    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn status(mut self, status: LogStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn console_line(mut self, line: impl Into<String>) -> Self {
        self.console.push(line.into());
        self
    }
}

/// Partial update merged into an existing entry by id. Console lines and
/// phases are appended, the rest replaces.
#[derive(Clone, Debug, Default)]
pub struct LogUpdate {
    pub status: Option<LogStatus>,
    pub amount: Option<String>,
    pub console: Vec<String>,
    pub phases: Vec<Phase>,
}

impl LogUpdate {
    pub fn status(status: LogStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn console_line(mut self, line: impl Into<String>) -> Self {
        self.console.push(line.into());
        self
    }

    pub fn amount(mut self, amount: impl Into<String>) -> Self {
        self.amount = Some(amount.into());
        self
    }

    pub fn phase(mut self, phase: Phase) -> Self {
        self.phases.push(phase);
        self
    }
}

pub type ListenerId = u64;
type Listener = Arc<dyn Fn(&[LogEntry]) + Send + Sync>;

struct LogState {
    /// Newest first
    entries: Vec<LogEntry>,
    next_id: u64,
}

pub struct DecisionLog {
    state: Mutex<LogState>,
    listeners: Mutex<Vec<(ListenerId, Listener)>>,
    next_listener: Mutex<ListenerId>,
    path: Option<PathBuf>,
}

impl DecisionLog {
    /// In-memory log without persistence (tests, ephemeral sessions).
    pub fn in_memory() -> Self {
        Self {
            state: Mutex::new(LogState {
                entries: Vec::new(),
                next_id: 1,
            }),
            listeners: Mutex::new(Vec::new()),
            next_listener: Mutex::new(1),
            path: None,
        }
    }

    /// Open a durable log, restoring any persisted entries. A corrupt or
    /// missing file starts empty; it is never an error.
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let entries = load_entries(&path);
        let next_id = entries.iter().map(|e| e.id).max().unwrap_or(0) + 1;
        Self {
            state: Mutex::new(LogState { entries, next_id }),
            listeners: Mutex::new(Vec::new()),
            next_listener: Mutex::new(1),
            path: Some(path),
        }
    }

    /// Append a new entry (newest first), assigning a fresh id and the
    /// Processing default status. Notifies all subscribers synchronously.
    pub fn append(&self, draft: EntryDraft) -> u64 {
        let snapshot;
        let id;
        {
            let mut state = self.state.lock().unwrap();
            id = state.next_id;
            state.next_id += 1;
            let entry = LogEntry {
                id,
                agent: draft.agent,
                action: draft.action,
                amount: draft.amount,
                visibility: draft.visibility,
                status: draft.status.unwrap_or(LogStatus::Processing),
                time: chrono::Local::now().format("%H:%M:%S").to_string(),
                console: draft.console,
                phases: draft.phases,
            };
            state.entries.insert(0, entry);
            self.persist(&state.entries);
            snapshot = state.entries.clone();
        }
        self.notify(&snapshot);
        id
    }

    /// Merge fields into the entry with this id; a missing id is a no-op.
    /// Status is monotonic per entry: once terminal, further status
    /// changes are ignored.
    pub fn update(&self, id: u64, update: LogUpdate) {
        let snapshot;
        {
            let mut state = self.state.lock().unwrap();
            let Some(entry) = state.entries.iter_mut().find(|e| e.id == id) else {
                return;
            };

            if let Some(status) = update.status {
                if entry.status.is_terminal() && status != entry.status {
                    debug!(
                        "Ignoring status change {:?} -> {:?} for terminal entry {}",
                        entry.status, status, id
                    );
                } else {
                    entry.status = status;
                }
            }
            if let Some(amount) = update.amount {
                entry.amount = amount;
            }
            entry.console.extend(update.console);
            entry.phases.extend(update.phases);

            self.persist(&state.entries);
            snapshot = state.entries.clone();
        }
        self.notify(&snapshot);
    }

    /// Current entries, newest first.
    pub fn list(&self) -> Vec<LogEntry> {
        self.state.lock().unwrap().entries.clone()
    }

    /// Register a listener. The current list is delivered immediately so
    /// there is no missed-initial-state gap.
    pub fn subscribe(&self, listener: impl Fn(&[LogEntry]) + Send + Sync + 'static) -> ListenerId {
        let listener: Listener = Arc::new(listener);
        let snapshot = self.list();
        listener(&snapshot);

        let mut next = self.next_listener.lock().unwrap();
        let id = *next;
        *next += 1;
        self.listeners.lock().unwrap().push((id, listener));
        id
    }

    pub fn unsubscribe(&self, id: ListenerId) {
        self.listeners.lock().unwrap().retain(|(lid, _)| *lid != id);
    }

    /// Remove every entry (the only way entries are ever deleted).
    pub fn clear(&self) {
        let snapshot;
        {
            let mut state = self.state.lock().unwrap();
            state.entries.clear();
            self.persist(&state.entries);
            snapshot = state.entries.clone();
        }
        self.notify(&snapshot);
    }

    fn notify(&self, snapshot: &[LogEntry]) {
        // Listeners are invoked outside the entries lock; clone the Arcs
        // so a callback can subscribe/unsubscribe without deadlocking.
        let listeners: Vec<Listener> = self
            .listeners
            .lock()
            .unwrap()
            .iter()
            .map(|(_, l)| l.clone())
            .collect();
        for listener in listeners {
            listener(snapshot);
        }
    }

    fn persist(&self, entries: &[LogEntry]) {
        let Some(path) = &self.path else { return };
        let envelope = json!({
            "version": storage::SCHEMA_VERSION,
            "entries": entries,
        });
        let result = serde_json::to_string(&envelope)
            .map_err(|e| e.to_string())
            .and_then(|s| std::fs::write(path, s).map_err(|e| e.to_string()));
        if let Err(e) = result {
            warn!(
                event = events::LOG_PERSIST_FAILED,
                "Failed to persist decision log to {}: {}",
                path.display(),
                e
            );
        }
    }
}

fn load_entries(path: &Path) -> Vec<LogEntry> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(_) => return Vec::new(),
    };
    let raw: serde_json::Value = match serde_json::from_str(&content) {
        Ok(v) => v,
        Err(e) => {
            warn!("Corrupt decision log at {} ({}), starting empty", path.display(), e);
            return Vec::new();
        }
    };

    // Versioned envelope, with bare legacy arrays accepted
    let entries_value = if raw.is_array() {
        raw
    } else {
        match raw.get("version").and_then(|v| v.as_u64()) {
            Some(v) if v as u32 == storage::SCHEMA_VERSION => {
                raw.get("entries").cloned().unwrap_or(serde_json::Value::Null)
            }
            other => {
                warn!(
                    "Unknown decision log schema version {:?} at {}, starting empty",
                    other,
                    path.display()
                );
                return Vec::new();
            }
        }
    };

    match serde_json::from_value(entries_value) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Unreadable decision log entries at {} ({}), starting empty", path.display(), e);
            Vec::new()
        }
    }
}
