//! Unit tests for the decision log: ordering, status transitions,
//! subscriptions and persistence.

#[cfg(test)]
mod decision_log_tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use crate::decision_log::*;

    fn draft(action: &str) -> EntryDraft {
        EntryDraft::new("TestAgent", action)
    }

    // ============= Append / ordering =============

    #[test]
    fn test_append_assigns_ids_and_orders_newest_first() {
        let log = DecisionLog::in_memory();

        let first = log.append(draft("THINKING"));
        let second = log.append(draft("SEND TRANSACTION"));

        assert!(second > first);
        let entries = log.list();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id, second);
        assert_eq!(entries[0].action, "SEND TRANSACTION");
        assert_eq!(entries[0].status, LogStatus::Processing);
        assert_eq!(entries[1].id, first);
    }

    #[test]
    fn test_append_defaults() {
        let log = DecisionLog::in_memory();
        log.append(draft("THINKING"));

        let entry = &log.list()[0];
        assert_eq!(entry.agent, "TestAgent");
        assert_eq!(entry.amount, "N/A");
        assert_eq!(entry.visibility, Visibility::Public);
        assert!(entry.console.is_empty());
    }

    // ============= Update =============

    #[test]
    fn test_update_merges_and_appends_console() {
        let log = DecisionLog::in_memory();
        let id = log.append(draft("THINKING").console_line("line 1"));

        log.update(
            id,
            LogUpdate::status(LogStatus::Success)
                .console_line("line 2")
                .amount("5"),
        );

        let entry = &log.list()[0];
        assert_eq!(entry.status, LogStatus::Success);
        assert_eq!(entry.amount, "5");
        assert_eq!(entry.console, vec!["line 1", "line 2"]);
    }

    #[test]
    fn test_update_appends_phases() {
        let log = DecisionLog::in_memory();
        let id = log.append(draft("CONFIDENTIAL EXECUTE"));

        let phase = Phase {
            title: "SETTLED".to_string(),
            offset: "+1.2s".to_string(),
            status: LogStatus::Success,
            detail: "tx anchored".to_string(),
        };
        log.update(id, LogUpdate::default().phase(phase.clone()));

        assert_eq!(log.list()[0].phases, vec![phase]);
    }

    #[test]
    fn test_update_unknown_id_is_noop() {
        let log = DecisionLog::in_memory();
        log.append(draft("THINKING"));

        log.update(999, LogUpdate::status(LogStatus::Reverted));
        assert_eq!(log.list()[0].status, LogStatus::Processing);
    }

    #[test]
    fn test_terminal_status_is_sticky() {
        let log = DecisionLog::in_memory();
        let id = log.append(draft("SEND TRANSACTION"));

        log.update(id, LogUpdate::status(LogStatus::Reverted));
        log.update(
            id,
            LogUpdate::status(LogStatus::Processing).console_line("late line"),
        );

        let entry = &log.list()[0];
        // Status is monotonic, but the rest of the update still lands
        assert_eq!(entry.status, LogStatus::Reverted);
        assert_eq!(entry.console, vec!["late line"]);
    }

    // ============= Subscriptions =============

    #[test]
    fn test_subscribe_delivers_current_state_immediately() {
        let log = DecisionLog::in_memory();
        log.append(draft("THINKING"));

        let seen = Arc::new(AtomicUsize::new(0));
        let seen_cb = seen.clone();
        log.subscribe(move |entries| {
            seen_cb.store(entries.len(), Ordering::SeqCst);
        });

        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_listener_notified_on_changes_until_unsubscribed() {
        let log = DecisionLog::in_memory();

        let calls = Arc::new(AtomicUsize::new(0));
        let calls_cb = calls.clone();
        let id = log.subscribe(move |_| {
            calls_cb.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(calls.load(Ordering::SeqCst), 1); // initial delivery

        log.append(draft("THINKING"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        log.unsubscribe(id);
        log.append(draft("SEND TRANSACTION"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_unsubscribing_one_listener_keeps_the_other() {
        let log = DecisionLog::in_memory();

        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));
        let first_cb = first.clone();
        let second_cb = second.clone();
        let first_id = log.subscribe(move |_| {
            first_cb.fetch_add(1, Ordering::SeqCst);
        });
        log.subscribe(move |_| {
            second_cb.fetch_add(1, Ordering::SeqCst);
        });

        log.unsubscribe(first_id);
        log.append(draft("THINKING"));

        assert_eq!(first.load(Ordering::SeqCst), 1); // initial delivery only
        assert_eq!(second.load(Ordering::SeqCst), 2);
    }

    // ============= Persistence =============

    #[test]
    fn test_entries_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.json");

        {
            let log = DecisionLog::open(&path);
            let id = log.append(draft("SEND TRANSACTION").amount("5"));
            log.update(id, LogUpdate::status(LogStatus::Success));
        }

        let reopened = DecisionLog::open(&path);
        let entries = reopened.list();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, "SEND TRANSACTION");
        assert_eq!(entries[0].status, LogStatus::Success);

        // Fresh ids stay above everything restored
        let new_id = reopened.append(draft("THINKING"));
        assert!(new_id > entries[0].id);
    }

    #[test]
    fn test_corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.json");
        std::fs::write(&path, "{not json at all").unwrap();

        let log = DecisionLog::open(&path);
        assert!(log.list().is_empty());
    }

    #[test]
    fn test_unknown_schema_version_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.json");
        std::fs::write(&path, r#"{"version": 99, "entries": []}"#).unwrap();

        let log = DecisionLog::open(&path);
        assert!(log.list().is_empty());
    }

    #[test]
    fn test_legacy_bare_array_is_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.json");
        let legacy = r#"[{
            "id": 7,
            "agent": "System",
            "action": "THINKING",
            "amount": "N/A",
            "visibility": "Public",
            "status": "Success",
            "time": "12:00:00"
        }]"#;
        std::fs::write(&path, legacy).unwrap();

        let log = DecisionLog::open(&path);
        let entries = log.list();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, 7);
        assert!(entries[0].console.is_empty());
    }

    #[test]
    fn test_clear_removes_everything_including_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.json");

        let log = DecisionLog::open(&path);
        log.append(draft("THINKING"));
        log.append(draft("SEND TRANSACTION"));
        log.clear();

        assert!(log.list().is_empty());
        let reopened = DecisionLog::open(&path);
        assert!(reopened.list().is_empty());
    }
}
