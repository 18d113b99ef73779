mod common;

use common::{Event, recording_manager, take_events};
use db_manager::prelude::*;

fn opened(events: &[Event]) -> Vec<u32> {
    events
        .iter()
        .filter_map(|e| match e {
            Event::Open(id) => Some(*id),
            _ => None,
        })
        .collect()
}

#[test]
fn autonomous_statements_open_and_close_their_own_connection() -> Result<(), Box<dyn std::error::Error>> {
    let mut db = recording_manager(Backend::MySql, "fake://db");

    db.execute_update("DELETE FROM users", &[])?;
    db.execute_query("SELECT * FROM users", &[])?;

    let events = take_events();
    let ids = opened(&events);
    assert_eq!(ids.len(), 2);
    let (a, b) = (ids[0], ids[1]);
    assert_ne!(a, b);
    assert_eq!(
        events,
        vec![
            Event::Open(a),
            Event::Execute(a, "DELETE FROM users".into()),
            Event::Close(a),
            Event::Open(b),
            Event::Query(b, "SELECT * FROM users".into()),
            Event::Close(b),
        ]
    );
    assert!(!db.is_connected());
    Ok(())
}

#[test]
fn transaction_pins_one_connection_until_disconnect() -> Result<(), Box<dyn std::error::Error>> {
    let mut db = recording_manager(Backend::MySql, "fake://db");

    db.begin_transaction()?;
    db.execute_update("INSERT INTO users (name) VALUES (?)", &["a".into()])?;
    db.execute_query("SELECT * FROM users", &[])?;
    db.commit_transaction()?;
    assert!(db.is_connected());
    db.disconnect()?;

    let events = take_events();
    let t = opened(&events)[0];
    assert_eq!(
        events,
        vec![
            Event::Open(t),
            Event::AutoCommit(t, false),
            Event::Execute(t, "INSERT INTO users (name) VALUES (?)".into()),
            Event::Query(t, "SELECT * FROM users".into()),
            Event::Commit(t),
            Event::AutoCommit(t, true),
            Event::Close(t),
        ]
    );
    Ok(())
}

#[test]
fn rollback_restores_auto_commit_on_the_pinned_connection() -> Result<(), Box<dyn std::error::Error>> {
    let mut db = recording_manager(Backend::MySql, "fake://db");
    db.begin_transaction()?;
    db.rollback_transaction()?;
    assert_eq!(db.transaction_state(), TransactionState::Autonomous);

    // Back to per-statement connections.
    db.execute_update("DELETE FROM users", &[])?;

    let events = take_events();
    let ids = opened(&events);
    assert_eq!(ids.len(), 2);
    assert_eq!(events[2], Event::Rollback(ids[0]));
    assert_eq!(events[3], Event::AutoCommit(ids[0], true));
    assert_eq!(events[5], Event::Execute(ids[1], "DELETE FROM users".into()));
    Ok(())
}

#[test]
fn connect_failure_is_a_connection_error() {
    let mut db = recording_manager(Backend::MySql, "fake://refuse");

    let err = db.execute_query("SELECT 1", &[]).unwrap_err();
    assert!(err.is_connection_error(), "{err}");
    let err = db.begin_transaction().unwrap_err();
    assert!(err.is_connection_error(), "{err}");
    assert_eq!(db.transaction_state(), TransactionState::Autonomous);
    assert!(take_events().is_empty());
}

#[test]
fn parameter_mismatch_fails_before_connecting() {
    let mut db = recording_manager(Backend::PostgreSql, "fake://db");

    let err = db
        .execute_query("SELECT * FROM users WHERE id = ? AND age > ?", &[1.into()])
        .unwrap_err();
    assert!(matches!(err, DbManagerError::QueryError(ref msg) if msg.contains("expects 2")));
    let err = db.execute_update("DELETE FROM users", &[1.into()]).unwrap_err();
    assert!(err.is_query_error());
    assert!(take_events().is_empty());
}

#[test]
fn markers_are_rewritten_per_backend() -> Result<(), Box<dyn std::error::Error>> {
    let sql = "UPDATE users SET name = ? WHERE id = ?";
    let params: [DbValue; 2] = ["x".into(), 1.into()];
    let cases = [
        (Backend::MySql, "UPDATE users SET name = ? WHERE id = ?"),
        (Backend::PostgreSql, "UPDATE users SET name = $1 WHERE id = $2"),
        (Backend::SqlServer, "UPDATE users SET name = @P1 WHERE id = @P2"),
        (Backend::Oracle, "UPDATE users SET name = :1 WHERE id = :2"),
    ];

    for (backend, expected) in cases {
        let mut db = recording_manager(backend, "fake://db");
        db.execute_update(sql, &params)?;
        let executed: Vec<String> = take_events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Execute(_, sql) => Some(sql),
                _ => None,
            })
            .collect();
        assert_eq!(executed, [expected], "{backend}");
    }
    Ok(())
}

#[test]
fn failing_statement_still_releases_its_connection() {
    let mut db = recording_manager(Backend::MySql, "fake://db");

    let err = db.execute_query("SELECT FAIL", &[]).unwrap_err();
    assert!(err.is_query_error());

    let events = take_events();
    let id = opened(&events)[0];
    assert_eq!(
        events,
        vec![
            Event::Open(id),
            Event::Query(id, "SELECT FAIL".into()),
            Event::Close(id),
        ]
    );
}

#[test]
fn failing_statement_in_transaction_keeps_it_active() -> Result<(), Box<dyn std::error::Error>> {
    let mut db = recording_manager(Backend::MySql, "fake://db");
    db.begin_transaction()?;

    let err = db.execute_update("UPDATE FAIL", &[]).unwrap_err();
    assert!(err.is_query_error());
    assert_eq!(db.transaction_state(), TransactionState::Active);
    assert!(db.is_connected());

    db.rollback_transaction()?;
    let events = take_events();
    assert!(!events.iter().any(|e| matches!(e, Event::Close(_))));
    assert!(events.iter().any(|e| matches!(e, Event::Rollback(_))));
    Ok(())
}

#[test]
fn reconnect_replaces_and_closes_previous_connection() -> Result<(), Box<dyn std::error::Error>> {
    let mut db = recording_manager(Backend::MySql, "fake://db");
    db.connect()?;
    db.begin_transaction()?;
    db.connect()?;
    assert_eq!(db.transaction_state(), TransactionState::Autonomous);
    assert!(db.is_connected());

    let events = take_events();
    let ids = opened(&events);
    assert_eq!(ids.len(), 2);
    assert_eq!(
        events,
        vec![
            Event::Open(ids[0]),
            Event::AutoCommit(ids[0], false),
            Event::Open(ids[1]),
            Event::Close(ids[0]),
        ]
    );
    Ok(())
}

#[test]
fn begin_reuses_an_explicit_connection() -> Result<(), Box<dyn std::error::Error>> {
    let mut db = recording_manager(Backend::MySql, "fake://db");
    db.connect()?;
    db.begin_transaction()?;
    db.begin_transaction()?;
    db.commit_transaction()?;

    let events = take_events();
    assert_eq!(opened(&events).len(), 1);
    Ok(())
}

#[test]
fn dropping_the_manager_closes_its_connection() -> Result<(), Box<dyn std::error::Error>> {
    {
        let mut db = recording_manager(Backend::MySql, "fake://db");
        db.connect()?;
    }
    let events = take_events();
    let id = opened(&events)[0];
    assert_eq!(events, vec![Event::Open(id), Event::Close(id)]);
    Ok(())
}

#[test]
fn disconnect_is_idempotent() -> Result<(), Box<dyn std::error::Error>> {
    let mut db = recording_manager(Backend::MySql, "fake://db");
    db.disconnect()?;
    db.connect()?;
    db.disconnect()?;
    db.disconnect()?;

    let events = take_events();
    let closes = events.iter().filter(|e| matches!(e, Event::Close(_))).count();
    assert_eq!(closes, 1);
    Ok(())
}

#[test]
fn disconnect_reports_close_failures() -> Result<(), Box<dyn std::error::Error>> {
    let mut db = recording_manager(Backend::MySql, "fake://CLOSE_FAILS");
    db.connect()?;
    let err = db.disconnect().unwrap_err();
    assert!(err.is_connection_error());
    assert!(!db.is_connected());
    db.disconnect()?;
    Ok(())
}

#[test]
fn count_all_reads_the_lower_cased_count_column() -> Result<(), Box<dyn std::error::Error>> {
    let mut db = recording_manager(Backend::Oracle, "fake://db");
    assert_eq!(db.count_all("users")?, 1);

    let executed = take_events();
    assert!(executed.contains(&Event::Query(
        opened(&executed)[0],
        "SELECT COUNT(*) AS \"count\" FROM users".into()
    )));

    let rs = db.execute_query("SELECT ID, Name FROM users", &[])?;
    let row = rs.first().ok_or("no rows")?;
    assert_eq!(row.get("id"), Some(&DbValue::Int(1)));
    assert_eq!(row.get("name").and_then(DbValue::as_text), Some("Jean"));
    assert!(row.get("Name").is_none());
    Ok(())
}
