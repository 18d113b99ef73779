mod common;

use common::{USERS_COLUMNS, sqlite_manager};
use db_manager::prelude::*;

const INSERT: &str = "INSERT INTO users (name, age) VALUES (?, ?)";

fn setup() -> Result<(tempfile::TempDir, DatabaseManager), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let mut db = sqlite_manager(&dir.path().join("tx.db"));
    db.create_table_if_absent("users", USERS_COLUMNS)?;
    db.execute_update(INSERT, &["Marie Martin".into(), 28.into()])?;
    Ok((dir, db))
}

fn name_of(db: &mut DatabaseManager, id: i64) -> Result<Option<String>, DbManagerError> {
    let rs = db.execute_query("SELECT name FROM users WHERE id = ?", &[id.into()])?;
    Ok(rs
        .first()
        .and_then(|row| row.get("name"))
        .and_then(DbValue::as_text)
        .map(str::to_string))
}

#[test]
fn committed_work_is_visible() -> Result<(), Box<dyn std::error::Error>> {
    let (_dir, mut db) = setup()?;

    db.begin_transaction()?;
    assert_eq!(db.transaction_state(), TransactionState::Active);
    assert!(db.is_connected());

    db.execute_update(INSERT, &["Utilisateur Test".into(), 30.into()])?;
    db.execute_update(
        "UPDATE users SET name = ? WHERE id = ?",
        &["Nom Modifié".into(), 1.into()],
    )?;
    // The pinned connection sees its own uncommitted rows.
    assert_eq!(db.count_all("users")?, 2);
    db.commit_transaction()?;

    assert_eq!(db.transaction_state(), TransactionState::Autonomous);
    assert_eq!(db.count_all("users")?, 2);
    assert_eq!(name_of(&mut db, 1)?.as_deref(), Some("Nom Modifié"));
    db.disconnect()?;
    assert!(!db.is_connected());

    // Still there on fresh connections after the pinned one is gone.
    db.connect()?;
    assert_eq!(db.count_all("users")?, 2);
    assert_eq!(name_of(&mut db, 1)?.as_deref(), Some("Nom Modifié"));
    assert_eq!(name_of(&mut db, 2)?.as_deref(), Some("Utilisateur Test"));
    db.disconnect()?;
    Ok(())
}

#[test]
fn rollback_discards_work() -> Result<(), Box<dyn std::error::Error>> {
    let (_dir, mut db) = setup()?;

    db.begin_transaction()?;
    db.execute_update(INSERT, &["Temporaire".into(), 50.into()])?;
    db.execute_update("DELETE FROM users WHERE id = ?", &[1.into()])?;
    db.rollback_transaction()?;

    assert_eq!(db.transaction_state(), TransactionState::Autonomous);
    assert_eq!(db.count_all("users")?, 1);
    assert_eq!(name_of(&mut db, 1)?.as_deref(), Some("Marie Martin"));
    Ok(())
}

#[test]
fn failed_statement_leaves_transaction_for_the_caller() -> Result<(), Box<dyn std::error::Error>> {
    let (_dir, mut db) = setup()?;

    db.begin_transaction()?;
    db.execute_update(INSERT, &["Avant".into(), 41.into()])?;
    let err = db
        .execute_update(
            "INSERT INTO users (id, name, age) VALUES (?, ?, ?)",
            &[1.into(), "Doublon".into(), 20.into()],
        )
        .unwrap_err();
    assert!(err.is_query_error(), "{err}");

    // Still pinned: the failure neither commits nor rolls back.
    assert_eq!(db.transaction_state(), TransactionState::Active);
    assert!(db.is_connected());
    assert_eq!(db.count_all("users")?, 2);

    db.rollback_transaction()?;
    assert_eq!(db.count_all("users")?, 1);
    Ok(())
}

#[test]
fn uncommitted_work_is_invisible_to_other_sessions() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("isolation.db");
    let mut writer = sqlite_manager(&path);
    let mut reader = sqlite_manager(&path);
    writer.create_table_if_absent("users", USERS_COLUMNS)?;

    writer.begin_transaction()?;
    writer.execute_update(INSERT, &["Invisible".into(), 33.into()])?;
    assert_eq!(reader.count_all("users")?, 0);

    writer.commit_transaction()?;
    assert_eq!(reader.count_all("users")?, 1);
    Ok(())
}

#[test]
fn commit_without_transaction_is_a_no_op() -> Result<(), Box<dyn std::error::Error>> {
    let (_dir, mut db) = setup()?;
    db.commit_transaction()?;
    db.rollback_transaction()?;
    assert_eq!(db.transaction_state(), TransactionState::Autonomous);
    assert!(!db.is_connected());
    assert_eq!(db.count_all("users")?, 1);
    Ok(())
}

#[test]
fn explicit_connection_stays_in_auto_commit() -> Result<(), Box<dyn std::error::Error>> {
    let (_dir, mut db) = setup()?;
    let conn = db.connect()?;
    assert!(conn.auto_commit());

    // Without a transaction, statements still use their own connections.
    db.execute_update(INSERT, &["Autonome".into(), 19.into()])?;
    assert!(db.is_connected());
    assert_eq!(db.count_all("users")?, 2);
    db.disconnect()?;
    db.disconnect()?;
    Ok(())
}

#[test]
fn dropping_an_active_manager_discards_its_transaction() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("drop.db");
    {
        let mut db = sqlite_manager(&path);
        db.create_table_if_absent("users", USERS_COLUMNS)?;
        db.begin_transaction()?;
        db.execute_update(INSERT, &["Perdu".into(), 60.into()])?;
    }
    let mut db = sqlite_manager(&path);
    assert_eq!(db.count_all("users")?, 0);
    Ok(())
}
