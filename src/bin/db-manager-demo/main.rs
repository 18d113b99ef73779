mod args;
mod logging;

use std::process::ExitCode;

use clap::Parser;
use db_manager::prelude::*;
use tracing::Level;

use crate::args::Args;
use crate::logging::LogWriter;

fn main() -> ExitCode {
    let args = Args::parse();
    let writer = LogWriter::new(args.log.clone()).unwrap_or_else(|err| {
        eprintln!("failed to open log file: {err}");
        std::process::exit(1);
    });

    tracing_subscriber::fmt()
        .with_writer(writer)
        .with_target(false)
        .with_max_level(Level::from(args.log_level))
        .init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let factory = DatabaseManagerFactory::new(DbConfig::load(&args.config)?);
    let mut db = match args.backend {
        Some(backend) => factory.create_manager_for(backend)?,
        None => factory.create_default_manager()?,
    };
    tracing::info!(backend = %db.backend(), "using backend");

    db.connect()?;

    let columns = format!(
        "{}, name VARCHAR(100), age INT, email VARCHAR(100)",
        db.dialect().auto_increment_primary_key("id")
    );
    db.create_table_if_absent("users", &columns)?;

    let insert = "INSERT INTO users (name, age, email) VALUES (?, ?, ?)";
    db.execute_update(insert, &["Jean Dupont".into(), 35.into(), "jean@example.com".into()])?;
    db.execute_update(insert, &["Marie Martin".into(), 28.into(), "marie@example.com".into()])?;

    println!("users older than 25:");
    print_rows(&db.execute_query("SELECT * FROM users WHERE age > ?", &[25.into()])?)?;

    let renamed = db.execute_update(
        "UPDATE users SET name = ? WHERE id = ?",
        &["Nouveau Nom".into(), 1.into()],
    )?;
    println!("rows updated: {renamed}");

    run_transaction(&mut db)?;

    println!("all users:");
    print_rows(&db.execute_query("SELECT * FROM users", &[])?)?;
    println!("user count: {}", db.count_all("users")?);

    db.disconnect()
}

/// Insert and rename inside one transaction. A failure there is reported and rolled
/// back so the rest of the walkthrough still runs.
fn run_transaction(db: &mut DatabaseManager) -> Result<()> {
    db.begin_transaction()?;
    match transfer(db).and_then(|()| db.commit_transaction()) {
        Ok(()) => println!("transaction committed"),
        Err(err) => {
            eprintln!("transaction failed, rolling back: {err}");
            if let Err(rollback_err) = db.rollback_transaction() {
                tracing::warn!(error = %rollback_err, "rollback failed; dropping the connection");
                if let Err(close_err) = db.disconnect() {
                    tracing::debug!(error = %close_err, "ignoring disconnect error");
                }
            }
        }
    }
    Ok(())
}

fn transfer(db: &mut DatabaseManager) -> Result<()> {
    db.execute_update(
        "INSERT INTO users (name, age, email) VALUES (?, ?, ?)",
        &["Utilisateur Test".into(), 30.into(), "test@example.com".into()],
    )?;
    db.execute_update(
        "UPDATE users SET name = ? WHERE id = ?",
        &["Nom Modifié".into(), 2.into()],
    )?;
    Ok(())
}

fn print_rows(rows: &ResultSet) -> Result<()> {
    for row in rows {
        let line = serde_json::to_string(row)
            .map_err(|e| DbManagerError::QueryError(format!("cannot render row: {e}")))?;
        println!("{line}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use db_manager::results::RawResult;

    use super::*;

    /// Opens fine, then loses the session on the first statement.
    struct Unreachable {
        auto_commit: bool,
        closed: bool,
    }

    fn unreachable_connect(_: &ConnectionConfig) -> Result<Box<dyn Connection>> {
        Ok(Box::new(Unreachable {
            auto_commit: true,
            closed: false,
        }))
    }

    fn lost() -> DbManagerError {
        DbManagerError::ConnectionError("connection reset by peer".into())
    }

    impl Connection for Unreachable {
        fn query(&mut self, _sql: &str, _params: &[DbValue]) -> Result<RawResult> {
            Err(lost())
        }

        fn execute(&mut self, _sql: &str, _params: &[DbValue]) -> Result<u64> {
            Err(lost())
        }

        fn auto_commit(&self) -> bool {
            self.auto_commit
        }

        fn set_auto_commit(&mut self, enabled: bool) -> Result<()> {
            self.auto_commit = enabled;
            Ok(())
        }

        fn commit(&mut self) -> Result<()> {
            Ok(())
        }

        fn rollback(&mut self) -> Result<()> {
            Ok(())
        }

        fn is_closed(&self) -> bool {
            self.closed
        }

        fn close(&mut self) -> Result<()> {
            self.closed = true;
            Ok(())
        }
    }

    #[test]
    fn connection_loss_inside_the_transaction_is_rolled_back() {
        let mut db = DatabaseManager::with_connector(
            Backend::MySql,
            ConnectionConfig::new("demo://unreachable"),
            unreachable_connect,
        );

        run_transaction(&mut db).unwrap();
        assert_eq!(db.transaction_state(), TransactionState::Autonomous);
    }
}
