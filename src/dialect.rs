//! Per-backend SQL text generation.
//!
//! Each backend gets one static [`Dialect`] table of plain functions; selection is an
//! exhaustive match on [`Backend`], so adding a backend without a dialect does not
//! compile.

use crate::translation::PlaceholderStyle;
use crate::types::Backend;

/// SQL generation rules for one backend.
#[derive(Debug)]
pub struct Dialect {
    backend: Backend,
    create_table: fn(&str, &str) -> String,
    drop_table: fn(&str) -> String,
    count_all: fn(&str) -> String,
    auto_increment: fn(&str) -> String,
    upper_cases_identifiers: bool,
    placeholder_style: PlaceholderStyle,
}

impl Dialect {
    #[must_use]
    pub fn backend(&self) -> Backend {
        self.backend
    }

    /// Idempotent `CREATE TABLE`; `columns` is the definition list without parentheses.
    #[must_use]
    pub fn create_table_if_absent(&self, table: &str, columns: &str) -> String {
        (self.create_table)(table, columns)
    }

    /// Idempotent `DROP TABLE`.
    #[must_use]
    pub fn drop_table_if_present(&self, table: &str) -> String {
        (self.drop_table)(table)
    }

    /// `SELECT COUNT(*)` aliased as `count`.
    #[must_use]
    pub fn count_all(&self, table: &str) -> String {
        (self.count_all)(table)
    }

    /// Column declaration for an auto-incremented integer primary key.
    #[must_use]
    pub fn auto_increment_primary_key(&self, column: &str) -> String {
        (self.auto_increment)(column)
    }

    /// Whether unquoted identifiers are folded to upper case by the server.
    ///
    /// Informational only: result labels are always lower-cased.
    #[must_use]
    pub fn upper_cases_identifiers(&self) -> bool {
        self.upper_cases_identifiers
    }

    #[must_use]
    pub fn placeholder_style(&self) -> PlaceholderStyle {
        self.placeholder_style
    }
}

impl Backend {
    /// The SQL dialect of this backend.
    #[must_use]
    pub fn dialect(self) -> &'static Dialect {
        match self {
            Backend::MySql => &MYSQL,
            Backend::PostgreSql => &POSTGRESQL,
            Backend::SqlServer => &SQLSERVER,
            Backend::Oracle => &ORACLE,
        }
    }
}

static MYSQL: Dialect = Dialect {
    backend: Backend::MySql,
    create_table: native_create_table,
    drop_table: native_drop_table,
    count_all: plain_count_all,
    auto_increment: |column| format!("{column} INT PRIMARY KEY AUTO_INCREMENT"),
    upper_cases_identifiers: false,
    placeholder_style: PlaceholderStyle::MySql,
};

static POSTGRESQL: Dialect = Dialect {
    backend: Backend::PostgreSql,
    create_table: native_create_table,
    drop_table: native_drop_table,
    count_all: plain_count_all,
    auto_increment: |column| format!("{column} INTEGER GENERATED ALWAYS AS IDENTITY PRIMARY KEY"),
    upper_cases_identifiers: false,
    placeholder_style: PlaceholderStyle::Postgres,
};

static SQLSERVER: Dialect = Dialect {
    backend: Backend::SqlServer,
    create_table: |table, columns| {
        format!(
            "IF NOT EXISTS (SELECT * FROM sys.tables WHERE name = '{}') BEGIN CREATE TABLE {table} ({columns}) END",
            escape_literal(table)
        )
    },
    drop_table: |table| {
        format!(
            "IF OBJECT_ID('{}', 'U') IS NOT NULL DROP TABLE {table}",
            escape_literal(table)
        )
    },
    count_all: plain_count_all,
    auto_increment: |column| format!("{column} INT IDENTITY(1,1) PRIMARY KEY"),
    upper_cases_identifiers: false,
    placeholder_style: PlaceholderStyle::SqlServer,
};

// ORA-00955: name is already used by an existing object
// ORA-00942: table or view does not exist
static ORACLE: Dialect = Dialect {
    backend: Backend::Oracle,
    create_table: |table, columns| {
        format!(
            "BEGIN EXECUTE IMMEDIATE '{}'; EXCEPTION WHEN OTHERS THEN IF SQLCODE = -955 THEN NULL; ELSE RAISE; END IF; END;",
            escape_literal(&format!("CREATE TABLE {table} ({columns})"))
        )
    },
    drop_table: |table| {
        format!(
            "BEGIN EXECUTE IMMEDIATE '{}'; EXCEPTION WHEN OTHERS THEN IF SQLCODE != -942 THEN RAISE; END IF; END;",
            escape_literal(&format!("DROP TABLE {table}"))
        )
    },
    count_all: |table| format!("SELECT COUNT(*) AS \"count\" FROM {table}"),
    auto_increment: |column| format!("{column} NUMBER GENERATED ALWAYS AS IDENTITY PRIMARY KEY"),
    upper_cases_identifiers: true,
    placeholder_style: PlaceholderStyle::Oracle,
};

fn native_create_table(table: &str, columns: &str) -> String {
    format!("CREATE TABLE IF NOT EXISTS {table} ({columns})")
}

fn native_drop_table(table: &str) -> String {
    format!("DROP TABLE IF EXISTS {table}")
}

fn plain_count_all(table: &str) -> String {
    format!("SELECT COUNT(*) AS count FROM {table}")
}

fn escape_literal(text: &str) -> String {
    text.replace('\'', "''")
}
