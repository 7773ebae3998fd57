//! Database access layer with connection pooling and migrations
//!
//! This module is organized by domain:
//! - `employees` - Employees and their skills
//! - `skills` - Skill catalog
//! - `projects` - Projects and skill requirements
//! - `allocations` - Weekly allocations of employees to projects
//! - `bottlenecks` - Recorded bottlenecks and their lifecycle
//! - `snapshots` - Periodic capacity snapshots per department
//! - `analytics` - Aggregate queries feeding the capacity engine
//! - `gateway` - `CapacityGateway` implementation over the pool
//! - `audit` - Audit log

use chrono::{DateTime, NaiveDate, Utc};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use tracing::info;

use crate::error::{Error, Result};

mod allocations;
mod analytics;
mod audit;
mod bottlenecks;
mod employees;
mod gateway;
mod projects;
mod skills;
mod snapshots;

pub use audit::{AuditEntry, AuditFilter};
pub use projects::MAX_REQUIREMENT_QUANTITY;
pub use snapshots::DepartmentSnapshot;

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConn = PooledConnection<SqliteConnectionManager>;

/// Environment variable for database encryption key
pub const DB_KEY_ENV: &str = "STAFFLINE_DB_KEY";

/// Derive an encryption key from a passphrase using Argon2
///
/// Uses a fixed application salt so the same passphrase always produces the same key,
/// regardless of database path.
fn derive_key(passphrase: &str) -> Result<String> {
    use argon2::{password_hash::SaltString, Argon2, PasswordHasher};

    // Changing this invalidates every existing encrypted database
    const APP_SALT: &[u8; 16] = b"staffline-salt-1";

    let salt = SaltString::encode_b64(APP_SALT)
        .map_err(|e| Error::Encryption(format!("Failed to create salt: {}", e)))?;

    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(passphrase.as_bytes(), &salt)
        .map_err(|e| Error::Encryption(format!("Failed to derive key: {}", e)))?;

    let hash_str = hash
        .hash
        .ok_or_else(|| Error::Encryption("No hash output".to_string()))?;
    Ok(hex::encode(hash_str.as_bytes()))
}

/// SQLite's CURRENT_TIMESTAMP layout
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parse a stored "YYYY-MM-DD HH:MM:SS" timestamp
pub(crate) fn parse_datetime(s: &str) -> Result<DateTime<Utc>> {
    chrono::NaiveDateTime::parse_from_str(s, DATETIME_FORMAT)
        .map(|dt| dt.and_utc())
        .map_err(|e| Error::InvalidData(format!("Bad timestamp '{}': {}", s, e)))
}

/// Read a timestamp column inside a row mapper
pub(crate) fn datetime_column(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let text: String = row.get(idx)?;
    chrono::NaiveDateTime::parse_from_str(&text, DATETIME_FORMAT)
        .map(|dt| dt.and_utc())
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

/// Parse a stored "YYYY-MM-DD" date
pub(crate) fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| Error::InvalidData(format!("Bad date '{}': {}", s, e)))
}

/// Format a timestamp the way SQLite's CURRENT_TIMESTAMP does
pub(crate) fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.format(DATETIME_FORMAT).to_string()
}

/// Database wrapper with connection pooling
#[derive(Clone)]
pub struct Database {
    pool: DbPool,
    /// Path to the database file
    db_path: String,
}

impl Database {
    /// Create a new database connection pool with encryption
    ///
    /// Requires `STAFFLINE_DB_KEY` to be set. The database is encrypted with
    /// SQLCipher using a key derived from the passphrase via Argon2.
    ///
    /// Use `new_unencrypted()` for development/testing without encryption.
    pub fn new(path: &str) -> Result<Self> {
        match std::env::var(DB_KEY_ENV).ok() {
            Some(key) => Self::new_with_key(path, Some(&key)),
            None => Err(Error::Encryption(format!(
                "Database encryption required. Set {} environment variable with your passphrase, \
                or use --no-encrypt for unencrypted databases (not recommended for production).",
                DB_KEY_ENV
            ))),
        }
    }

    /// Create a new unencrypted database connection pool
    pub fn new_unencrypted(path: &str) -> Result<Self> {
        Self::new_with_key(path, None)
    }

    /// Create a new database with an explicit encryption key
    pub fn new_with_key(path: &str, passphrase: Option<&str>) -> Result<Self> {
        let manager = SqliteConnectionManager::file(path);

        let pool = if let Some(pass) = passphrase {
            let key = derive_key(pass)?;
            let key_pragma = format!("PRAGMA key = 'x\"{}\"';", key);

            // Every pooled connection needs the key before first use
            let manager = manager.with_init(move |conn| {
                conn.execute_batch(&key_pragma)?;
                conn.execute_batch("PRAGMA foreign_keys = ON;")?;
                Ok(())
            });

            Pool::builder().max_size(10).build(manager)?
        } else {
            let manager =
                manager.with_init(|conn| conn.execute_batch("PRAGMA foreign_keys = ON;"));
            Pool::builder().max_size(10).build(manager)?
        };

        let db = Self {
            pool,
            db_path: path.to_string(),
        };
        db.run_migrations()?;

        info!(path = %db.db_path, encrypted = passphrase.is_some(), "Database opened");
        Ok(db)
    }

    /// Get the path to the database file
    pub fn path(&self) -> &str {
        &self.db_path
    }

    /// Create an in-memory database (for testing)
    ///
    /// Note: Uses a temporary file rather than `:memory:` because SQLCipher
    /// has issues with in-memory databases in the connection pool.
    pub fn in_memory() -> Result<Self> {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);

        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        let path = std::env::temp_dir().join(format!(
            "staffline_test_{}_{}.db",
            std::process::id(),
            id
        ));
        let path = path.to_string_lossy().to_string();

        let _ = std::fs::remove_file(&path);

        Self::new_unencrypted(&path)
    }

    /// Get a connection from the pool
    pub fn conn(&self) -> Result<DbConn> {
        Ok(self.pool.get()?)
    }

    /// Run database migrations
    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn()?;

        conn.execute_batch(
            r#"
            PRAGMA foreign_keys = ON;

            -- WAL mode: readers don't block writers (the engine reads concurrently)
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;

            CREATE TABLE IF NOT EXISTS employees (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                department TEXT NOT NULL,
                default_hours REAL NOT NULL DEFAULT 40,  -- contracted hours per week
                status TEXT NOT NULL DEFAULT 'active',   -- active, inactive
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_employees_department ON employees(department);
            CREATE INDEX IF NOT EXISTS idx_employees_status ON employees(status);

            CREATE TABLE IF NOT EXISTS skills (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL UNIQUE COLLATE NOCASE,
                category TEXT NOT NULL DEFAULT 'other'   -- technical, soft, domain, other
            );

            CREATE TABLE IF NOT EXISTS employee_skills (
                employee_id INTEGER NOT NULL REFERENCES employees(id) ON DELETE CASCADE,
                skill_id INTEGER NOT NULL REFERENCES skills(id) ON DELETE CASCADE,
                level TEXT NOT NULL,                     -- beginner .. expert
                PRIMARY KEY (employee_id, skill_id)
            );

            CREATE INDEX IF NOT EXISTS idx_employee_skills_skill ON employee_skills(skill_id);

            CREATE TABLE IF NOT EXISTS projects (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'planning', -- planning, active, on_hold, completed
                start_date DATE,
                end_date DATE,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE TABLE IF NOT EXISTS project_skill_requirements (
                project_id INTEGER NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
                skill_id INTEGER NOT NULL REFERENCES skills(id) ON DELETE CASCADE,
                quantity INTEGER NOT NULL DEFAULT 1,     -- requested headcount
                PRIMARY KEY (project_id, skill_id)
            );

            CREATE TABLE IF NOT EXISTS allocations (
                id INTEGER PRIMARY KEY,
                employee_id INTEGER NOT NULL REFERENCES employees(id) ON DELETE CASCADE,
                project_id INTEGER NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
                week_start DATE NOT NULL,                -- Monday of the allocated week
                allocated_hours REAL NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_allocations_week ON allocations(week_start);
            CREATE INDEX IF NOT EXISTS idx_allocations_employee ON allocations(employee_id);
            CREATE INDEX IF NOT EXISTS idx_allocations_project ON allocations(project_id);

            CREATE TABLE IF NOT EXISTS bottlenecks (
                id INTEGER PRIMARY KEY,
                type TEXT NOT NULL,                      -- skill, department, resource, time
                affected_resource TEXT NOT NULL,
                severity TEXT NOT NULL,                  -- derived from impact on write
                impact REAL NOT NULL,
                affected_projects TEXT NOT NULL DEFAULT '[]',   -- JSON array of project ids
                estimated_duration_days INTEGER NOT NULL DEFAULT 0,
                root_causes TEXT NOT NULL DEFAULT '[]',         -- JSON array
                recommended_actions TEXT NOT NULL DEFAULT '[]', -- JSON array
                status TEXT NOT NULL DEFAULT 'active',   -- active, predicted, resolved
                identified_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                resolved_at DATETIME
            );

            CREATE INDEX IF NOT EXISTS idx_bottlenecks_status ON bottlenecks(status);

            CREATE TABLE IF NOT EXISTS capacity_snapshots (
                id INTEGER PRIMARY KEY,
                snapshot_date DATE NOT NULL,
                department TEXT NOT NULL,
                utilization REAL NOT NULL,
                capacity_hours REAL NOT NULL,
                demand_hours REAL NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                UNIQUE (snapshot_date, department)
            );

            CREATE INDEX IF NOT EXISTS idx_capacity_snapshots_date ON capacity_snapshots(snapshot_date);

            -- Audit log (tracks all API access)
            CREATE TABLE IF NOT EXISTS audit_log (
                id INTEGER PRIMARY KEY,
                timestamp DATETIME DEFAULT CURRENT_TIMESTAMP,
                user_email TEXT NOT NULL,
                action TEXT NOT NULL,
                entity_type TEXT,
                entity_id INTEGER,
                details TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_audit_log_timestamp ON audit_log(timestamp);
            CREATE INDEX IF NOT EXISTS idx_audit_log_action ON audit_log(action);
            "#,
        )?;

        Ok(())
    }
}

#[cfg(test)]
mod tests;
