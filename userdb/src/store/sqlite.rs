//! SQLite-based storage implementation

use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use rusqlite::types::ToSqlOutput;
use rusqlite::{params, Connection, OptionalExtension, Row, ToSql};
use userdb_core::{PasswordHash, RefreshId, VerifyCode};

use super::{
    AccountId, AccountStore, Collection, Lookup, NewAccount, NormalizedEmail, StoreResult,
    StoreSession, TempUser, User,
};
use crate::error::AccountError;

const SCHEMA: &str = r#"
    -- Accounts awaiting email verification
    CREATE TABLE IF NOT EXISTS temp_users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE,
        password TEXT NOT NULL,
        verify_code TEXT NOT NULL,
        created_at TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_temp_users_created_at ON temp_users(created_at);

    -- Verified accounts
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE,
        password TEXT NOT NULL,
        refresh_id BLOB,
        created_at TEXT NOT NULL
    );
"#;

/// SQLite-based account store
pub struct SqliteAccountStore {
    conn: Mutex<Connection>,
}

impl SqliteAccountStore {
    /// Open or create a SQLite database at the given path
    pub fn open(path: &str) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        tracing::info!(path = %path, "Opened account database");
        Self::init(conn)
    }

    /// Open a private database that lives only as long as the store
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> StoreResult<Self> {
        conn.execute_batch(SCHEMA)?;
        tracing::debug!("Account tables ready");

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl AccountStore for SqliteAccountStore {
    fn with_transaction<T, F>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&mut dyn StoreSession) -> StoreResult<T>,
    {
        // A panic inside a previous transaction rolled it back, so the
        // connection is still consistent.
        let mut conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        let tx = conn.transaction()?;

        let out = f(&mut SqliteSession { conn: &tx })?;

        tx.commit()?;
        Ok(out)
    }
}

/// Session over an open transaction
struct SqliteSession<'c> {
    conn: &'c Connection,
}

impl ToSql for NormalizedEmail {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

fn lookup_param(lookup: &Lookup) -> &dyn ToSql {
    match lookup {
        Lookup::Id(id) => &id.0,
        Lookup::Email(email) => email,
    }
}

fn insert_error(e: rusqlite::Error, email: &str) -> AccountError {
    if let rusqlite::Error::SqliteFailure(ref err, _) = e {
        if err.code == rusqlite::ErrorCode::ConstraintViolation {
            return AccountError::EmailAlreadyExists(email.to_string());
        }
    }
    AccountError::from(e)
}

fn temp_user_from_row(row: &Row<'_>) -> rusqlite::Result<TempUser> {
    let id: i64 = row.get(0)?;
    let password: String = row.get(3)?;
    let verify_code: String = row.get(4)?;
    Ok(TempUser {
        id: AccountId(id),
        name: row.get(1)?,
        email: row.get(2)?,
        password_hash: PasswordHash::from_stored(password),
        verify_code: VerifyCode::new(verify_code),
        created_at: row.get(5)?,
    })
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    let id: i64 = row.get(0)?;
    let password: String = row.get(3)?;
    let refresh_id: Option<Vec<u8>> = row.get(4)?;
    Ok(User {
        id: AccountId(id),
        name: row.get(1)?,
        email: row.get(2)?,
        password_hash: PasswordHash::from_stored(password),
        refresh_id: refresh_id.map(RefreshId::from_bytes),
        created_at: row.get(5)?,
    })
}

impl StoreSession for SqliteSession<'_> {
    fn exists(&mut self, collection: Collection, lookup: &Lookup) -> StoreResult<bool> {
        let sql = format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE {} = ?1)",
            collection.table_name(),
            lookup.column()
        );

        let found = self
            .conn
            .query_row(&sql, params![lookup_param(lookup)], |row| row.get(0))?;
        Ok(found)
    }

    fn fetch_temp_user(&mut self, lookup: &Lookup) -> StoreResult<Option<TempUser>> {
        let sql = format!(
            "SELECT id, name, email, password, verify_code, created_at FROM temp_users WHERE {} = ?1",
            lookup.column()
        );

        let user = self
            .conn
            .query_row(&sql, params![lookup_param(lookup)], temp_user_from_row)
            .optional()?;
        Ok(user)
    }

    fn fetch_user(&mut self, lookup: &Lookup) -> StoreResult<Option<User>> {
        let sql = format!(
            "SELECT id, name, email, password, refresh_id, created_at FROM users WHERE {} = ?1",
            lookup.column()
        );

        let user = self
            .conn
            .query_row(&sql, params![lookup_param(lookup)], user_from_row)
            .optional()?;
        Ok(user)
    }

    fn insert_temp_user(&mut self, new: &NewAccount, code: &VerifyCode) -> StoreResult<AccountId> {
        let id: i64 = self
            .conn
            .query_row(
                "INSERT INTO temp_users (name, email, password, verify_code, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5) RETURNING id",
                params![
                    new.name,
                    new.email,
                    new.password_hash.as_str(),
                    code.as_str(),
                    Utc::now(),
                ],
                |row| row.get(0),
            )
            .map_err(|e| insert_error(e, &new.email))?;

        Ok(AccountId(id))
    }

    fn insert_user(&mut self, new: &NewAccount) -> StoreResult<AccountId> {
        let id: i64 = self
            .conn
            .query_row(
                "INSERT INTO users (name, email, password, created_at)
                 VALUES (?1, ?2, ?3, ?4) RETURNING id",
                params![new.name, new.email, new.password_hash.as_str(), Utc::now()],
                |row| row.get(0),
            )
            .map_err(|e| insert_error(e, &new.email))?;

        Ok(AccountId(id))
    }

    fn delete(&mut self, collection: Collection, id: AccountId) -> StoreResult<usize> {
        let sql = format!("DELETE FROM {} WHERE id = ?1", collection.table_name());
        Ok(self.conn.execute(&sql, params![id.0])?)
    }

    fn set_verify_code(&mut self, id: AccountId, code: &VerifyCode) -> StoreResult<usize> {
        let rows_affected = self.conn.execute(
            "UPDATE temp_users SET verify_code = ?1 WHERE id = ?2",
            params![code.as_str(), id.0],
        )?;
        Ok(rows_affected)
    }

    fn set_refresh_id(&mut self, id: AccountId, refresh_id: &RefreshId) -> StoreResult<usize> {
        let rows_affected = self.conn.execute(
            "UPDATE users SET refresh_id = ?1 WHERE id = ?2",
            params![refresh_id.as_bytes(), id.0],
        )?;
        Ok(rows_affected)
    }

    fn delete_temp_users_before(&mut self, cutoff: DateTime<Utc>) -> StoreResult<u64> {
        let rows_deleted = self
            .conn
            .execute("DELETE FROM temp_users WHERE created_at < ?1", params![cutoff])?;
        Ok(rows_deleted as u64)
    }
}
