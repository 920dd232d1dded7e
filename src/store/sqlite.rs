use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params};

use super::Store;
use super::schema::SCHEMA;
use crate::error::{Error, Result};
use crate::types::*;

const REPOSITORY_COLUMNS: &str = r#"id, account, created, "update", organization, project, version,
     readme, type, repository, entry, author, tags"#;

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // Handle SQLite's default datetime format: "YYYY-MM-DD HH:MM:SS"
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            tracing::error!("Invalid datetime in database: '{}' - {}", s, e);
            Utc::now()
        })
}

// Fixed width so that text ordering matches time ordering.
fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn json_column<T: serde::de::DeserializeOwned>(
    row: &Row<'_>,
    idx: usize,
) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn row_to_repository(row: &Row<'_>) -> rusqlite::Result<Repository> {
    Ok(Repository {
        id: row.get(0)?,
        account: row.get(1)?,
        created: parse_datetime(&row.get::<_, String>(2)?),
        update: parse_datetime(&row.get::<_, String>(3)?),
        organization: row.get(4)?,
        project: row.get(5)?,
        version: row.get(6)?,
        readme: row.get(7)?,
        kind: row.get(8)?,
        repository: row.get(9)?,
        entry: row.get(10)?,
        author: row.get(11)?,
        tags: json_column(row, 12)?,
    })
}

fn row_to_identity(row: &Row<'_>) -> rusqlite::Result<Identity> {
    Ok(Identity {
        key: row.get(0)?,
        belong: row.get(1)?,
        created_at: parse_datetime(&row.get::<_, String>(2)?),
        expires_at: row.get::<_, Option<String>>(3)?.map(|s| parse_datetime(&s)),
    })
}

fn row_to_sync_task(row: &Row<'_>) -> rusqlite::Result<SyncTask> {
    let operation: String = row.get(2)?;
    Ok(SyncTask {
        id: row.get(0)?,
        repository_id: row.get(1)?,
        operation: operation.parse().map_err(|e: String| {
            rusqlite::Error::FromSqlConversionFailure(2, Type::Text, e.into())
        })?,
        document: json_column(row, 3)?,
        revision: parse_datetime(&row.get::<_, String>(4)?),
        attempts: row.get(5)?,
        last_error: row.get(6)?,
        created_at: parse_datetime(&row.get::<_, String>(7)?),
    })
}

fn map_constraint(err: rusqlite::Error) -> Error {
    match err {
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            Error::AlreadyExists
        }
        e => Error::from(e),
    }
}

impl Store for SqliteStore {
    fn initialize(&self) -> Result<()> {
        self.conn().execute_batch(SCHEMA)?;
        Ok(())
    }

    // Identity operations

    fn create_identity(&self, identity: &Identity) -> Result<()> {
        self.conn()
            .execute(
                "INSERT INTO identities (token_key, belong, created_at, expires_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    identity.key,
                    identity.belong,
                    format_datetime(&identity.created_at),
                    identity.expires_at.as_ref().map(format_datetime),
                ],
            )
            .map_err(map_constraint)?;
        Ok(())
    }

    fn get_identity(&self, key: &str) -> Result<Option<Identity>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT token_key, belong, created_at, expires_at FROM identities WHERE token_key = ?1",
            params![key],
            row_to_identity,
        )
        .optional()
        .map_err(Error::from)
    }

    // Repository operations

    fn create_repository(&self, repo: &Repository) -> Result<()> {
        self.conn()
            .execute(
                &format!(
                    "INSERT INTO repositories ({REPOSITORY_COLUMNS})
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)"
                ),
                params![
                    repo.id,
                    repo.account,
                    format_datetime(&repo.created),
                    format_datetime(&repo.update),
                    repo.organization,
                    repo.project,
                    repo.version,
                    repo.readme,
                    repo.kind,
                    repo.repository,
                    repo.entry,
                    repo.author,
                    serde_json::to_string(&repo.tags)?,
                ],
            )
            .map_err(map_constraint)?;
        Ok(())
    }

    fn get_repository(&self, id: &str) -> Result<Option<Repository>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {REPOSITORY_COLUMNS} FROM repositories WHERE id = ?1"),
            params![id],
            row_to_repository,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_recent_repositories(&self, limit: i32) -> Result<Vec<Repository>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {REPOSITORY_COLUMNS} FROM repositories
             ORDER BY created DESC, rowid DESC LIMIT ?1"
        ))?;

        let rows = stmt.query_map(params![limit], row_to_repository)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn list_repositories_by_project(
        &self,
        organization: &str,
        project: &str,
    ) -> Result<Vec<Repository>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {REPOSITORY_COLUMNS} FROM repositories
             WHERE organization = ?1 AND project = ?2 ORDER BY created, rowid"
        ))?;

        let rows = stmt.query_map(params![organization, project], row_to_repository)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn update_repository(&self, repo: &Repository) -> Result<()> {
        let rows = self
            .conn()
            .execute(
                r#"UPDATE repositories SET account = ?1, created = ?2, "update" = ?3,
                       organization = ?4, project = ?5, version = ?6, readme = ?7, type = ?8,
                       repository = ?9, entry = ?10, author = ?11, tags = ?12
                   WHERE id = ?13"#,
                params![
                    repo.account,
                    format_datetime(&repo.created),
                    format_datetime(&repo.update),
                    repo.organization,
                    repo.project,
                    repo.version,
                    repo.readme,
                    repo.kind,
                    repo.repository,
                    repo.entry,
                    repo.author,
                    serde_json::to_string(&repo.tags)?,
                    repo.id,
                ],
            )
            .map_err(map_constraint)?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    // Search outbox operations

    fn enqueue_sync_task(
        &self,
        operation: SearchOperation,
        document: &SearchDocument,
        revision: DateTime<Utc>,
        error: &str,
    ) -> Result<()> {
        let payload = serde_json::to_string(document)?;
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        tx.execute(
            "DELETE FROM search_outbox WHERE repository_id = ?1",
            params![document.id],
        )?;
        tx.execute(
            "INSERT INTO search_outbox
                 (repository_id, operation, document, revision, attempts, last_error, created_at)
             VALUES (?1, ?2, ?3, ?4, 1, ?5, ?6)",
            params![
                document.id,
                operation.as_str(),
                payload,
                format_datetime(&revision),
                error,
                format_datetime(&Utc::now()),
            ],
        )?;

        tx.commit()?;
        Ok(())
    }

    fn get_sync_task(&self, id: i64) -> Result<Option<SyncTask>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, repository_id, operation, document, revision, attempts, last_error,
                    created_at
             FROM search_outbox WHERE id = ?1",
        )?;

        stmt.query_row(params![id], row_to_sync_task)
            .optional()
            .map_err(Error::from)
    }

    fn list_sync_tasks(&self, limit: i32) -> Result<Vec<SyncTask>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, repository_id, operation, document, revision, attempts, last_error,
                    created_at
             FROM search_outbox ORDER BY id LIMIT ?1",
        )?;

        let rows = stmt.query_map(params![limit], row_to_sync_task)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn complete_sync_task(&self, id: i64) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM search_outbox WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    fn fail_sync_task(&self, id: i64, error: &str) -> Result<bool> {
        let rows = self.conn().execute(
            "UPDATE search_outbox SET attempts = attempts + 1, last_error = ?1 WHERE id = ?2",
            params![error, id],
        )?;
        Ok(rows > 0)
    }

    fn discard_sync_tasks(&self, repository_id: &str) -> Result<usize> {
        let rows = self.conn().execute(
            "DELETE FROM search_outbox WHERE repository_id = ?1",
            params![repository_id],
        )?;
        Ok(rows)
    }
}
