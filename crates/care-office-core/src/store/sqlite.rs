//! SQLite-backed [`RemoteStore`].

use std::path::Path;

use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection, ErrorCode, OptionalExtension};
use serde_json::Value;

use super::{
    Filter, FilterOp, Order, RemoteError, RemoteStore, StoreError, StoreResult, SCHEMA,
};
use crate::models::{FileUpload, Fields, RecordId, Table};

/// Base of the URLs returned by [`SqliteStore::public_url`].
pub const LOCAL_PUBLIC_BASE: &str = "local://storage";

/// Record and file store over one SQLite connection.
pub struct SqliteStore {
    conn: Connection,
}

/// Translate constraint failures into the store's error codes.
fn classify(err: rusqlite::Error) -> StoreError {
    if let rusqlite::Error::SqliteFailure(code, Some(message)) = &err {
        if code.code == ErrorCode::ConstraintViolation {
            let pg_code = if message.contains("UNIQUE") || message.contains("PRIMARY KEY") {
                "23505"
            } else if message.contains("NOT NULL") {
                "23502"
            } else {
                "23514"
            };
            return StoreError::Remote(RemoteError::new(Some(pg_code), message.clone()));
        }
    }
    StoreError::Sqlite(err)
}

fn sql_value(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => SqlValue::Real(n.as_f64().unwrap_or_default()),
        },
        Value::String(s) => SqlValue::Text(s.clone()),
        other => SqlValue::Text(other.to_string()),
    }
}

impl SqliteStore {
    /// Open store at path, creating if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.initialize()?;
        Ok(store)
    }

    /// Create in-memory store (for testing).
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.initialize()?;
        Ok(store)
    }

    fn initialize(&self) -> StoreResult<()> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Get raw connection (for advanced queries).
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Number of records in a table.
    pub fn count(&self, table: Table) -> StoreResult<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM records WHERE tbl = ?",
            [table.as_str()],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Whether a file exists in a bucket.
    pub fn file_exists(&self, bucket: &str, path: &str) -> StoreResult<bool> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM files WHERE bucket = ?1 AND path = ?2",
                params![bucket, path],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }
}

impl RemoteStore for SqliteStore {
    fn create(&self, table: Table, record: &Fields) -> StoreResult<Fields> {
        let mut body = record.clone();
        let id = match body.get("id").and_then(Value::as_str) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => uuid::Uuid::new_v4().to_string(),
        };
        body.insert("id".to_string(), Value::String(id.clone()));

        self.conn
            .execute(
                "INSERT INTO records (tbl, id, body) VALUES (?1, ?2, ?3)",
                params![table.as_str(), id, serde_json::to_string(&body)?],
            )
            .map_err(classify)?;
        Ok(body)
    }

    fn update(&self, table: Table, id: &RecordId, patch: &Fields) -> StoreResult<()> {
        let body: Option<String> = self
            .conn
            .query_row(
                "SELECT body FROM records WHERE tbl = ?1 AND id = ?2",
                params![table.as_str(), id.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        let body = body.ok_or_else(|| StoreError::NotFound {
            table,
            id: id.clone(),
        })?;

        let mut fields: Fields = serde_json::from_str(&body)?;
        for (key, value) in patch {
            if key != "id" {
                fields.insert(key.clone(), value.clone());
            }
        }

        self.conn
            .execute(
                r#"
                UPDATE records SET body = ?3, updated_at = datetime('now')
                WHERE tbl = ?1 AND id = ?2
                "#,
                params![table.as_str(), id.as_str(), serde_json::to_string(&fields)?],
            )
            .map_err(classify)?;
        Ok(())
    }

    fn delete(&self, table: Table, id: &RecordId) -> StoreResult<()> {
        let rows_affected = self.conn.execute(
            "DELETE FROM records WHERE tbl = ?1 AND id = ?2",
            params![table.as_str(), id.as_str()],
        )?;
        if rows_affected == 0 {
            return Err(StoreError::NotFound {
                table,
                id: id.clone(),
            });
        }
        Ok(())
    }

    fn query(
        &self,
        table: Table,
        filters: &[Filter],
        order: Option<&Order>,
    ) -> StoreResult<Vec<Fields>> {
        let mut sql = String::from("SELECT body FROM records WHERE tbl = ?");
        let mut args = vec![SqlValue::Text(table.as_str().to_string())];

        for filter in filters {
            let path = SqlValue::Text(format!("$.{}", filter.field));
            match (&filter.value, filter.op) {
                (Value::Null, _) => {
                    sql.push_str(" AND json_extract(body, ?) IS NULL");
                    args.push(path);
                }
                (value, op) => {
                    let op = match op {
                        FilterOp::Eq => "=",
                        FilterOp::Gte => ">=",
                        FilterOp::Lte => "<=",
                    };
                    sql.push_str(&format!(" AND json_extract(body, ?) {} ?", op));
                    args.push(path);
                    args.push(sql_value(value));
                }
            }
        }

        match order {
            Some(order) => {
                sql.push_str(if order.ascending {
                    " ORDER BY json_extract(body, ?) ASC, seq"
                } else {
                    " ORDER BY json_extract(body, ?) DESC, seq"
                });
                args.push(SqlValue::Text(format!("$.{}", order.field)));
            }
            None => sql.push_str(" ORDER BY seq"),
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(args.iter()), |row| row.get::<_, String>(0))?;

        let mut records = Vec::new();
        for row in rows {
            records.push(serde_json::from_str(&row?)?);
        }
        Ok(records)
    }

    fn upload_file(&self, bucket: &str, path: &str, file: &FileUpload) -> StoreResult<()> {
        self.conn
            .execute(
                r#"
                INSERT INTO files (bucket, path, content_type, bytes) VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT (bucket, path) DO UPDATE SET
                    content_type = excluded.content_type,
                    bytes = excluded.bytes,
                    created_at = datetime('now')
                "#,
                params![bucket, path, file.content_type, file.bytes],
            )
            .map_err(classify)?;
        Ok(())
    }

    fn download_file(&self, bucket: &str, path: &str) -> StoreResult<Vec<u8>> {
        self.conn
            .query_row(
                "SELECT bytes FROM files WHERE bucket = ?1 AND path = ?2",
                params![bucket, path],
                |row| row.get(0),
            )
            .optional()?
            .ok_or_else(|| StoreError::FileNotFound {
                bucket: bucket.to_string(),
                path: path.to_string(),
            })
    }

    fn remove_file(&self, bucket: &str, path: &str) -> StoreResult<()> {
        self.conn.execute(
            "DELETE FROM files WHERE bucket = ?1 AND path = ?2",
            params![bucket, path],
        )?;
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/{}/{}", LOCAL_PUBLIC_BASE, bucket, path)
    }
}
