use super::{check_columns, Collection, RecordStore, Row, StoreError, StoreErrorKind};
use rusqlite::types::{Value, ValueRef};
use rusqlite::{params_from_iter, Connection};
use serde_json::Value as JsonValue;
use std::path::Path;
use uuid::Uuid;

/// SQLite-backed store with the same tables as the hosted one.
pub struct LocalStore {
    conn: Connection,
}

impl LocalStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::new(StoreErrorKind::Io, e.to_string()))?;
        }
        let conn = Connection::open(path)?;
        init_schema(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        init_schema(&conn)?;
        Ok(Self { conn })
    }
}

fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    // `payment_amount` and `amount` carry no declared type so values keep
    // whatever shape the caller wrote, as in the hosted store.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schedule(
            id TEXT PRIMARY KEY,
            name TEXT,
            phone TEXT,
            email TEXT,
            day TEXT,
            start_time TEXT,
            end_time TEXT,
            grade TEXT,
            payment_amount,
            type TEXT,
            added_date TEXT NOT NULL
        )",
        [],
    )?;
    conn.execute(
        "CREATE TABLE IF NOT EXISTS lesson_history(
            id TEXT PRIMARY KEY,
            client_id TEXT,
            client_name TEXT,
            amount,
            date TEXT,
            status TEXT,
            created_at TEXT NOT NULL
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_lesson_history_client_date
            ON lesson_history(client_id, date)",
        [],
    )?;
    Ok(())
}

fn json_to_sql(v: &JsonValue) -> Value {
    match v {
        JsonValue::Null => Value::Null,
        JsonValue::Bool(b) => Value::Integer(i64::from(*b)),
        JsonValue::Number(n) => match n.as_i64() {
            Some(i) => Value::Integer(i),
            None => Value::Real(n.as_f64().unwrap_or(0.0)),
        },
        JsonValue::String(s) => Value::Text(s.clone()),
        other => Value::Text(other.to_string()),
    }
}

fn sql_to_json(v: ValueRef<'_>) -> JsonValue {
    match v {
        ValueRef::Null | ValueRef::Blob(_) => JsonValue::Null,
        ValueRef::Integer(i) => JsonValue::from(i),
        ValueRef::Real(f) => serde_json::Number::from_f64(f)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null),
        ValueRef::Text(t) => JsonValue::String(String::from_utf8_lossy(t).into_owned()),
    }
}

fn now_ts() -> String {
    chrono::Utc::now().to_rfc3339()
}

impl LocalStore {
    fn select(&self, collection: Collection, id: Option<&str>) -> Result<Vec<Row>, StoreError> {
        let table = collection.table();
        let sql = match id {
            Some(_) => format!("SELECT * FROM {} WHERE id = ?", table),
            None => format!(
                "SELECT * FROM {} ORDER BY {}, id",
                table,
                collection.created_column()
            ),
        };
        let mut stmt = self.conn.prepare(&sql)?;
        let names: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();
        let args: Vec<Value> = id.map(|v| Value::Text(v.to_string())).into_iter().collect();
        let rows = stmt
            .query_map(params_from_iter(args), |r| {
                let mut out = Row::new();
                for (i, name) in names.iter().enumerate() {
                    out.insert(name.clone(), sql_to_json(r.get_ref(i)?));
                }
                Ok(out)
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

impl RecordStore for LocalStore {
    fn backend(&self) -> &'static str {
        "sqlite"
    }

    fn list(&self, collection: Collection) -> Result<Vec<Row>, StoreError> {
        tracing::debug!(table = collection.table(), "store list");
        self.select(collection, None)
    }

    fn insert(&self, collection: Collection, row: Row) -> Result<Row, StoreError> {
        tracing::debug!(table = collection.table(), "store insert");
        check_columns(collection, &row)?;
        let id = Uuid::new_v4().to_string();
        let mut columns = vec!["id".to_string(), collection.created_column().to_string()];
        let mut values = vec![Value::Text(id.clone()), Value::Text(now_ts())];
        for (k, v) in &row {
            columns.push(k.clone());
            values.push(json_to_sql(v));
        }
        let placeholders = vec!["?"; columns.len()].join(", ");
        let sql = format!(
            "INSERT INTO {}({}) VALUES({})",
            collection.table(),
            columns.join(", "),
            placeholders
        );
        self.conn.execute(&sql, params_from_iter(values))?;
        self.select(collection, Some(&id))?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::new(StoreErrorKind::Decode, "inserted row not readable"))
    }

    fn update(&self, collection: Collection, id: &str, patch: Row) -> Result<(), StoreError> {
        tracing::debug!(table = collection.table(), %id, "store update");
        check_columns(collection, &patch)?;
        let mut sets = Vec::with_capacity(patch.len());
        let mut values = Vec::with_capacity(patch.len() + 1);
        for (k, v) in &patch {
            sets.push(format!("{} = ?", k));
            values.push(json_to_sql(v));
        }
        values.push(Value::Text(id.to_string()));
        let sql = format!(
            "UPDATE {} SET {} WHERE id = ?",
            collection.table(),
            sets.join(", ")
        );
        let changed = self.conn.execute(&sql, params_from_iter(values))?;
        if changed == 0 {
            return Err(StoreError::new(
                StoreErrorKind::NotFound,
                format!("{} row not found: {}", collection.table(), id),
            ));
        }
        Ok(())
    }

    fn delete(&self, collection: Collection, id: &str) -> Result<(), StoreError> {
        tracing::debug!(table = collection.table(), %id, "store delete");
        let sql = format!("DELETE FROM {} WHERE id = ?", collection.table());
        let changed = self.conn.execute(&sql, [id])?;
        if changed == 0 {
            return Err(StoreError::new(
                StoreErrorKind::NotFound,
                format!("{} row not found: {}", collection.table(), id),
            ));
        }
        Ok(())
    }
}
