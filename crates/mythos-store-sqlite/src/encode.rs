//! Moving records between Rust types and SQLite rows.
//!
//! Records go through `serde_json` on both sides: a record serialises to a
//! flat object whose keys are column names, and a row is read back into such
//! an object before deserialising. UUIDs and timestamps therefore land as
//! their serde string forms (hyphenated lowercase, RFC 3339).

use rusqlite::{
  Connection, Params, Row,
  types::{Value as SqlValue, ValueRef},
};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Number, Value};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

fn to_sql(value: Value) -> SqlValue {
  match value {
    Value::Null => SqlValue::Null,
    Value::Bool(b) => SqlValue::Integer(i64::from(b)),
    Value::Number(n) => match n.as_i64() {
      Some(i) => SqlValue::Integer(i),
      None => n.as_f64().map_or(SqlValue::Null, SqlValue::Real),
    },
    Value::String(s) => SqlValue::Text(s),
    nested => SqlValue::Text(nested.to_string()),
  }
}

fn from_sql(value: ValueRef<'_>) -> Value {
  match value {
    ValueRef::Null | ValueRef::Blob(_) => Value::Null,
    ValueRef::Integer(i) => Value::from(i),
    ValueRef::Real(f) => Number::from_f64(f).map_or(Value::Null, Value::Number),
    ValueRef::Text(t) => Value::String(String::from_utf8_lossy(t).into_owned()),
  }
}

fn quote(column: &str) -> String { format!("\"{column}\"") }

// ─── Writes ──────────────────────────────────────────────────────────────────

/// A record flattened into parallel column and value lists, ready to bind.
#[derive(Debug, Clone)]
pub struct RawRow {
  columns: Vec<String>,
  values:  Vec<SqlValue>,
}

impl RawRow {
  pub fn encode<T: Serialize>(record: &T) -> Result<Self> {
    let Value::Object(map) = serde_json::to_value(record)? else {
      return Err(Error::Encode(std::any::type_name::<T>()));
    };
    let (columns, values) = map.into_iter().map(|(k, v)| (k, to_sql(v))).unzip();
    Ok(Self { columns, values })
  }

  pub fn insert(&self, conn: &Connection, table: &str) -> rusqlite::Result<usize> {
    let columns = self.columns.iter().map(|c| quote(c)).collect::<Vec<_>>().join(", ");
    let marks = (1..=self.columns.len())
      .map(|i| format!("?{i}"))
      .collect::<Vec<_>>()
      .join(", ");
    conn.execute(
      &format!("INSERT INTO {table} ({columns}) VALUES ({marks})"),
      rusqlite::params_from_iter(&self.values),
    )
  }

  /// Overwrite every column of the row whose `id` is `id`.
  pub fn update(&self, conn: &Connection, table: &str, id: &str) -> rusqlite::Result<usize> {
    let sets = self
      .columns
      .iter()
      .enumerate()
      .map(|(i, c)| format!("{} = ?{}", quote(c), i + 1))
      .collect::<Vec<_>>()
      .join(", ");
    let sql = format!("UPDATE {table} SET {sets} WHERE id = ?{}", self.columns.len() + 1);
    let params = self
      .values
      .iter()
      .cloned()
      .chain(std::iter::once(SqlValue::Text(id.to_owned())));
    conn.execute(&sql, rusqlite::params_from_iter(params))
  }
}

// ─── Reads ───────────────────────────────────────────────────────────────────

fn read_row(row: &Row<'_>, columns: &[String]) -> rusqlite::Result<Value> {
  let mut map = Map::with_capacity(columns.len());
  for (i, name) in columns.iter().enumerate() {
    map.insert(name.clone(), from_sql(row.get_ref(i)?));
  }
  Ok(Value::Object(map))
}

/// Run `sql` and return every row as a JSON object keyed by column name.
pub fn query_json<P: Params>(conn: &Connection, sql: &str, params: P) -> rusqlite::Result<Vec<Value>> {
  let mut stmt = conn.prepare(sql)?;
  let columns: Vec<String> = stmt.column_names().into_iter().map(str::to_owned).collect();
  let rows = stmt.query_map(params, |row| read_row(row, &columns))?;
  rows.collect()
}

pub fn decode<T: DeserializeOwned>(row: Value) -> Result<T> { Ok(serde_json::from_value(row)?) }

pub fn decode_all<T: DeserializeOwned>(rows: Vec<Value>) -> Result<Vec<T>> {
  rows.into_iter().map(decode).collect()
}
