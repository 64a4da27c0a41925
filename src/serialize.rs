//! Row serialization
//!
//! Rows are decoded column by column according to the model schema and
//! rendered as JSON objects keyed by column name. Many-to-many fields have no
//! column and therefore never appear here; the detail view adds them
//! separately.

use crate::error::{AdminError, AdminResult};
use crate::models::{FieldKind, ModelSchema};
use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone};
use serde_json::Value;
use sqlx::Row;
use sqlx::sqlite::SqliteRow;
use std::collections::HashMap;
use std::fmt::Display;

/// A serialized record
pub type AdminRecord = HashMap<String, Value>;

/// Render a timestamp as ISO-8601 with fractional seconds only when non-zero
///
/// Fractional seconds are printed as six digits only when non-zero and the
/// offset is always `+HH:MM`.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use reinhardt_panel::serialize::isoformat;
///
/// let ts = Utc.with_ymd_and_hms(2024, 3, 5, 14, 30, 15).unwrap();
/// assert_eq!(isoformat(&ts), "2024-03-05T14:30:15+00:00");
/// ```
pub fn isoformat<Tz>(dt: &DateTime<Tz>) -> String
where
	Tz: TimeZone,
	Tz::Offset: Display,
{
	let micros = dt.timestamp_subsec_micros();
	let base = dt.format("%Y-%m-%dT%H:%M:%S");
	let offset = dt.format("%:z");
	if micros == 0 {
		format!("{}{}", base, offset)
	} else {
		format!("{}.{:06}{}", base, micros % 1_000_000, offset)
	}
}

fn decode_error(column: &str, err: sqlx::Error) -> AdminError {
	AdminError::Database(format!("Failed to decode column '{}': {}", column, err))
}

/// Decode one column of `row` into JSON according to `kind`
fn decode_column(row: &SqliteRow, column: &str, kind: &FieldKind) -> AdminResult<Value> {
	let value = match kind {
		FieldKind::Integer | FieldKind::ForeignKey { .. } => row
			.try_get::<Option<i64>, _>(column)
			.map_err(|e| decode_error(column, e))?
			.map(Value::from),
		FieldKind::Float => row
			.try_get::<Option<f64>, _>(column)
			.map_err(|e| decode_error(column, e))?
			.map(Value::from),
		FieldKind::Boolean => row
			.try_get::<Option<bool>, _>(column)
			.map_err(|e| decode_error(column, e))?
			.map(Value::Bool),
		FieldKind::Text => row
			.try_get::<Option<String>, _>(column)
			.map_err(|e| decode_error(column, e))?
			.map(Value::String),
		FieldKind::DateTime => row
			.try_get::<Option<DateTime<FixedOffset>>, _>(column)
			.map_err(|e| decode_error(column, e))?
			.map(|dt| Value::String(isoformat(&dt))),
		FieldKind::Date => row
			.try_get::<Option<NaiveDate>, _>(column)
			.map_err(|e| decode_error(column, e))?
			.map(|d| Value::String(d.format("%Y-%m-%d").to_string())),
		FieldKind::Json => row
			.try_get::<Option<String>, _>(column)
			.map_err(|e| decode_error(column, e))?
			.map(|raw| serde_json::from_str(&raw).unwrap_or(Value::String(raw))),
		FieldKind::ManyToMany(_) => None,
	};
	Ok(value.unwrap_or(Value::Null))
}

/// Serialize a row, skipping fields named in `exclude`
///
/// `exclude` may name either the field (`tournament`) or its column
/// (`tournament_id`).
pub fn serialize_row(
	schema: &ModelSchema,
	row: &SqliteRow,
	exclude: &[&str],
) -> AdminResult<AdminRecord> {
	let mut record = AdminRecord::new();
	for field in &schema.fields {
		let Some(column) = field.column() else {
			continue;
		};
		if exclude.contains(&field.name.as_str()) || exclude.contains(&column.as_str()) {
			continue;
		}
		let value = decode_column(row, &column, &field.kind)?;
		record.insert(column, value);
	}
	Ok(record)
}
