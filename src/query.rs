//! Filter expressions for admin list queries
//!
//! Query-string filters arrive as `field=value` or `field__lookup=value`.
//! [`parse_lookup`] validates the field against the model schema and coerces
//! the value to the column's kind.

use crate::error::{AdminError, AdminResult};
use crate::models::{FieldKind, ModelSchema};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOperator {
	Eq,
	Ne,
	Gt,
	Gte,
	Lt,
	Lte,
	In,
	Contains,
	StartsWith,
	EndsWith,
	IsNull,
	IsNotNull,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
	String(String),
	Integer(i64),
	Float(f64),
	Boolean(bool),
	Array(Vec<FilterValue>),
	Null,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
	pub field: String,
	pub operator: FilterOperator,
	pub value: FilterValue,
}

impl Filter {
	pub fn new(field: impl Into<String>, operator: FilterOperator, value: FilterValue) -> Self {
		Self {
			field: field.into(),
			operator,
			value,
		}
	}
}

/// Composite filter condition; `Or` nests for search across fields
#[derive(Debug, Clone, PartialEq)]
pub enum FilterCondition {
	Single(Filter),
	Or(Vec<FilterCondition>),
}

impl FilterCondition {
	/// OR condition over simple filters
	pub fn or_filters(filters: Vec<Filter>) -> Self {
		Self::Or(filters.into_iter().map(Self::Single).collect())
	}

	pub fn is_empty(&self) -> bool {
		match self {
			Self::Single(_) => false,
			Self::Or(c) => c.iter().all(FilterCondition::is_empty),
		}
	}
}

/// Split `tournament_id__gte` into (`tournament_id`, `gte`)
fn split_lookup(key: &str) -> (&str, &str) {
	match key.rsplit_once("__") {
		Some((field, lookup)) => (field, lookup),
		None => (key, "exact"),
	}
}

/// Coerce a raw query-string value to the kind stored in `column`
pub fn coerce_value(kind: &FieldKind, column: &str, raw: &str) -> AdminResult<FilterValue> {
	let invalid = || {
		AdminError::BadRequest(format!(
			"Invalid value '{}' for filter field '{}'",
			raw, column
		))
	};
	match kind {
		FieldKind::Integer | FieldKind::ForeignKey { .. } => raw
			.trim()
			.parse::<i64>()
			.map(FilterValue::Integer)
			.map_err(|_| invalid()),
		FieldKind::Float => raw
			.trim()
			.parse::<f64>()
			.map(FilterValue::Float)
			.map_err(|_| invalid()),
		FieldKind::Boolean => parse_bool(raw).map(FilterValue::Boolean).ok_or_else(invalid),
		_ => Ok(FilterValue::String(raw.to_string())),
	}
}

fn parse_bool(raw: &str) -> Option<bool> {
	match raw.trim().to_ascii_lowercase().as_str() {
		"true" | "1" | "yes" | "on" => Some(true),
		"false" | "0" | "no" | "off" => Some(false),
		_ => None,
	}
}

/// Parse one query-string filter against `schema`
///
/// # Examples
///
/// ```
/// use reinhardt_panel::models::{FieldKind, ModelSchema};
/// use reinhardt_panel::query::{parse_lookup, FilterOperator, FilterValue};
///
/// let schema = ModelSchema::new("Event", "events").foreign_key("tournament", "Tournament");
/// let filter = parse_lookup(&schema, "tournament_id__gte", "3").unwrap();
/// assert_eq!(filter.operator, FilterOperator::Gte);
/// assert_eq!(filter.value, FilterValue::Integer(3));
/// ```
pub fn parse_lookup(schema: &ModelSchema, key: &str, raw: &str) -> AdminResult<Filter> {
	let (column, lookup) = split_lookup(key);
	let field = schema.field_for_column(column).ok_or_else(|| {
		AdminError::BadRequest(format!(
			"Unknown filter field '{}'. Allowed filter fields: {:?}",
			column,
			schema.columns()
		))
	})?;

	let (operator, value) = match lookup {
		"exact" | "eq" => (FilterOperator::Eq, coerce_value(&field.kind, column, raw)?),
		"ne" => (FilterOperator::Ne, coerce_value(&field.kind, column, raw)?),
		"gt" => (FilterOperator::Gt, coerce_value(&field.kind, column, raw)?),
		"gte" => (FilterOperator::Gte, coerce_value(&field.kind, column, raw)?),
		"lt" => (FilterOperator::Lt, coerce_value(&field.kind, column, raw)?),
		"lte" => (FilterOperator::Lte, coerce_value(&field.kind, column, raw)?),
		// SQLite LIKE is case-insensitive for ASCII, so both lookups share one operator
		"contains" | "icontains" => (FilterOperator::Contains, FilterValue::String(raw.into())),
		"startswith" | "istartswith" => {
			(FilterOperator::StartsWith, FilterValue::String(raw.into()))
		}
		"endswith" | "iendswith" => (FilterOperator::EndsWith, FilterValue::String(raw.into())),
		"in" => {
			let values = raw
				.split(',')
				.map(str::trim)
				.filter(|v| !v.is_empty())
				.map(|v| coerce_value(&field.kind, column, v))
				.collect::<AdminResult<Vec<_>>>()?;
			(FilterOperator::In, FilterValue::Array(values))
		}
		"isnull" => match parse_bool(raw) {
			Some(true) => (FilterOperator::IsNull, FilterValue::Null),
			Some(false) => (FilterOperator::IsNotNull, FilterValue::Null),
			None => {
				return Err(AdminError::BadRequest(format!(
					"Invalid value '{}' for filter field '{}'",
					raw, column
				)));
			}
		},
		other => {
			return Err(AdminError::BadRequest(format!(
				"Unsupported lookup '{}' on field '{}'",
				other, column
			)));
		}
	};

	Ok(Filter::new(column, operator, value))
}
