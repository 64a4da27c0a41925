//! Database integration for admin operations
//!
//! [`AdminDatabase`] builds SQL with sea-query from a [`ModelSchema`] plus
//! filter conditions and executes it on a sqlx SQLite pool. Rows come back
//! already serialized as [`AdminRecord`]s.

use crate::error::{AdminError, AdminResult};
use crate::models::{ManyToMany, ModelSchema};
use crate::query::{Filter, FilterCondition, FilterOperator, FilterValue};
use crate::serialize::{AdminRecord, serialize_row};
use sea_query::{Alias, Condition, Expr, ExprTrait, Order, Query as SeaQuery, SqliteQueryBuilder};
use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

/// Convert FilterValue to sea_query::Value
fn filter_value_to_sea_value(v: &FilterValue) -> sea_query::Value {
	match v {
		FilterValue::String(s) => s.clone().into(),
		FilterValue::Integer(i) => (*i).into(),
		FilterValue::Float(f) => (*f).into(),
		FilterValue::Boolean(b) => (*b).into(),
		FilterValue::Null | FilterValue::Array(_) => sea_query::Value::Int(None),
	}
}

/// Escape character for LIKE patterns
const LIKE_ESCAPE: char = '!';

/// Escape LIKE wildcards in user input
fn escape_like(s: &str) -> String {
	s.replace(LIKE_ESCAPE, "!!")
		.replace('%', "!%")
		.replace('_', "!_")
}

fn like_pattern(pattern: String) -> sea_query::LikeExpr {
	sea_query::LikeExpr::new(pattern).escape(LIKE_ESCAPE)
}

/// Build a SimpleExpr from a single Filter
fn build_single_filter_expr(filter: &Filter) -> Option<sea_query::SimpleExpr> {
	let col = Expr::col(Alias::new(&filter.field));

	let expr = match (&filter.operator, &filter.value) {
		(FilterOperator::IsNull, _) | (FilterOperator::Eq, FilterValue::Null) => col.is_null(),
		(FilterOperator::IsNotNull, _) | (FilterOperator::Ne, FilterValue::Null) => {
			col.is_not_null()
		}
		(FilterOperator::In, FilterValue::Array(values)) => {
			let values: Vec<sea_query::Value> =
				values.iter().map(filter_value_to_sea_value).collect();
			col.is_in(values)
		}
		(FilterOperator::Eq, v) => col.eq(filter_value_to_sea_value(v)),
		(FilterOperator::Ne, v) => col.ne(filter_value_to_sea_value(v)),
		(FilterOperator::Gt, v) => col.gt(filter_value_to_sea_value(v)),
		(FilterOperator::Gte, v) => col.gte(filter_value_to_sea_value(v)),
		(FilterOperator::Lt, v) => col.lt(filter_value_to_sea_value(v)),
		(FilterOperator::Lte, v) => col.lte(filter_value_to_sea_value(v)),
		(FilterOperator::Contains, FilterValue::String(s)) => {
			col.like(like_pattern(format!("%{}%", escape_like(s))))
		}
		(FilterOperator::StartsWith, FilterValue::String(s)) => {
			col.like(like_pattern(format!("{}%", escape_like(s))))
		}
		(FilterOperator::EndsWith, FilterValue::String(s)) => {
			col.like(like_pattern(format!("%{}", escape_like(s))))
		}
		_ => return None,
	};

	Some(expr)
}

/// Build sea-query Condition from FilterCondition
fn build_composite_filter_condition(filter_condition: &FilterCondition) -> Option<Condition> {
	match filter_condition {
		FilterCondition::Single(filter) => {
			build_single_filter_expr(filter).map(|expr| Condition::all().add(expr))
		}
		FilterCondition::Or(conditions) => {
			if conditions.is_empty() {
				return None;
			}
			let mut or_condition = Condition::any();
			for cond in conditions {
				if let Some(sub_cond) = build_composite_filter_condition(cond) {
					or_condition = or_condition.add(sub_cond);
				}
			}
			Some(or_condition)
		}
	}
}

/// Combine an optional composite condition with AND-ed simple filters
fn combined_condition(
	filter_condition: Option<&FilterCondition>,
	filters: &[Filter],
) -> Option<Condition> {
	let mut combined = Condition::all();
	let mut has_any = false;

	if let Some(fc) = filter_condition
		&& !fc.is_empty()
		&& let Some(cond) = build_composite_filter_condition(fc)
	{
		combined = combined.add(cond);
		has_any = true;
	}

	for filter in filters {
		if let Some(expr) = build_single_filter_expr(filter) {
			combined = combined.add(expr);
			has_any = true;
		}
	}

	has_any.then_some(combined)
}

/// SELECT for a page of records
///
/// Statements are rendered to a string here so no sea-query value is held
/// across an await point.
fn select_sql(
	schema: &ModelSchema,
	filter_condition: Option<&FilterCondition>,
	filters: &[Filter],
	sort_by: Option<&str>,
	offset: u64,
	limit: u64,
) -> String {
	let mut query = SeaQuery::select()
		.from(Alias::new(&schema.table))
		.columns(schema.columns().into_iter().map(Alias::new))
		.to_owned();

	if let Some(condition) = combined_condition(filter_condition, filters) {
		query.cond_where(condition);
	}

	let sort = sort_by.unwrap_or(schema.pk.as_str());
	let (field, order) = match sort.strip_prefix('-') {
		Some(stripped) => (stripped, Order::Desc),
		None => (sort, Order::Asc),
	};
	query.order_by(Alias::new(field), order);
	if field != schema.pk {
		query.order_by(Alias::new(&schema.pk), Order::Asc);
	}

	query.limit(limit).offset(offset);
	query.to_string(SqliteQueryBuilder)
}

fn count_sql(
	schema: &ModelSchema,
	filter_condition: Option<&FilterCondition>,
	filters: &[Filter],
) -> String {
	let mut query = SeaQuery::select()
		.from(Alias::new(&schema.table))
		.expr_as(Expr::cust("COUNT(*)"), Alias::new("count"))
		.to_owned();

	if let Some(condition) = combined_condition(filter_condition, filters) {
		query.cond_where(condition);
	}

	query.to_string(SqliteQueryBuilder)
}

/// Admin database interface
///
/// # Examples
///
/// ```no_run
/// use reinhardt_panel::AdminDatabase;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let db = AdminDatabase::connect("sqlite::memory:").await?;
/// sqlx::query("CREATE TABLE events (id INTEGER PRIMARY KEY, name TEXT)")
///     .execute(db.pool())
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct AdminDatabase {
	pool: SqlitePool,
}

impl AdminDatabase {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Connect to the database at `url`
	///
	/// In-memory databases are limited to a single connection so every query
	/// sees the same database.
	pub async fn connect(url: &str) -> AdminResult<Self> {
		let max_connections = if url.contains(":memory:") { 1 } else { 5 };
		let pool = SqlitePoolOptions::new()
			.max_connections(max_connections)
			.connect(url)
			.await?;
		tracing::info!(url, "admin database connected");
		Ok(Self { pool })
	}

	pub fn pool(&self) -> &SqlitePool {
		&self.pool
	}

	/// List records with composite filter conditions
	///
	/// # Arguments
	///
	/// * `filter_condition` - Optional composite condition (e.g. OR search across fields)
	/// * `filters` - Simple filters AND-ed with the condition
	/// * `sort_by` - Optional sort column, `-` prefix for descending; defaults to the primary key
	/// * `exclude` - Fields or columns left out of the serialized records
	#[allow(clippy::too_many_arguments)]
	pub async fn list(
		&self,
		schema: &ModelSchema,
		filter_condition: Option<&FilterCondition>,
		filters: &[Filter],
		sort_by: Option<&str>,
		offset: u64,
		limit: u64,
		exclude: &[&str],
	) -> AdminResult<Vec<AdminRecord>> {
		let sql = select_sql(schema, filter_condition, filters, sort_by, offset, limit);
		tracing::debug!(%sql, "admin list query");
		let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

		rows.iter()
			.map(|row| serialize_row(schema, row, exclude))
			.collect()
	}

	/// Count records matching the same conditions as [`AdminDatabase::list`]
	pub async fn count(
		&self,
		schema: &ModelSchema,
		filter_condition: Option<&FilterCondition>,
		filters: &[Filter],
	) -> AdminResult<u64> {
		let sql = count_sql(schema, filter_condition, filters);
		tracing::debug!(%sql, "admin count query");
		let row = sqlx::query(&sql).fetch_one(&self.pool).await?;
		let count: i64 = row.try_get("count")?;
		Ok(u64::try_from(count).unwrap_or(0))
	}

	/// Fetch the first record matching `filters`
	pub async fn find_one(
		&self,
		schema: &ModelSchema,
		filters: &[Filter],
		exclude: &[&str],
	) -> AdminResult<Option<AdminRecord>> {
		let mut records = self
			.list(schema, None, filters, None, 0, 1, exclude)
			.await?;
		Ok(records.pop())
	}

	/// Fetch a record by primary key
	pub async fn get(
		&self,
		schema: &ModelSchema,
		pk: i64,
		exclude: &[&str],
	) -> AdminResult<Option<AdminRecord>> {
		let filter = Filter::new(&schema.pk, FilterOperator::Eq, FilterValue::Integer(pk));
		self.find_one(schema, &[filter], exclude).await
	}

	/// Related primary keys of a many-to-many relation, ascending
	pub async fn many_to_many_ids(&self, relation: &ManyToMany, pk: i64) -> AdminResult<Vec<i64>> {
		let sql = SeaQuery::select()
			.from(Alias::new(&relation.through))
			.column(Alias::new(&relation.target_column))
			.and_where(Expr::col(Alias::new(&relation.source_column)).eq(pk))
			.order_by(Alias::new(&relation.target_column), Order::Asc)
			.to_string(SqliteQueryBuilder);

		let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
		rows.iter()
			.map(|row| {
				row.try_get::<i64, _>(0usize)
					.map_err(|e| AdminError::Database(e.to_string()))
			})
			.collect()
	}

	/// Delete a record and its many-to-many links in one transaction
	///
	/// Returns the number of deleted records (0 or 1).
	pub async fn delete(&self, schema: &ModelSchema, pk: i64) -> AdminResult<u64> {
		let mut tx = self.pool.begin().await?;

		for (_, relation) in schema.many_to_many_fields() {
			let sql = SeaQuery::delete()
				.from_table(Alias::new(&relation.through))
				.and_where(Expr::col(Alias::new(&relation.source_column)).eq(pk))
				.to_string(SqliteQueryBuilder);
			sqlx::query(&sql).execute(&mut *tx).await?;
		}

		let sql = SeaQuery::delete()
			.from_table(Alias::new(&schema.table))
			.and_where(Expr::col(Alias::new(&schema.pk)).eq(pk))
			.to_string(SqliteQueryBuilder);
		let result = sqlx::query(&sql).execute(&mut *tx).await?;

		tx.commit().await?;
		Ok(result.rows_affected())
	}
}
