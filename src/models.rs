//! Model schema descriptions
//!
//! The admin operates on dynamic rows, so each registered model carries a
//! [`ModelSchema`] telling the database and serialization layers which
//! columns exist and how to decode them.

use serde::Serialize;

/// Many-to-many relation stored in an association table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManyToMany {
	/// Related model name
	pub to: String,
	/// Association table
	pub through: String,
	/// Column in `through` pointing at this model
	pub source_column: String,
	/// Column in `through` pointing at the related model
	pub target_column: String,
}

/// Storage and serialization kind of a field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
	Integer,
	Float,
	Boolean,
	Text,
	DateTime,
	Date,
	Json,
	/// Foreign key stored in the `<name>_id` column
	ForeignKey { to: String },
	/// Relation without a column on this table
	ManyToMany(ManyToMany),
}

/// A single model field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldSpec {
	pub name: String,
	pub kind: FieldKind,
}

impl FieldSpec {
	pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
		Self {
			name: name.into(),
			kind,
		}
	}

	/// Column backing this field, `None` for many-to-many relations
	pub fn column(&self) -> Option<String> {
		match &self.kind {
			FieldKind::ForeignKey { .. } => Some(format!("{}_id", self.name)),
			FieldKind::ManyToMany(_) => None,
			_ => Some(self.name.clone()),
		}
	}

	pub fn is_many_to_many(&self) -> bool {
		matches!(self.kind, FieldKind::ManyToMany(_))
	}
}

/// Table-level description of a model
///
/// # Examples
///
/// ```
/// use reinhardt_panel::models::{FieldKind, ModelSchema};
///
/// let schema = ModelSchema::new("Event", "events")
///     .field("name", FieldKind::Text)
///     .foreign_key("tournament", "Tournament")
///     .many_to_many("participants", "Participant", "event_participants", "event_id", "participant_id");
///
/// assert_eq!(schema.columns(), vec!["id", "name", "tournament_id"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelSchema {
	pub name: String,
	pub table: String,
	pub pk: String,
	pub fields: Vec<FieldSpec>,
}

impl ModelSchema {
	/// Create a schema with an integer `id` primary key
	pub fn new(name: impl Into<String>, table: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			table: table.into(),
			pk: "id".to_string(),
			fields: vec![FieldSpec::new("id", FieldKind::Integer)],
		}
	}

	/// Rename the primary key column (the field list keeps one integer pk)
	pub fn primary_key(mut self, pk: impl Into<String>) -> Self {
		let pk = pk.into();
		if let Some(field) = self.fields.iter_mut().find(|f| f.name == self.pk) {
			field.name = pk.clone();
		}
		self.pk = pk;
		self
	}

	pub fn field(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
		self.fields.push(FieldSpec::new(name, kind));
		self
	}

	pub fn foreign_key(self, name: impl Into<String>, to: impl Into<String>) -> Self {
		self.field(name, FieldKind::ForeignKey { to: to.into() })
	}

	pub fn many_to_many(
		self,
		name: impl Into<String>,
		to: impl Into<String>,
		through: impl Into<String>,
		source_column: impl Into<String>,
		target_column: impl Into<String>,
	) -> Self {
		self.field(
			name,
			FieldKind::ManyToMany(ManyToMany {
				to: to.into(),
				through: through.into(),
				source_column: source_column.into(),
				target_column: target_column.into(),
			}),
		)
	}

	/// Column names in declaration order
	pub fn columns(&self) -> Vec<String> {
		self.fields.iter().filter_map(FieldSpec::column).collect()
	}

	pub fn has_column(&self, column: &str) -> bool {
		self.fields
			.iter()
			.any(|f| f.column().as_deref() == Some(column))
	}

	/// Field stored in `column`
	pub fn field_for_column(&self, column: &str) -> Option<&FieldSpec> {
		self.fields
			.iter()
			.find(|f| f.column().as_deref() == Some(column))
	}

	pub fn many_to_many_fields(&self) -> impl Iterator<Item = (&str, &ManyToMany)> {
		self.fields.iter().filter_map(|f| match &f.kind {
			FieldKind::ManyToMany(rel) => Some((f.name.as_str(), rel)),
			_ => None,
		})
	}
}
