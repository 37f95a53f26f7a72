use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// A schemaless document body, keyed by top level field name.
pub type Document = Map<String, Value>;

/// Identifier assigned by the store when a document is created. Never reused.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
	#[must_use]
	pub fn generate() -> Self {
		Self(Uuid::new_v4().simple().to_string())
	}

	#[must_use]
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for DocumentId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<String> for DocumentId {
	fn from(id: String) -> Self {
		Self(id)
	}
}

impl From<&str> for DocumentId {
	fn from(id: &str) -> Self {
		Self(id.to_owned())
	}
}

/// State of a single document at one point in time; `data` is `None` when it doesn't exist.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSnapshot {
	pub id: DocumentId,
	pub data: Option<Document>,
}

impl DocumentSnapshot {
	#[must_use]
	pub const fn exists(&self) -> bool {
		self.data.is_some()
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryDocument {
	pub id: DocumentId,
	pub data: Document,
}

/// Every document matching a query, always the complete set rather than a diff.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QuerySnapshot {
	pub docs: Vec<QueryDocument>,
}

impl QuerySnapshot {
	#[must_use]
	pub fn len(&self) -> usize {
		self.docs.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.docs.is_empty()
	}
}

/// Query predicate evaluated against top level document fields.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
	All,
	FieldEq { field: String, value: Value },
}

impl Filter {
	pub fn field_eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
		Self::FieldEq {
			field: field.into(),
			value: value.into(),
		}
	}

	#[must_use]
	pub fn matches(&self, doc: &Document) -> bool {
		match self {
			Self::All => true,
			Self::FieldEq { field, value } => doc.get(field) == Some(value),
		}
	}
}
