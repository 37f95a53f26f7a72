//! The spot entity and its persisted document layout.
//!
//! A spot is stored as one document in the spots collection:
//!
//! ```text
//! { spotName, category, location, coords: {latitude, longitude}, description, userId, createdAt, updatedAt? }
//! ```
//!
//! The document id lives outside the body and becomes [`Spot::id`].

use crate::error::ValidationError;

use std::fmt;

use chrono::{DateTime, Utc};
use sb_store::{Document, DocumentId, UserId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub type SpotId = DocumentId;
pub type OwnerId = UserId;

/// Document field holding the owner, used to scope list queries.
pub const OWNER_FIELD: &str = "userId";

const UNNAMED_SPOT: &str = "Unnamed Spot";
const UNCATEGORIZED: &str = "Uncategorized";

#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("coordinates out of range <lat={latitude}, lng={longitude}>")]
pub struct CoordinatesError {
	pub latitude: f64,
	pub longitude: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
	pub latitude: f64,
	pub longitude: f64,
}

impl Coordinates {
	pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoordinatesError> {
		let coordinates = Self {
			latitude,
			longitude,
		};

		if coordinates.is_valid() {
			Ok(coordinates)
		} else {
			Err(CoordinatesError {
				latitude,
				longitude,
			})
		}
	}

	#[must_use]
	pub fn is_valid(&self) -> bool {
		self.latitude.is_finite()
			&& self.longitude.is_finite()
			&& (-90.0..=90.0).contains(&self.latitude)
			&& (-180.0..=180.0).contains(&self.longitude)
	}

	/// Four decimal places, the way the map picker shows a dropped pin.
	#[must_use]
	pub fn short(&self) -> String {
		format!("Lat: {:.4}, Lng: {:.4}", self.latitude, self.longitude)
	}
}

impl fmt::Display for Coordinates {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}, {}", self.latitude, self.longitude)
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct Spot {
	pub id: SpotId,
	pub owner_id: OwnerId,
	pub name: String,
	pub category: String,
	pub location: String,
	pub coordinates: Option<Coordinates>,
	pub description: String,
	pub created_at: DateTime<Utc>,
	pub updated_at: Option<DateTime<Utc>>,
}

impl Spot {
	pub fn from_document(id: SpotId, doc: Document) -> Result<Self, serde_json::Error> {
		let SpotRecord {
			name,
			category,
			location,
			coordinates,
			description,
			owner_id,
			created_at,
			updated_at,
		} = serde_json::from_value(Value::Object(doc))?;

		Ok(Self {
			id,
			owner_id,
			name,
			category,
			location,
			coordinates,
			description,
			created_at,
			updated_at,
		})
	}

	#[must_use]
	pub fn display_name(&self) -> &str {
		or_placeholder(&self.name, UNNAMED_SPOT)
	}

	#[must_use]
	pub fn display_category(&self) -> &str {
		or_placeholder(&self.category, UNCATEGORIZED)
	}
}

fn or_placeholder<'a>(value: &'a str, placeholder: &'a str) -> &'a str {
	if value.trim().is_empty() {
		placeholder
	} else {
		value
	}
}

/// Body of a spot document.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpotRecord {
	#[serde(rename = "spotName", default)]
	name: String,
	#[serde(default)]
	category: String,
	#[serde(default)]
	location: String,
	#[serde(rename = "coords", default, skip_serializing_if = "Option::is_none")]
	coordinates: Option<Coordinates>,
	#[serde(default)]
	description: String,
	#[serde(rename = "userId")]
	owner_id: OwnerId,
	created_at: DateTime<Utc>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	updated_at: Option<DateTime<Utc>>,
}

/// Fields the user fills in when creating a spot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewSpot {
	pub name: String,
	pub category: String,
	pub location: String,
	pub coordinates: Option<Coordinates>,
	pub description: String,
}

impl NewSpot {
	pub fn validate(&self) -> Result<Coordinates, ValidationError> {
		if self.name.trim().is_empty() {
			return Err(ValidationError::MissingName);
		}

		self.coordinates
			.ok_or(ValidationError::MissingCoordinates)
	}

	pub(crate) fn into_document(
		self,
		owner_id: OwnerId,
		created_at: DateTime<Utc>,
	) -> Result<Document, serde_json::Error> {
		to_document(&SpotRecord {
			name: self.name,
			category: self.category,
			location: self.location,
			coordinates: self.coordinates,
			description: self.description,
			owner_id,
			created_at,
			updated_at: None,
		})
	}
}

/// Fields the edit flow may change. Coordinates and owner are fixed at creation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpotPatch {
	pub name: String,
	pub category: String,
	pub location: String,
	pub description: String,
}

impl SpotPatch {
	pub fn validate(&self) -> Result<(), ValidationError> {
		if self.name.trim().is_empty() {
			Err(ValidationError::MissingName)
		} else if self.location.trim().is_empty() {
			Err(ValidationError::MissingLocation)
		} else {
			Ok(())
		}
	}

	pub(crate) fn into_document(
		self,
		updated_at: DateTime<Utc>,
	) -> Result<Document, serde_json::Error> {
		#[derive(Serialize)]
		#[serde(rename_all = "camelCase")]
		struct PatchRecord {
			#[serde(rename = "spotName")]
			name: String,
			category: String,
			location: String,
			description: String,
			updated_at: DateTime<Utc>,
		}

		to_document(&PatchRecord {
			name: self.name,
			category: self.category,
			location: self.location,
			description: self.description,
			updated_at,
		})
	}
}

fn to_document(value: &impl Serialize) -> Result<Document, serde_json::Error> {
	match serde_json::to_value(value)? {
		Value::Object(doc) => Ok(doc),
		other => Err(serde::ser::Error::custom(format!(
			"expected a document object, got: {other}"
		))),
	}
}
