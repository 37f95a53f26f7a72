use anyhow::Result;
use sb_core::{binding::or_not_available, Spot};
use serde::Serialize;

pub fn print_json(output: &impl Serialize) -> Result<()> {
	println!("{}", serde_json::to_string_pretty(output)?);
	Ok(())
}

/// Spot as printed by the CLI.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpotOutput {
	pub id: String,
	pub name: String,
	pub category: String,
	pub location: String,
	pub description: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub latitude: Option<f64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub longitude: Option<f64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub address: Option<String>,
	pub created_at: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub updated_at: Option<String>,
}

impl From<&Spot> for SpotOutput {
	fn from(spot: &Spot) -> Self {
		Self {
			id: spot.id.to_string(),
			name: spot.display_name().to_owned(),
			category: spot.display_category().to_owned(),
			location: spot.location.clone(),
			description: or_not_available(&spot.description).to_owned(),
			latitude: spot.coordinates.map(|c| c.latitude),
			longitude: spot.coordinates.map(|c| c.longitude),
			address: None,
			created_at: spot.created_at.to_rfc3339(),
			updated_at: spot.updated_at.map(|at| at.to_rfc3339()),
		}
	}
}
