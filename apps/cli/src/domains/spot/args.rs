use clap::Args;
use sb_core::{
	navigation::{CreateParams, FormPrefill},
	spot::CoordinatesError,
	Coordinates,
};

#[derive(Args, Debug)]
pub struct SpotCreateArgs {
	/// Spot name
	#[arg(long)]
	pub name: String,
	#[arg(long)]
	pub category: Option<String>,
	/// Filled from the coordinates when left out
	#[arg(long)]
	pub location: Option<String>,
	#[arg(long)]
	pub description: Option<String>,
	/// Latitude of the pin, in degrees
	#[arg(long, allow_hyphen_values = true, requires = "longitude")]
	pub latitude: Option<f64>,
	/// Longitude of the pin, in degrees
	#[arg(long, allow_hyphen_values = true, requires = "latitude")]
	pub longitude: Option<f64>,
}

impl SpotCreateArgs {
	/// What the create screen receives when coming back from the map picker.
	pub fn params(&self) -> Result<CreateParams, CoordinatesError> {
		let pending = match (self.latitude, self.longitude) {
			(Some(latitude), Some(longitude)) => Some(Coordinates::new(latitude, longitude)?),
			_ => None,
		};

		Ok(CreateParams {
			prefill: FormPrefill {
				name: Some(self.name.clone()),
				category: self.category.clone(),
				description: self.description.clone(),
			},
			pending,
		})
	}
}

#[derive(Args, Debug)]
pub struct SpotEditArgs {
	pub id: String,
	#[arg(long)]
	pub name: Option<String>,
	#[arg(long)]
	pub category: Option<String>,
	#[arg(long)]
	pub location: Option<String>,
	#[arg(long)]
	pub description: Option<String>,
}
