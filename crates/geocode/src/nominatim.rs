use crate::{GeocodeError, Geocoder, Permission, Place};

use async_trait::async_trait;
use reqwest::header::USER_AGENT;
use serde::Deserialize;
use tracing::{instrument, trace};

pub const DEFAULT_NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";

/// OpenStreetMap Nominatim reverse geocoder.
///
/// There is no device prompt on this path: the permission is whatever the user configured.
#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
	http: reqwest::Client,
	endpoint: String,
	user_agent: String,
	enabled: bool,
}

impl NominatimGeocoder {
	pub fn new(endpoint: impl Into<String>, user_agent: impl Into<String>, enabled: bool) -> Self {
		Self {
			http: reqwest::Client::new(),
			endpoint: endpoint.into().trim_end_matches('/').to_owned(),
			user_agent: user_agent.into(),
			enabled,
		}
	}
}

#[derive(Debug, Default, Deserialize)]
struct ReverseResponse {
	error: Option<String>,
	name: Option<String>,
	display_name: Option<String>,
	#[serde(default)]
	address: ReverseAddress,
}

#[derive(Debug, Default, Deserialize)]
struct ReverseAddress {
	road: Option<String>,
	city: Option<String>,
	town: Option<String>,
	village: Option<String>,
	county: Option<String>,
	state: Option<String>,
	country: Option<String>,
}

impl ReverseResponse {
	fn into_place(self) -> Result<Place, GeocodeError> {
		if let Some(error) = self.error {
			return Err(GeocodeError::Provider(error));
		}

		let ReverseAddress {
			road,
			city,
			town,
			village,
			county,
			state,
			country,
		} = self.address;

		Ok(Place {
			name: self.name,
			street: road,
			city: city.or(town).or(village),
			subregion: county,
			region: state,
			country,
			display_name: self.display_name,
		})
	}
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
	async fn request_permission(&self) -> Permission {
		if self.enabled {
			Permission::Granted
		} else {
			Permission::Denied
		}
	}

	#[instrument(skip(self), err)]
	async fn reverse_geocode(&self, latitude: f64, longitude: f64) -> Result<Place, GeocodeError> {
		let response = self
			.http
			.get(format!("{}/reverse", self.endpoint))
			.header(USER_AGENT, &self.user_agent)
			.query(&[
				("format", "jsonv2".to_owned()),
				("lat", latitude.to_string()),
				("lon", longitude.to_string()),
			])
			.send()
			.await?
			.error_for_status()?
			.json::<ReverseResponse>()
			.await?;

		trace!(?response, "Nominatim response");

		response.into_place()
	}
}
