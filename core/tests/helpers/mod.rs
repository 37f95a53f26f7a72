//! Shared setup for the spot flow tests

use std::sync::Arc;

use sb_core::{Coordinates, NewSpot, OwnerId, Seebu, SeebuConfig, SessionState};
use sb_geocode::{FixedGeocoder, Geocoder, Place};
use sb_store::{Credentials, MemoryBackend};
use tempfile::TempDir;

pub struct TestApp {
	pub backend: MemoryBackend,
	pub app: Seebu,
	_data_dir: TempDir,
}

impl TestApp {
	pub fn new(geocoder: impl Geocoder + 'static) -> Self {
		let data_dir = TempDir::new().unwrap();
		let backend = MemoryBackend::new();

		let app = Seebu::new(
			SeebuConfig::default_with_dir(data_dir.path().to_path_buf()),
			Arc::new(backend.clone()),
			Arc::new(backend.clone()),
			Arc::new(geocoder),
		);

		Self {
			backend,
			app,
			_data_dir: data_dir,
		}
	}

	pub fn with_denied_location() -> Self {
		Self::new(FixedGeocoder::denied())
	}
}

/// Creates an account and waits until the session guard has seen it.
pub async fn signed_up(app: &Seebu, email: &str) -> OwnerId {
	let owner = app
		.session()
		.sign_up(&Credentials::new(email, "password"))
		.await
		.unwrap();
	app.session()
		.wait_for(|state| *state == SessionState::Authenticated(owner.clone()))
		.await;

	owner
}

pub fn cebu_place() -> Place {
	Place {
		name: Some("Magellan's Cross".into()),
		street: Some("Magallanes St".into()),
		city: Some("Cebu City".into()),
		region: Some("Central Visayas".into()),
		country: Some("Philippines".into()),
		..Default::default()
	}
}

pub fn spot(name: &str, latitude: f64, longitude: f64) -> NewSpot {
	NewSpot {
		name: name.into(),
		coordinates: Some(Coordinates::new(latitude, longitude).unwrap()),
		..Default::default()
	}
}
