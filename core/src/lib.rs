//! Seebu core: tourist spots kept live from a remote document store.
//!
//! Screens never own data directly. They hold bindings ([`binding`]) that mirror live
//! subscriptions opened through the [`SpotRepository`], scoped to the owner reported by the
//! [`SessionGuard`].

#![warn(
	clippy::all,
	clippy::pedantic,
	clippy::correctness,
	clippy::perf,
	clippy::style,
	clippy::suspicious,
	clippy::complexity,
	clippy::nursery,
	clippy::unwrap_used,
	unused_qualifications,
	rust_2018_idioms,
	trivial_casts,
	trivial_numeric_casts,
	unused_allocation,
	clippy::unnecessary_cast,
	clippy::cast_lossless,
	clippy::cast_possible_truncation,
	clippy::cast_possible_wrap,
	clippy::cast_precision_loss,
	clippy::cast_sign_loss,
	clippy::dbg_macro,
	clippy::deprecated_cfg_attr,
	clippy::separated_literal_suffix,
	deprecated
)]
#![forbid(deprecated_in_future)]
#![allow(clippy::missing_errors_doc, clippy::module_name_repetitions)]

use std::{path::Path, sync::Arc};

use sb_geocode::{Geocoder, NominatimGeocoder};
use sb_store::{DocumentStore, IdentityProvider};
use tokio::sync::mpsc;
use tracing::info;
use tracing_appender::{non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{
	filter::{Directive, LevelFilter},
	fmt::{self, Layer},
	prelude::*,
	EnvFilter,
};

pub mod binding;
pub mod config;
pub mod error;
pub mod navigation;
pub mod repository;
pub mod session;
pub mod spot;

pub use binding::{
	BindingView, CreateForm, EditForm, LiveBinding, MapPicker, SessionScope, SpotDetailBinding,
	SpotListBinding, ViewState,
};
pub use config::SeebuConfig;
pub use error::{Error, ValidationError};
pub use navigation::{Navigation, Route};
pub use repository::SpotRepository;
pub use session::{Access, SessionGuard, SessionState};
pub use spot::{Coordinates, NewSpot, OwnerId, Spot, SpotId, SpotPatch};

#[cfg(debug_assertions)]
const CONSOLE_LOG_FILTER: LevelFilter = LevelFilter::INFO;

#[cfg(not(debug_assertions))]
const CONSOLE_LOG_FILTER: LevelFilter = LevelFilter::WARN;

const LOGGED_CRATES: [&str; 4] = ["sb_core", "sb_store", "sb_geocode", "seebu"];

/// Installs the global tracing subscriber: console output plus a daily rolling file in
/// `logs_dir`. `RUST_LOG` overrides the default directives.
///
/// Keep the returned guard alive for as long as file logs should be written.
pub fn init_logging(
	log_level: &str,
	logs_dir: impl AsRef<Path>,
) -> Result<WorkerGuard, config::ConfigError> {
	let (non_blocking, guard) =
		tracing_appender::non_blocking(rolling::daily(logs_dir.as_ref(), "seebu.log"));

	let filter = match EnvFilter::try_from_default_env() {
		Ok(filter) => filter,
		Err(_) => LOGGED_CRATES.iter().try_fold(
			EnvFilter::new("warn"),
			|filter, krate| {
				format!("{krate}={log_level}")
					.parse::<Directive>()
					.map(|directive| filter.add_directive(directive))
					.map_err(|e| config::ConfigError::LogDirective(e.to_string()))
			},
		)?,
	};

	tracing_subscriber::registry()
		.with(filter)
		.with(
			fmt::layer()
				.with_writer(std::io::stderr)
				.with_filter(CONSOLE_LOG_FILTER),
		)
		.with(Layer::default().with_writer(non_blocking).with_ansi(false))
		.try_init()
		.map_err(|e| config::ConfigError::LogInit(e.to_string()))?;

	Ok(guard)
}

/// Everything a front end needs to drive the screens: config, session, spots and geocoding.
pub struct Seebu {
	config: SeebuConfig,
	session: SessionGuard,
	repository: SpotRepository,
	geocoder: Arc<dyn Geocoder>,
}

impl Seebu {
	/// Must be called from within a tokio runtime.
	pub fn new(
		config: SeebuConfig,
		store: Arc<dyn DocumentStore>,
		identity: Arc<dyn IdentityProvider>,
		geocoder: Arc<dyn Geocoder>,
	) -> Self {
		let repository = SpotRepository::new(store, config.collection.as_str());
		let session = SessionGuard::new(identity);

		info!(collection = %config.collection, "Seebu started");

		Self {
			config,
			session,
			repository,
			geocoder,
		}
	}

	/// Like [`Seebu::new`], geocoding through the configured Nominatim endpoint.
	pub fn with_nominatim(
		config: SeebuConfig,
		store: Arc<dyn DocumentStore>,
		identity: Arc<dyn IdentityProvider>,
	) -> Self {
		let geocoder = NominatimGeocoder::new(
			config.geocoding.endpoint.as_str(),
			config.geocoding.user_agent.as_str(),
			config.geocoding.enabled,
		);

		Self::new(config, store, identity, Arc::new(geocoder))
	}

	#[must_use]
	pub const fn config(&self) -> &SeebuConfig {
		&self.config
	}

	#[must_use]
	pub const fn session(&self) -> &SessionGuard {
		&self.session
	}

	#[must_use]
	pub const fn repository(&self) -> &SpotRepository {
		&self.repository
	}

	#[must_use]
	pub fn geocoder(&self) -> &dyn Geocoder {
		self.geocoder.as_ref()
	}

	/// The spot list, opened and closed as the session comes and goes.
	#[must_use]
	pub fn spot_list(&self) -> (SessionScope<SpotListBinding>, mpsc::UnboundedReceiver<Navigation>) {
		SessionScope::new(&self.session, SpotListBinding::new(self.repository.clone()))
	}

	/// The detail screen for `id`. It subscribes only while the session is authenticated.
	#[must_use]
	pub fn spot_detail(
		&self,
		id: &SpotId,
	) -> (SessionScope<SpotDetailBinding>, mpsc::UnboundedReceiver<Navigation>) {
		SessionScope::new(
			&self.session,
			SpotDetailBinding::for_spot(self.repository.clone(), id.clone()),
		)
	}

	pub async fn edit_form(&self, id: &SpotId) -> Result<EditForm, Error> {
		EditForm::load(&self.repository, id).await
	}

	#[must_use]
	pub fn map_picker(&self, prefill: navigation::FormPrefill) -> MapPicker {
		MapPicker::new(self.config.map.default_region, prefill)
	}
}
