use crate::{config::ConfigError, navigation::NavigationError, spot::SpotId};

use std::fmt::Display;

use sb_store::StoreError;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum Error {
	#[error(transparent)]
	Validation(#[from] ValidationError),
	#[error("remote store error: {0}")]
	RemoteStore(#[from] StoreError),
	#[error("spot not found <id='{0}'>")]
	NotFound(SpotId),
	#[error(transparent)]
	Navigation(#[from] NavigationError),
	#[error(transparent)]
	Config(#[from] ConfigError),
}

/// A required form field is missing. Reported inline, never sent to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
	#[error("Please enter a spot name")]
	MissingName,
	#[error("Please pick a location on the map")]
	MissingCoordinates,
	#[error("Please enter a location")]
	MissingLocation,
}

/// Report an error with tracing
pub fn report_error(res: &Result<(), impl Display>) {
	if let Err(e) = res {
		error!("{e:#}");
	}
}
