//! Screen routes and the typed parameters passed between them.
//!
//! Routes travel as URL paths (`/goals/create?latitude=..`), but nothing past this module sees
//! the raw strings: coordinates are parsed into validated [`Coordinates`] here or rejected.

use crate::spot::{Coordinates, CoordinatesError, SpotId};

use thiserror::Error;
use url::{form_urlencoded, Url};

const BASE: &str = "seebu://app/";

const SPOT_NAME_PARAM: &str = "spotName";
const CATEGORY_PARAM: &str = "category";
const DESCRIPTION_PARAM: &str = "description";
const LATITUDE_PARAM: &str = "latitude";
const LONGITUDE_PARAM: &str = "longitude";

#[derive(Debug, Error)]
pub enum NavigationError {
	#[error("invalid route path '{path}': {source}")]
	InvalidPath {
		path: String,
		#[source]
		source: url::ParseError,
	},
	#[error("unknown route '{0}'")]
	UnknownRoute(String),
	#[error("missing '{0}' parameter")]
	MissingParameter(&'static str),
	#[error("invalid '{name}' parameter: '{value}'")]
	InvalidCoordinate { name: &'static str, value: String },
	#[error(transparent)]
	OutOfRange(#[from] CoordinatesError),
}

/// Form text carried through the map picker so the create form can be restored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormPrefill {
	pub name: Option<String>,
	pub category: Option<String>,
	pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreateParams {
	pub prefill: FormPrefill,
	/// Coordinates picked on the map, waiting to be applied to the form.
	pub pending: Option<Coordinates>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Route {
	Login,
	Signup,
	Home,
	SpotList,
	CreateSpot(CreateParams),
	EditSpot(SpotId),
	SpotDetail(SpotId),
	MapPicker(FormPrefill),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Navigation {
	Push(Route),
	Replace(Route),
	Back,
}

impl Route {
	/// Everything except the auth screens needs a signed in session.
	#[must_use]
	pub const fn is_protected(&self) -> bool {
		!matches!(self, Self::Login | Self::Signup)
	}

	#[must_use]
	pub fn to_path(&self) -> String {
		match self {
			Self::Login => "/auth/login".to_owned(),
			Self::Signup => "/auth/signup".to_owned(),
			Self::Home => "/".to_owned(),
			Self::SpotList => "/goals".to_owned(),
			Self::CreateSpot(params) => {
				let mut query = form_urlencoded::Serializer::new(String::new());
				append_prefill(&mut query, &params.prefill);
				if let Some(coordinates) = params.pending {
					query
						.append_pair(LATITUDE_PARAM, &coordinates.latitude.to_string())
						.append_pair(LONGITUDE_PARAM, &coordinates.longitude.to_string());
				}
				with_query("/goals/create", &query.finish())
			}
			Self::EditSpot(id) => format!("/goals/edit/{id}"),
			Self::SpotDetail(id) => format!("/goals/{id}"),
			Self::MapPicker(prefill) => {
				let mut query = form_urlencoded::Serializer::new(String::new());
				append_prefill(&mut query, prefill);
				with_query("/map", &query.finish())
			}
		}
	}

	pub fn parse(path: &str) -> Result<Self, NavigationError> {
		let url = Url::parse(BASE)
			.and_then(|base| base.join(path.trim_start_matches('/')))
			.map_err(|source| NavigationError::InvalidPath {
				path: path.to_owned(),
				source,
			})?;

		let segments = url
			.path_segments()
			.into_iter()
			.flatten()
			.filter(|segment| !segment.is_empty())
			.collect::<Vec<_>>();

		let params = url.query_pairs().into_owned().collect::<Vec<_>>();
		let param = |name: &str| {
			params
				.iter()
				.find(|(key, _)| key == name)
				.map(|(_, value)| value.clone())
		};

		let prefill = || FormPrefill {
			name: param(SPOT_NAME_PARAM),
			category: param(CATEGORY_PARAM),
			description: param(DESCRIPTION_PARAM),
		};

		match segments.as_slice() {
			[] => Ok(Self::Home),
			["auth", "login"] => Ok(Self::Login),
			["auth", "signup"] => Ok(Self::Signup),
			["goals"] => Ok(Self::SpotList),
			["goals", "create"] => Ok(Self::CreateSpot(CreateParams {
				prefill: prefill(),
				pending: parse_pending(param(LATITUDE_PARAM), param(LONGITUDE_PARAM))?,
			})),
			["goals", "edit", id] => Ok(Self::EditSpot(SpotId::from(*id))),
			["goals", id] if *id != "edit" => Ok(Self::SpotDetail(SpotId::from(*id))),
			["map"] => Ok(Self::MapPicker(prefill())),
			_ => Err(NavigationError::UnknownRoute(path.to_owned())),
		}
	}
}

fn append_prefill(query: &mut form_urlencoded::Serializer<'_, String>, prefill: &FormPrefill) {
	for (key, value) in [
		(SPOT_NAME_PARAM, &prefill.name),
		(CATEGORY_PARAM, &prefill.category),
		(DESCRIPTION_PARAM, &prefill.description),
	] {
		if let Some(value) = value {
			query.append_pair(key, value);
		}
	}
}

fn with_query(path: &str, query: &str) -> String {
	if query.is_empty() {
		path.to_owned()
	} else {
		format!("{path}?{query}")
	}
}

fn parse_pending(
	latitude: Option<String>,
	longitude: Option<String>,
) -> Result<Option<Coordinates>, NavigationError> {
	match (latitude, longitude) {
		(None, None) => Ok(None),
		(Some(_), None) => Err(NavigationError::MissingParameter(LONGITUDE_PARAM)),
		(None, Some(_)) => Err(NavigationError::MissingParameter(LATITUDE_PARAM)),
		(Some(latitude), Some(longitude)) => {
			let latitude = parse_degrees(LATITUDE_PARAM, latitude)?;
			let longitude = parse_degrees(LONGITUDE_PARAM, longitude)?;

			Ok(Some(Coordinates::new(latitude, longitude)?))
		}
	}
}

fn parse_degrees(name: &'static str, value: String) -> Result<f64, NavigationError> {
	value
		.trim()
		.parse()
		.map_err(|_| NavigationError::InvalidCoordinate { name, value })
}
