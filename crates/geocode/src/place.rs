use serde::{Deserialize, Serialize};

/// Address fields resolved for a coordinate. Any of them may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Place {
	pub name: Option<String>,
	pub street: Option<String>,
	pub city: Option<String>,
	pub subregion: Option<String>,
	pub region: Option<String>,
	pub country: Option<String>,
	/// Provider formatted one-line address, used when no structured field is known.
	pub display_name: Option<String>,
}

impl Place {
	/// `"<name> <street>, <city or subregion>, <region>, <country>"`, skipping empty parts.
	#[must_use]
	pub fn describe(&self) -> Option<String> {
		let head = [&self.name, &self.street]
			.into_iter()
			.filter_map(|part| non_empty(part.as_deref()))
			.collect::<Vec<_>>()
			.join(" ");

		let parts = std::iter::once(non_empty(Some(head.as_str())))
			.chain([
				non_empty(self.city.as_deref()).or_else(|| non_empty(self.subregion.as_deref())),
				non_empty(self.region.as_deref()),
				non_empty(self.country.as_deref()),
			])
			.flatten()
			.collect::<Vec<_>>();

		if parts.is_empty() {
			non_empty(self.display_name.as_deref()).map(ToOwned::to_owned)
		} else {
			Some(parts.join(", "))
		}
	}

	/// The provider's formatted address, or [`Place::describe`] when there is none.
	#[must_use]
	pub fn label(&self) -> Option<String> {
		non_empty(self.display_name.as_deref())
			.map(ToOwned::to_owned)
			.or_else(|| self.describe())
	}
}

fn non_empty(s: Option<&str>) -> Option<&str> {
	s.map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn formats_structured_fields() {
		let place = Place {
			name: Some("Magellan's Cross".into()),
			street: Some("Magallanes St".into()),
			city: None,
			subregion: Some("Cebu City".into()),
			region: Some("Central Visayas".into()),
			country: Some("Philippines".into()),
			display_name: Some("ignored".into()),
		};

		assert_eq!(
			place.describe().as_deref(),
			Some("Magellan's Cross Magallanes St, Cebu City, Central Visayas, Philippines")
		);
	}

	#[test]
	fn falls_back_to_display_name() {
		let place = Place {
			street: Some("  ".into()),
			display_name: Some("Lapu-Lapu, Cebu, Philippines".into()),
			..Default::default()
		};

		assert_eq!(
			place.describe().as_deref(),
			Some("Lapu-Lapu, Cebu, Philippines")
		);
		assert_eq!(Place::default().describe(), None);
	}
}
