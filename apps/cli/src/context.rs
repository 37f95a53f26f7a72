use anyhow::{bail, Result};
use sb_core::{Access, Navigation, OwnerId, Seebu};

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum OutputFormat {
	Human,
	Json,
}

pub struct Context {
	pub app: Seebu,
	pub format: OutputFormat,
}

impl Context {
	pub const fn new(app: Seebu, format: OutputFormat) -> Self {
		Self { app, format }
	}

	/// Owner of the current session, the way a protected screen gates on it.
	pub async fn require_owner(&self) -> Result<OwnerId> {
		self.app.session().wait_until_known().await;

		match self.app.session().access() {
			Access::Granted(owner) => Ok(owner),
			Access::Redirect(route) => bail!(
				"Not signed in (redirect to {}), run `seebu login` first",
				route.to_path()
			),
			Access::Loading => bail!("Session state is still unknown"),
		}
	}

	/// Shows where the screen flow would go next.
	pub fn navigate(&self, navigation: &Navigation) {
		if matches!(self.format, OutputFormat::Json) {
			return;
		}

		match navigation {
			Navigation::Push(route) | Navigation::Replace(route) => println!("→ {}", route.to_path()),
			Navigation::Back => println!("← back"),
		}
	}
}
