use anyhow::Result;
use sb_core::{Access, Route};
use serde::Serialize;

use crate::{context::Context, print_output};

#[derive(Debug, Serialize)]
struct RouteOutput {
	path: String,
	route: String,
	protected: bool,
	/// Where the screen would actually land for the current session.
	lands_on: String,
}

pub async fn run(ctx: &Context, path: &str) -> Result<()> {
	let route = Route::parse(path)?;

	let lands_on = if route.is_protected() {
		ctx.app.session().wait_until_known().await;
		match ctx.app.session().access() {
			Access::Redirect(redirect) => redirect,
			Access::Granted(_) | Access::Loading => route.clone(),
		}
	} else {
		route.clone()
	};

	let out = RouteOutput {
		path: route.to_path(),
		route: format!("{route:?}"),
		protected: route.is_protected(),
		lands_on: lands_on.to_path(),
	};

	print_output!(ctx, &out, |o: &RouteOutput| {
		println!("{} → {}", o.path, o.route);
		if o.lands_on != o.path {
			println!("Redirected to {}", o.lands_on);
		}
	});

	Ok(())
}
