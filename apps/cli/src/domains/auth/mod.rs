mod args;

pub use args::CredentialArgs;

use anyhow::Result;
use sb_core::{Navigation, OwnerId, Route, SessionState};
use serde::Serialize;

use crate::{context::Context, print_output};

#[derive(Debug, Serialize)]
struct WhoamiOutput {
	signed_in: bool,
	user_id: Option<String>,
}

pub async fn signup(ctx: &Context, args: CredentialArgs) -> Result<()> {
	let owner = ctx.app.session().sign_up(&args.into()).await?;
	wait_for_sign_in(ctx, &owner).await;

	println!("Account created, signed in as {owner}");
	ctx.navigate(&Navigation::Replace(Route::Home));

	Ok(())
}

pub async fn login(ctx: &Context, args: CredentialArgs) -> Result<()> {
	let owner = ctx.app.session().sign_in(&args.into()).await?;
	wait_for_sign_in(ctx, &owner).await;

	println!("Signed in as {owner}");
	ctx.navigate(&Navigation::Replace(Route::Home));

	Ok(())
}

pub async fn logout(ctx: &Context) -> Result<()> {
	ctx.app.session().sign_out().await?;
	ctx.app
		.session()
		.wait_for(|state| *state == SessionState::Unauthenticated)
		.await;

	println!("Signed out");
	ctx.navigate(&Navigation::Replace(Route::Login));

	Ok(())
}

pub async fn whoami(ctx: &Context) -> Result<()> {
	let state = ctx.app.session().wait_until_known().await;
	let out = WhoamiOutput {
		signed_in: state.owner().is_some(),
		user_id: state.owner().map(ToString::to_string),
	};

	print_output!(ctx, &out, |o: &WhoamiOutput| {
		match &o.user_id {
			Some(user_id) => println!("Signed in as {user_id}"),
			None => println!("Not signed in"),
		}
	});

	Ok(())
}

async fn wait_for_sign_in(ctx: &Context, owner: &OwnerId) {
	ctx.app
		.session()
		.wait_for(|state| state.owner() == Some(owner))
		.await;
}
