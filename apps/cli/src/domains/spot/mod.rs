mod args;

pub use args::{SpotCreateArgs, SpotEditArgs};

use anyhow::{anyhow, bail, Result};
use comfy_table::{presets::UTF8_BORDERS_ONLY, Table};
use sb_core::{binding::or_not_available, CreateForm, Navigation, Route, SpotId, ViewState};

use crate::{context::Context, print_output, util::output::SpotOutput};

pub async fn list(ctx: &Context) -> Result<()> {
	ctx.app.session().wait_until_known().await;

	let (mut scope, mut navigation) = ctx.app.spot_list();
	scope.sync().await;

	if let Ok(redirect) = navigation.try_recv() {
		ctx.navigate(&redirect);
		bail!("Not signed in, run `seebu login` first");
	}

	let state = scope
		.binding()
		.view()
		.wait_for(|state| !state.is_loading())
		.await
		.ok_or_else(|| anyhow!("Spot list closed"))?;

	let spots = match state {
		ViewState::Ready(spots) => spots,
		ViewState::Failed(message) => bail!(message),
		ViewState::Loading | ViewState::NotFound => Vec::new(),
	};

	let out = spots.iter().map(SpotOutput::from).collect::<Vec<_>>();

	print_output!(ctx, &out, |spots: &Vec<SpotOutput>| {
		if spots.is_empty() {
			println!("No spots found");
			return;
		}

		let mut table = Table::new();
		table.load_preset(UTF8_BORDERS_ONLY);
		table.set_header(vec!["ID", "Name", "Category", "Location"]);
		for spot in spots {
			table.add_row(vec![
				spot.id.as_str(),
				spot.name.as_str(),
				spot.category.as_str(),
				spot.location.as_str(),
			]);
		}
		println!("{table}");
	});

	Ok(())
}

pub async fn show(ctx: &Context, id: SpotId, resolve_address: bool) -> Result<()> {
	ctx.require_owner().await?;

	let (mut scope, mut navigation) = ctx.app.spot_detail(&id);
	scope.sync().await;

	if let Ok(redirect) = navigation.try_recv() {
		ctx.navigate(&redirect);
		bail!("Not signed in, run `seebu login` first");
	}

	let detail = scope.binding_mut();
	let state = detail
		.view()
		.wait_for(|state| !state.is_loading())
		.await
		.ok_or_else(|| anyhow!("Spot detail closed"))?;

	let spot = match state {
		ViewState::Ready(spot) => spot,
		ViewState::NotFound | ViewState::Loading => bail!("Spot not found"),
		ViewState::Failed(message) => bail!(message),
	};

	let mut out = SpotOutput::from(&spot);
	if resolve_address {
		out.address = detail
			.resolve_address(ctx.app.geocoder())
			.await
			.map(ToOwned::to_owned);
	}
	let region = detail.map_region();
	detail.close();

	print_output!(ctx, &out, |o: &SpotOutput| {
		println!("{}", o.name);
		println!("  Category:    {}", o.category);
		println!("  Description: {}", o.description);
		println!("  Location:    {}", or_not_available(&o.location));
		if let Some(address) = &o.address {
			println!("  Address:     {address}");
		}
		if let Some(region) = region {
			println!(
				"  Map:         {}, {} (±{})",
				region.latitude, region.longitude, region.latitude_delta
			);
		}
	});
	ctx.navigate(&Navigation::Push(Route::EditSpot(spot.id)));

	Ok(())
}

pub async fn create(ctx: &Context, args: SpotCreateArgs) -> Result<()> {
	let owner = ctx.require_owner().await?;

	let mut form = CreateForm::new();
	if let Some(location) = &args.location {
		form.location.clone_from(location);
	}
	form.apply(args.params()?, ctx.app.geocoder()).await;

	let navigation = form.submit(ctx.app.repository(), &owner).await?;

	println!("Spot created");
	ctx.navigate(&navigation);

	Ok(())
}

pub async fn edit(ctx: &Context, args: SpotEditArgs) -> Result<()> {
	ctx.require_owner().await?;

	let mut form = ctx.app.edit_form(&args.id.into()).await?;
	for (field, value) in [
		(&mut form.name, args.name),
		(&mut form.category, args.category),
		(&mut form.location, args.location),
		(&mut form.description, args.description),
	] {
		if let Some(value) = value {
			*field = value;
		}
	}

	let navigation = form.submit(ctx.app.repository()).await?;

	println!("Spot {} updated", form.id());
	ctx.navigate(&navigation);

	Ok(())
}

pub async fn delete(ctx: &Context, id: SpotId) -> Result<()> {
	ctx.app.session().wait_until_known().await;

	let (mut scope, mut navigation) = ctx.app.spot_list();
	scope.sync().await;

	if let Ok(redirect) = navigation.try_recv() {
		ctx.navigate(&redirect);
		bail!("Not signed in, run `seebu login` first");
	}

	scope.binding().delete(&id).await?;
	println!("Spot {id} deleted");

	Ok(())
}
