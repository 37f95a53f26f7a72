use std::{path::PathBuf, sync::Arc};

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use sb_core::{config::default_data_dir, init_logging, Seebu, SeebuConfig};
use sb_store::MemoryBackend;
use tracing::{debug, error};

mod context;
mod domains;
mod util;

use context::{Context, OutputFormat};
use domains::{
	auth::{self, CredentialArgs},
	route,
	spot::{self, SpotCreateArgs, SpotEditArgs},
};

#[derive(Parser, Debug)]
#[command(name = "seebu", about = "Seebu: your Cebu tourist spots")]
struct Cli {
	/// Path to the seebu data directory
	#[arg(long, env = "SEEBU_DATA_DIR")]
	data_dir: Option<PathBuf>,

	/// Output format
	#[arg(long, value_enum, default_value = "human")]
	format: OutputFormat,

	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
	/// Create an account and sign in
	Signup(CredentialArgs),
	/// Sign in to an existing account
	Login(CredentialArgs),
	/// Sign out
	Logout,
	/// Show the signed in account
	Whoami,
	/// List your spots
	List,
	/// Show one spot
	Show {
		id: String,
		/// Skip the reverse geocoding lookup
		#[arg(long, default_value_t = false)]
		no_address: bool,
	},
	/// Create a spot
	Create(SpotCreateArgs),
	/// Edit a spot's text fields
	Edit(SpotEditArgs),
	/// Delete a spot
	Delete { id: String },
	/// Resolve a screen path, e.g. `/goals/create?latitude=10.3&longitude=123.9`
	Route { path: String },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
	let cli = Cli::parse();

	let data_dir = match cli.data_dir {
		Some(data_dir) => data_dir,
		None => default_data_dir()?,
	};

	let config = SeebuConfig::load_from(&data_dir)
		.await
		.with_context(|| format!("Failed to load config from {}", data_dir.display()))?;

	let _log_guard = init_logging(&config.log_level, config.logs_dir())?;

	let backend_path = config.backend_path();
	let backend = MemoryBackend::load(&backend_path).await?;
	debug!(path = %backend_path.display(), "Backend loaded");

	let app = Seebu::with_nominatim(config, Arc::new(backend.clone()), Arc::new(backend.clone()));
	let ctx = Context::new(app, cli.format);

	let res = match cli.command {
		Commands::Signup(args) => auth::signup(&ctx, args).await,
		Commands::Login(args) => auth::login(&ctx, args).await,
		Commands::Logout => auth::logout(&ctx).await,
		Commands::Whoami => auth::whoami(&ctx).await,
		Commands::List => spot::list(&ctx).await,
		Commands::Show { id, no_address } => spot::show(&ctx, id.into(), !no_address).await,
		Commands::Create(args) => spot::create(&ctx, args).await,
		Commands::Edit(args) => spot::edit(&ctx, args).await,
		Commands::Delete { id } => spot::delete(&ctx, id.into()).await,
		Commands::Route { path } => route::run(&ctx, &path).await,
	};

	// Persist whatever happened before a failure too, e.g. an account created before a bad edit
	if let Err(e) = backend.save(&backend_path).await {
		error!(?e, "Failed to save backend");
		return Err(e.into());
	}

	res
}
