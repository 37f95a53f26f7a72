use clap::Args;
use sb_store::Credentials;

#[derive(Args, Debug)]
pub struct CredentialArgs {
	pub email: String,
	#[arg(long, env = "SEEBU_PASSWORD", hide_env_values = true)]
	pub password: String,
}

impl From<CredentialArgs> for Credentials {
	fn from(args: CredentialArgs) -> Self {
		Self::new(args.email, args.password)
	}
}
