//! Command dispatch.

pub mod connect;

use anyhow::Result;

use crate::cli::{Cli, Commands};

pub async fn dispatch(cli: Cli) -> Result<()> {
	match cli.command {
		Commands::Connect(args) => connect::run(args).await,
	}
}
