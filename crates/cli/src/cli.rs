//! Command-line interface definition.

use clap::{Args, Parser, Subcommand};

use rdc_protocol::ConsoleKind;

#[derive(Parser)]
#[command(name = "rdc", version, about = "Remote display console client")]
pub struct Cli {
	/// Increase log verbosity (-v, -vv)
	#[arg(short, long, action = clap::ArgAction::Count, global = true)]
	pub verbose: u8,

	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
	/// Open a console session and hold it until it ends
	Connect(ConnectArgs),
}

#[derive(Args)]
pub struct ConnectArgs {
	/// Gateway endpoint URL (ws:// or wss://)
	#[arg(long)]
	pub endpoint: String,

	/// Console ticket issued by the management backend
	#[arg(long)]
	pub token: String,

	/// Resource id the console attaches to
	#[arg(long)]
	pub resource: u32,

	/// Console kind (vnc, spice, vmrc)
	#[arg(long, default_value = "vnc", value_parser = parse_kind)]
	pub kind: ConsoleKind,

	/// Logical surface width
	#[arg(long, default_value_t = 1024.0)]
	pub width: f64,

	/// Logical surface height
	#[arg(long, default_value_t = 768.0)]
	pub height: f64,

	/// Device pixel ratio of the local display
	#[arg(long, default_value_t = 1.0)]
	pub dpr: f64,

	/// Connect timeout in seconds
	#[arg(long, default_value_t = 30)]
	pub timeout: u64,

	/// Disconnect and exit right after the session connects
	#[arg(long)]
	pub probe: bool,
}

fn parse_kind(s: &str) -> Result<ConsoleKind, String> {
	s.parse().map_err(|e: rdc_protocol::ParseSessionIdError| e.to_string())
}

#[cfg(test)]
mod tests {
	use clap::CommandFactory;

	use super::*;

	#[test]
	fn cli_definition_is_consistent() {
		Cli::command().debug_assert();
	}

	#[test]
	fn connect_args_parse() {
		let cli = Cli::parse_from([
			"rdc", "connect", "--endpoint", "wss://gw/console", "--token", "t", "--resource", "6",
			"--kind", "spice", "--dpr", "2",
		]);
		let Commands::Connect(args) = cli.command;
		assert_eq!(args.resource, 6);
		assert_eq!(args.kind, ConsoleKind::Spice);
		assert_eq!(args.dpr, 2.0);
		assert!(!args.probe);
	}

	#[test]
	fn unknown_kind_is_rejected() {
		let result = Cli::try_parse_from([
			"rdc", "connect", "--endpoint", "e", "--token", "t", "--resource", "1", "--kind", "rdp",
		]);
		assert!(result.is_err());
	}
}
