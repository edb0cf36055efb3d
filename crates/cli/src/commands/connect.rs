//! `rdc connect` - open a console session and hold it.

use std::time::Duration;

use anyhow::{Context, Result, bail};
use tokio::sync::broadcast;

use rdc::Session;
use rdc_protocol::{ConnectOptions, Viewport};

use crate::cli::ConnectArgs;

pub async fn run(args: ConnectArgs) -> Result<()> {
	let timeout = Duration::from_secs(args.timeout);
	let options = ConnectOptions::new(args.resource, args.kind, args.token, args.endpoint)
		.viewport(Viewport::new(args.width, args.height))
		.device_pixel_ratio(args.dpr)
		.connect_timeout(timeout.as_millis() as u64);

	let id = options.session_id();
	println!("opening console {id}");

	let session = Session::open(options)
		.await
		.with_context(|| format!("opening console {id}"))?;
	session
		.wait_until_connected(timeout)
		.await
		.with_context(|| format!("waiting for console {id} to connect"))?;

	let geometry = session.surface().geometry();
	println!(
		"connected: {}x{} physical pixels (device pixel ratio {})",
		geometry.width,
		geometry.height,
		session.surface().device_pixel_ratio()
	);

	if args.probe {
		session.disconnect();
		println!("probe ok");
		return Ok(());
	}

	hold(&session).await
}

/// Reports state transitions and remote clipboard pushes until the session
/// ends or the user interrupts.
async fn hold(session: &Session) -> Result<()> {
	let mut state = session.state();
	let mut clipboard = session.clipboard_events();

	loop {
		tokio::select! {
			_ = tokio::signal::ctrl_c() => {
				println!("interrupted, disconnecting");
				session.disconnect();
				return Ok(());
			}
			changed = state.changed() => {
				if changed.is_err() {
					return Ok(());
				}
				let current = *state.borrow_and_update();
				println!("state: {current}");
				if current.is_terminal() {
					if let Some(error) = session.last_error() {
						bail!("session ended with error: {error}");
					}
					return Ok(());
				}
			}
			data = clipboard.recv() => {
				match data {
					Ok(data) => println!("remote clipboard: {data}"),
					Err(broadcast::error::RecvError::Lagged(n)) => {
						tracing::warn!(dropped = n, "Clipboard receiver lagged");
					}
					Err(broadcast::error::RecvError::Closed) => return Ok(()),
				}
			}
		}
	}
}
