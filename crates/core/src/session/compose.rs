//! The composition pass: an ordered fold of plugins over the capability
//! aggregate.

use std::sync::Arc;

use indexmap::IndexMap;

use rdc_runtime::Result;

use crate::capability::{Capabilities, Capability, CapabilityPlugin, SessionContext};

/// Result of one composition pass.
pub(crate) struct Composition {
	/// The typed aggregate callers query capabilities from.
	pub capabilities: Capabilities,
	/// Installed capabilities in activation order.
	pub attached: Vec<Arc<dyn Capability>>,
}

impl std::fmt::Debug for Composition {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Composition")
			.field(
				"attached",
				&self.attached.iter().map(|c| c.name()).collect::<Vec<_>>(),
			)
			.finish()
	}
}

/// Folds `plugins` in order over a growing [`Capabilities`] aggregate.
///
/// Each plugin installs against the aggregate *as accumulated so far*, so
/// later plugins may read capabilities exposed by earlier ones. A later
/// plugin filling an already-filled slot overrides it; no deduplication is
/// performed beyond the one-capability-per-slot shape of the aggregate.
pub(crate) fn compose(
	ctx: &Arc<SessionContext>,
	plugins: &[Arc<dyn CapabilityPlugin>],
) -> Result<Composition> {
	let mut capabilities = Capabilities::default();
	let mut attached: IndexMap<&'static str, Arc<dyn Capability>> = IndexMap::new();

	for plugin in plugins {
		let fragment = plugin.install(ctx, &capabilities)?;
		for capability in fragment.merge_into(&mut capabilities) {
			tracing::debug!(
				session = %ctx.id(),
				plugin = plugin.name(),
				capability = capability.name(),
				"Capability installed"
			);
			attached.insert(capability.name(), capability);
		}
	}

	Ok(Composition {
		capabilities,
		attached: attached.into_values().collect(),
	})
}

#[cfg(test)]
mod tests {
	use rdc_protocol::Viewport;
	use rdc_runtime::Error;

	use super::*;
	use crate::capability::testing::recording_context;
	use crate::capability::{ClipboardPlugin, DisplayPlugin, KeyboardPlugin, MousePlugin};
	use crate::surface::DisplaySurface;

	fn surface() -> Arc<DisplaySurface> {
		Arc::new(DisplaySurface::new(Viewport::new(800.0, 600.0), 1.0))
	}

	#[test]
	fn slots_are_the_union_of_plugin_contributions() {
		let (ctx, _client) = recording_context();
		let plugins: Vec<Arc<dyn CapabilityPlugin>> = vec![
			Arc::new(DisplayPlugin::new(surface())),
			Arc::new(KeyboardPlugin::new()),
			Arc::new(MousePlugin::new()),
			Arc::new(ClipboardPlugin::new()),
		];

		let composition = compose(&ctx, &plugins).unwrap();
		assert_eq!(
			composition.capabilities.slots(),
			vec!["display", "keyboard", "mouse", "clipboard"]
		);
		assert_eq!(composition.attached.len(), 4);
	}

	#[test]
	fn later_plugin_overrides_earlier_slot() {
		let (ctx, _client) = recording_context();
		let first = surface();
		let second = surface();
		let plugins: Vec<Arc<dyn CapabilityPlugin>> = vec![
			Arc::new(DisplayPlugin::new(Arc::clone(&first))),
			Arc::new(DisplayPlugin::new(Arc::clone(&second))),
		];

		let composition = compose(&ctx, &plugins).unwrap();
		assert_eq!(composition.capabilities.slots(), vec!["display"]);
		assert_eq!(composition.attached.len(), 1);

		let installed = composition.capabilities.display().unwrap();
		assert!(Arc::ptr_eq(installed.surface(), &second));
	}

	#[test]
	fn dependent_plugin_sees_earlier_capabilities() {
		let (ctx, _client) = recording_context();
		let surface = surface();
		let plugins: Vec<Arc<dyn CapabilityPlugin>> = vec![
			Arc::new(DisplayPlugin::new(Arc::clone(&surface))),
			Arc::new(MousePlugin::new()),
		];

		let composition = compose(&ctx, &plugins).unwrap();
		assert!(composition.capabilities.mouse().is_some());
	}

	#[test]
	fn dependent_plugin_without_prerequisite_fails_loudly() {
		let (ctx, _client) = recording_context();
		let plugins: Vec<Arc<dyn CapabilityPlugin>> = vec![Arc::new(KeyboardPlugin::new())];

		let err = compose(&ctx, &plugins).unwrap_err();
		assert!(matches!(
			err,
			Error::MissingCapability {
				plugin: "keyboard",
				requires: "display"
			}
		));
	}
}
