//! Provider listener infrastructure.
//!
//! [`ListenerRegistry`] stores listeners per [`ProviderEvent`] in an
//! [`IndexMap`] for O(1) removal and stable dispatch order. [`Subscription`]
//! is the disposer handed back to whoever attached a listener.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexMap;
use parking_lot::Mutex;
use serde_json::Value;
use walletlink_protocol::ProviderEvent;

/// Unique identifier for a registered listener.
pub type HandlerId = u64;

static NEXT_HANDLER_ID: AtomicU64 = AtomicU64::new(1);

/// Returns a new globally-unique handler ID.
pub fn next_handler_id() -> HandlerId {
	NEXT_HANDLER_ID.fetch_add(1, Ordering::SeqCst)
}

/// Listener callback: receives the raw notification payload.
pub type Listener = Arc<dyn Fn(Value) + Send + Sync>;

/// Per-channel listener storage for provider implementations.
///
/// [`emit`](Self::emit) snapshots the listeners before invoking them, so a
/// listener may remove itself (or others) from inside its callback.
#[derive(Default)]
pub struct ListenerRegistry {
	listeners: Mutex<IndexMap<(ProviderEvent, HandlerId), Listener>>,
}

impl ListenerRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers `listener` on `event` and returns its id.
	pub fn add(&self, event: ProviderEvent, listener: Listener) -> HandlerId {
		let id = next_handler_id();
		self.listeners.lock().insert((event, id), listener);
		id
	}

	/// Removes a listener. Returns `false` if it was not registered.
	pub fn remove(&self, event: ProviderEvent, id: HandlerId) -> bool {
		self.listeners.lock().shift_remove(&(event, id)).is_some()
	}

	/// Invokes every listener on `event` with `payload`, in registration order.
	pub fn emit(&self, event: ProviderEvent, payload: Value) -> usize {
		let targets: Vec<Listener> = self
			.listeners
			.lock()
			.iter()
			.filter(|((e, _), _)| *e == event)
			.map(|(_, listener)| Arc::clone(listener))
			.collect();

		for listener in &targets {
			listener(payload.clone());
		}
		targets.len()
	}

	/// Number of listeners currently registered on `event`.
	pub fn count(&self, event: ProviderEvent) -> usize {
		self.listeners.lock().keys().filter(|(e, _)| *e == event).count()
	}
}

/// RAII handle that unregisters a provider listener on drop.
///
/// The dropper usually holds a weak reference to the provider, so dropping
/// after the provider itself is gone is a no-op.
pub struct Subscription {
	id: HandlerId,
	event: ProviderEvent,
	dropper: Option<Arc<dyn Fn(ProviderEvent, HandlerId) + Send + Sync>>,
}

impl Subscription {
	/// Creates a subscription with a custom dropper function.
	pub fn new(event: ProviderEvent, id: HandlerId, dropper: Arc<dyn Fn(ProviderEvent, HandlerId) + Send + Sync>) -> Self {
		Self {
			id,
			event,
			dropper: Some(dropper),
		}
	}

	/// Returns this subscription's handler ID.
	pub fn id(&self) -> HandlerId {
		self.id
	}

	/// Returns the channel this subscription listens on.
	pub fn event(&self) -> ProviderEvent {
		self.event
	}

	/// Explicitly unsubscribes. Equivalent to dropping.
	pub fn unsubscribe(mut self) {
		self.release();
	}

	fn release(&mut self) {
		if let Some(dropper) = self.dropper.take() {
			(dropper)(self.event, self.id);
		}
	}
}

impl Drop for Subscription {
	fn drop(&mut self) {
		self.release();
	}
}

impl std::fmt::Debug for Subscription {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Subscription")
			.field("id", &self.id)
			.field("event", &self.event)
			.field("active", &self.dropper.is_some())
			.finish()
	}
}
