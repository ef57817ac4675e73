//! The provider capability.
//!
//! A [`Provider`] is what a wallet hands to the page: one generic `request`
//! operation plus listener registration on the `accountsChanged` and
//! `chainChanged` channels (EIP-1193). The host environment owns providers;
//! callers only hold [`ProviderHandle`]s and the [`Subscription`]s they attach.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Weak};

use serde_json::Value;
use walletlink_protocol::{ProviderEvent, ProviderFlags, RequestArguments};

use crate::error::Result;
use crate::handlers::{HandlerId, Listener, Subscription};

/// Boxed future returned by provider round trips.
pub type ProviderFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Shared handle to a provider.
pub type ProviderHandle = Arc<dyn Provider>;

/// EIP-1193 style wallet provider.
///
/// Implementations must not invoke listeners synchronously from inside
/// [`on`](Self::on), and must accept [`remove_listener`](Self::remove_listener)
/// being called from inside a listener callback. [`ListenerRegistry`] satisfies
/// both.
///
/// [`ListenerRegistry`]: crate::ListenerRegistry
pub trait Provider: Send + Sync {
	/// Issues a request and resolves with the provider's `result` value.
	fn request(&self, args: RequestArguments) -> ProviderFuture<'_, Value>;

	/// Registers a listener on a notification channel.
	fn on(&self, event: ProviderEvent, listener: Listener) -> HandlerId;

	/// Unregisters a listener. Unknown ids are ignored.
	fn remove_listener(&self, event: ProviderEvent, id: HandlerId);

	/// Self-reported flags, used to label providers found without discovery info.
	fn flags(&self) -> ProviderFlags {
		ProviderFlags::default()
	}

	/// Convenience for a parameterless request.
	fn call(&self, method: &str) -> ProviderFuture<'_, Value> {
		self.request(RequestArguments::new(method))
	}
}

/// Attaches `listener` to `event` and returns the disposer.
///
/// The [`Subscription`] holds only a weak reference to the provider, so it
/// never keeps a discarded provider alive.
pub fn subscribe(provider: &ProviderHandle, event: ProviderEvent, listener: Listener) -> Subscription {
	let id = provider.on(event, listener);
	let weak: Weak<dyn Provider> = Arc::downgrade(provider);
	Subscription::new(
		event,
		id,
		Arc::new(move |event, id| {
			if let Some(provider) = weak.upgrade() {
				provider.remove_listener(event, id);
			}
		}),
	)
}
