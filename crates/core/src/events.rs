//! Session event bus.
//!
//! Provides the types for observing a [`WalletSession`]:
//!
//! - [`SessionEvent`] - what changed
//! - [`EventBus`] - internal dispatcher combining a broadcast channel with predicate-based waiters
//! - [`EventStream`] - wrapper around [`broadcast::Receiver`] with lag handling
//! - [`EventWaiter`] - one-shot event capture with timeout support
//!
//! [`WalletSession`]: crate::WalletSession
//! [`broadcast::Receiver`]: tokio::sync::broadcast::Receiver

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::{broadcast, oneshot};
use walletlink_protocol::ProviderInfo;

use crate::error::{ConnectionError, Error, Result};

/// Why a session went back to `Disconnected` outside a failed connect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DisconnectReason {
	/// `disconnect()` was called.
	UserRequested,
	/// The provider reported an empty or malformed account list.
	AccountsCleared,
}

/// A change to the session, in commit order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum SessionEvent {
	/// A connect attempt started.
	Connecting { provider: ProviderInfo, generation: u64 },
	/// A connect attempt committed.
	Connected {
		provider: ProviderInfo,
		address: String,
		chain_id: Option<u64>,
	},
	/// A connect attempt failed while still current.
	ConnectFailed { provider: ProviderInfo, error: ConnectionError },
	/// The provider switched the primary account.
	AccountChanged { address: String },
	/// The provider switched networks. `None` when the id was unparseable.
	ChainChanged { chain_id: Option<u64> },
	/// The session was torn down.
	Disconnected { reason: DisconnectReason },
}

struct WaiterEntry<E> {
	predicate: Box<dyn Fn(&E) -> bool + Send + Sync>,
	complete_tx: oneshot::Sender<E>,
}

/// Internal event bus combining broadcast channels with predicate-based waiters.
///
/// Waiters are checked first during [`emit`](Self::emit), so `wait_for` style
/// calls get the event even when broadcast receivers are lagging.
pub(crate) struct EventBus<E: Clone + Send + 'static> {
	tx: broadcast::Sender<E>,
	waiters: Mutex<Vec<WaiterEntry<E>>>,
}

impl<E: Clone + Send + 'static> EventBus<E> {
	/// Creates a new [`EventBus`] with the specified broadcast channel capacity.
	pub fn new(capacity: usize) -> Self {
		let (tx, _) = broadcast::channel(capacity.max(1));
		Self {
			tx,
			waiters: Mutex::new(Vec::new()),
		}
	}

	/// Emits an event to matching waiters, then to all subscribers.
	pub fn emit(&self, event: E) {
		{
			let mut waiters = self.waiters.lock();
			let mut i = 0;
			while i < waiters.len() {
				if (waiters[i].predicate)(&event) {
					let entry = waiters.swap_remove(i);
					let _ = entry.complete_tx.send(event.clone());
				} else {
					i += 1;
				}
			}
		}
		let _ = self.tx.send(event);
	}

	/// Subscribes to the event stream. Earlier events are not replayed.
	pub fn subscribe(&self) -> broadcast::Receiver<E> {
		self.tx.subscribe()
	}

	/// Registers a waiter that will receive the first matching event.
	pub fn register_waiter<F>(&self, predicate: F) -> oneshot::Receiver<E>
	where
		F: Fn(&E) -> bool + Send + Sync + 'static,
	{
		let (complete_tx, complete_rx) = oneshot::channel();
		self.waiters.lock().push(WaiterEntry {
			predicate: Box::new(predicate),
			complete_tx,
		});
		complete_rx
	}

	/// Returns the number of registered waiters.
	#[allow(dead_code)]
	pub fn waiter_count(&self) -> usize {
		self.waiters.lock().len()
	}
}

/// Wrapper around [`broadcast::Receiver`] that survives lag.
///
/// [`RecvError::Lagged`] is logged and skipped instead of ending the stream.
///
/// ```ignore
/// let mut events = session.events();
/// while let Some(event) = events.recv().await {
///     println!("{event:?}");
/// }
/// ```
///
/// [`broadcast::Receiver`]: tokio::sync::broadcast::Receiver
/// [`RecvError::Lagged`]: tokio::sync::broadcast::error::RecvError::Lagged
pub struct EventStream<E: Clone + Send + 'static> {
	rx: broadcast::Receiver<E>,
}

impl<E: Clone + Send + 'static> EventStream<E> {
	pub(crate) fn new(rx: broadcast::Receiver<E>) -> Self {
		Self { rx }
	}

	/// Receives the next event; `None` once the session is dropped.
	pub async fn recv(&mut self) -> Option<E> {
		loop {
			match self.rx.recv().await {
				Ok(event) => return Some(event),
				Err(broadcast::error::RecvError::Lagged(n)) => {
					tracing::warn!(dropped = n, "Session event stream lagged, dropped events");
				}
				Err(broadcast::error::RecvError::Closed) => return None,
			}
		}
	}

	/// Receives an event if one is immediately available.
	pub fn try_recv(&mut self) -> Option<E> {
		loop {
			match self.rx.try_recv() {
				Ok(event) => return Some(event),
				Err(broadcast::error::TryRecvError::Lagged(n)) => {
					tracing::warn!(dropped = n, "Session event stream lagged, dropped events");
				}
				Err(broadcast::error::TryRecvError::Empty | broadcast::error::TryRecvError::Closed) => return None,
			}
		}
	}
}

/// One-shot event waiter with timeout support.
///
/// Call [`wait()`](Self::wait) for a bounded wait, or `.await` it directly.
pub struct EventWaiter<E> {
	rx: oneshot::Receiver<E>,
	timeout: Duration,
}

impl<E: Send + 'static> EventWaiter<E> {
	pub(crate) fn new(rx: oneshot::Receiver<E>, timeout: Duration) -> Self {
		Self { rx, timeout }
	}

	/// Waits for the event with the configured timeout.
	///
	/// # Errors
	///
	/// - [`Error::Timeout`] if no matching event arrives in time
	/// - [`Error::ChannelClosed`] if the session is dropped
	pub async fn wait(self) -> Result<E> {
		tokio::time::timeout(self.timeout, self.rx)
			.await
			.map_err(|_| Error::Timeout("Timeout waiting for session event".to_string()))?
			.map_err(|_| Error::ChannelClosed)
	}
}

impl<E: Send + 'static> Future for EventWaiter<E> {
	type Output = Result<E>;

	fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
		match Pin::new(&mut self.rx).poll(cx) {
			Poll::Ready(Ok(event)) => Poll::Ready(Ok(event)),
			Poll::Ready(Err(_)) => Poll::Ready(Err(Error::ChannelClosed)),
			Poll::Pending => Poll::Pending,
		}
	}
}
