//! Scripted in-memory provider for tests.
//!
//! [`ScriptedProvider`] answers requests from per-method reply queues. A reply
//! is either ready immediately or deferred: the request stays pending until the
//! test resolves the matching [`DeferredReply`], which is how overlapping
//! connect attempts are driven deterministically.
//!
//! It also counts listener attach/detach calls so tests can check pairing.
//!
//! # Example
//!
//! ```ignore
//! let wallet = ScriptedProvider::new();
//! wallet.reply(methods::ETH_REQUEST_ACCOUNTS, Ok(json!(["0xAAA"])));
//! let pending = wallet.defer(methods::ETH_CHAIN_ID);
//! // ... start connect ...
//! pending.resolve(Ok(json!("0x38")));
//! ```

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::oneshot;
use walletlink_protocol::{ProviderEvent, ProviderFlags, RequestArguments, RpcError};

use crate::error::{Error, Result};
use crate::handlers::{HandlerId, Listener, ListenerRegistry};
use crate::provider::{Provider, ProviderFuture, ProviderHandle};

enum Reply {
	Ready(Result<Value>),
	Deferred(oneshot::Receiver<Result<Value>>),
}

/// Resolves one deferred request. Dropping it without resolving fails the
/// request with [`Error::Closed`].
#[derive(Debug)]
pub struct DeferredReply {
	tx: oneshot::Sender<Result<Value>>,
}

impl DeferredReply {
	pub fn resolve(self, result: Result<Value>) {
		let _ = self.tx.send(result);
	}
}

/// In-memory provider driven by the test.
#[derive(Default)]
pub struct ScriptedProvider {
	flags: ProviderFlags,
	replies: Mutex<HashMap<String, VecDeque<Reply>>>,
	calls: Mutex<Vec<String>>,
	listeners: ListenerRegistry,
	attached: AtomicUsize,
	detached: AtomicUsize,
	stray_detaches: AtomicUsize,
}

impl ScriptedProvider {
	pub fn new() -> Arc<Self> {
		Arc::new(Self::default())
	}

	pub fn with_flags(flags: ProviderFlags) -> Arc<Self> {
		Arc::new(Self {
			flags,
			..Default::default()
		})
	}

	/// Convenience: a provider that accepts `eth_requestAccounts` with
	/// `account` and reports `chain_id`.
	pub fn connected(account: &str, chain_id: &str) -> Arc<Self> {
		let provider = Self::new();
		provider.reply(walletlink_protocol::methods::ETH_REQUEST_ACCOUNTS, Ok(Value::from(vec![account])));
		provider.reply(walletlink_protocol::methods::ETH_CHAIN_ID, Ok(Value::from(chain_id)));
		provider
	}

	/// Returns this provider as a trait-object handle.
	pub fn handle(self: &Arc<Self>) -> ProviderHandle {
		Arc::clone(self) as ProviderHandle
	}

	/// Queues an immediate reply for the next `method` request.
	pub fn reply(&self, method: &str, result: Result<Value>) {
		self.replies.lock().entry(method.to_string()).or_default().push_back(Reply::Ready(result));
	}

	/// Queues a reply that stays pending until the returned handle resolves it.
	pub fn defer(&self, method: &str) -> DeferredReply {
		let (tx, rx) = oneshot::channel();
		self.replies.lock().entry(method.to_string()).or_default().push_back(Reply::Deferred(rx));
		DeferredReply { tx }
	}

	/// Methods requested so far, in order.
	pub fn calls(&self) -> Vec<String> {
		self.calls.lock().clone()
	}

	/// Pushes a notification to listeners on `event`.
	pub fn emit(&self, event: ProviderEvent, payload: Value) -> usize {
		self.listeners.emit(event, payload)
	}

	pub fn listener_count(&self, event: ProviderEvent) -> usize {
		self.listeners.count(event)
	}

	/// Total `on` calls.
	pub fn attach_count(&self) -> usize {
		self.attached.load(Ordering::SeqCst)
	}

	/// Total `remove_listener` calls that removed a registered listener.
	pub fn detach_count(&self) -> usize {
		self.detached.load(Ordering::SeqCst)
	}

	/// `remove_listener` calls for ids that were never attached (or already removed).
	pub fn stray_detach_count(&self) -> usize {
		self.stray_detaches.load(Ordering::SeqCst)
	}
}

impl Provider for ScriptedProvider {
	fn request(&self, args: RequestArguments) -> ProviderFuture<'_, Value> {
		self.calls.lock().push(args.method.clone());
		let reply = self.replies.lock().get_mut(&args.method).and_then(VecDeque::pop_front);

		Box::pin(async move {
			match reply {
				Some(Reply::Ready(result)) => result,
				Some(Reply::Deferred(rx)) => rx.await.unwrap_or(Err(Error::Closed)),
				None => Err(Error::Rpc(RpcError::method_not_found(&args.method))),
			}
		})
	}

	fn on(&self, event: ProviderEvent, listener: Listener) -> HandlerId {
		self.attached.fetch_add(1, Ordering::SeqCst);
		self.listeners.add(event, listener)
	}

	fn remove_listener(&self, event: ProviderEvent, id: HandlerId) {
		if self.listeners.remove(event, id) {
			self.detached.fetch_add(1, Ordering::SeqCst);
		} else {
			self.stray_detaches.fetch_add(1, Ordering::SeqCst);
		}
	}

	fn flags(&self) -> ProviderFlags {
		self.flags
	}
}
