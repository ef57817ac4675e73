//! HTTP provider against a fake JSON-RPC node.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::{Value, json};
use walletlink_protocol::{ProviderEvent, RequestArguments, RpcError, RpcRequest, RpcResponse, codes, methods};
use walletlink_runtime::{Error, HttpProvider, HttpProviderOptions, Provider, WatchState};

#[derive(Default)]
struct FakeNode {
	accounts: Mutex<Value>,
	chain_id: Mutex<Value>,
	supports_request_accounts: bool,
	reject_request_accounts: bool,
	mismatch_ids: bool,
	requests: AtomicUsize,
}

async fn rpc(State(node): State<Arc<FakeNode>>, Json(req): Json<RpcRequest>) -> Json<RpcResponse> {
	node.requests.fetch_add(1, Ordering::SeqCst);
	let id = if node.mismatch_ids { req.id + 100 } else { req.id };

	let response = match req.method.as_str() {
		methods::ETH_ACCOUNTS => RpcResponse::success(id, node.accounts.lock().clone()),
		methods::ETH_CHAIN_ID => RpcResponse::success(id, node.chain_id.lock().clone()),
		methods::ETH_REQUEST_ACCOUNTS if node.reject_request_accounts => RpcResponse::failure(id, RpcError::user_rejected()),
		methods::ETH_REQUEST_ACCOUNTS if node.supports_request_accounts => {
			RpcResponse::success(id, node.accounts.lock().clone())
		}
		other => RpcResponse::failure(id, RpcError::method_not_found(other)),
	};
	Json(response)
}

async fn spawn_node(node: FakeNode) -> (String, Arc<FakeNode>) {
	let node = Arc::new(node);
	let app = Router::new().route("/", post(rpc)).with_state(Arc::clone(&node));
	let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
	let addr = listener.local_addr().unwrap();
	tokio::spawn(async move {
		axum::serve(listener, app).await.unwrap();
	});
	(format!("http://{addr}/"), node)
}

fn node_with(accounts: Value, chain_id: Value) -> FakeNode {
	FakeNode {
		accounts: Mutex::new(accounts),
		chain_id: Mutex::new(chain_id),
		..Default::default()
	}
}

#[tokio::test]
async fn request_returns_result() {
	let (url, _node) = spawn_node(node_with(json!([]), json!("0x38"))).await;
	let provider = HttpProvider::new(HttpProviderOptions::new(url)).unwrap();

	let chain = provider.call(methods::ETH_CHAIN_ID).await.unwrap();
	assert_eq!(chain, json!("0x38"));
}

#[tokio::test]
async fn error_object_maps_to_rpc_error() {
	let node = FakeNode {
		reject_request_accounts: true,
		..node_with(json!(["0xAAA"]), json!("0x1"))
	};
	let (url, _node) = spawn_node(node).await;
	let provider = HttpProvider::new(HttpProviderOptions::new(url)).unwrap();

	let err = provider.call(methods::ETH_REQUEST_ACCOUNTS).await.unwrap_err();
	assert_eq!(err.rpc_code(), Some(codes::USER_REJECTED_REQUEST));
	assert!(err.is_user_rejection());
}

#[tokio::test]
async fn request_accounts_falls_back_to_eth_accounts() {
	let (url, node) = spawn_node(node_with(json!(["0xAAA"]), json!("0x1"))).await;
	let provider = HttpProvider::new(HttpProviderOptions::new(url)).unwrap();

	let accounts = provider.call(methods::ETH_REQUEST_ACCOUNTS).await.unwrap();
	assert_eq!(accounts, json!(["0xAAA"]));
	assert_eq!(node.requests.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn other_methods_do_not_fall_back() {
	let (url, _node) = spawn_node(node_with(json!([]), json!("0x1"))).await;
	let provider = HttpProvider::new(HttpProviderOptions::new(url)).unwrap();

	let err = provider
		.request(RequestArguments {
			method: "eth_getBalance".into(),
			params: Some(json!(["0xAAA", "latest"])),
		})
		.await
		.unwrap_err();
	assert!(err.is_method_not_found());
}

#[tokio::test]
async fn mismatched_response_id_is_rejected() {
	let node = FakeNode {
		mismatch_ids: true,
		..node_with(json!([]), json!("0x1"))
	};
	let (url, _node) = spawn_node(node).await;
	let provider = HttpProvider::new(HttpProviderOptions::new(url)).unwrap();

	let err = provider.call(methods::ETH_CHAIN_ID).await.unwrap_err();
	assert!(matches!(err, Error::InvalidResponse(_)), "got {err:?}");
}

#[tokio::test]
async fn unreachable_node_is_transport_error() {
	let provider = HttpProvider::new(
		HttpProviderOptions::new("http://127.0.0.1:9/").with_request_timeout(Duration::from_millis(500)),
	)
	.unwrap();

	let err = provider.call(methods::ETH_CHAIN_ID).await.unwrap_err();
	assert!(matches!(err, Error::Transport(_) | Error::Timeout(_)), "got {err:?}");
}

#[tokio::test]
async fn poll_emits_only_on_change() {
	let (url, node) = spawn_node(node_with(json!(["0xAAA"]), json!("0x38"))).await;
	let provider = HttpProvider::new(HttpProviderOptions::new(url)).unwrap();

	let seen: Arc<Mutex<Vec<(ProviderEvent, Value)>>> = Arc::default();
	for event in ProviderEvent::ALL {
		let seen = Arc::clone(&seen);
		provider.on(event, Arc::new(move |payload| seen.lock().push((event, payload))));
	}

	let mut state = WatchState::default();
	provider.poll_changes(&mut state).await;
	assert!(seen.lock().is_empty(), "baseline poll must not emit");

	provider.poll_changes(&mut state).await;
	assert!(seen.lock().is_empty());

	*node.chain_id.lock() = json!("0x61");
	provider.poll_changes(&mut state).await;
	assert_eq!(seen.lock().as_slice(), &[(ProviderEvent::ChainChanged, json!("0x61"))]);

	*node.accounts.lock() = json!([]);
	provider.poll_changes(&mut state).await;
	assert_eq!(seen.lock().last(), Some(&(ProviderEvent::AccountsChanged, json!([]))));
	assert_eq!(seen.lock().len(), 2);
}

#[tokio::test]
async fn seeded_watcher_reports_changes_made_before_first_poll() {
	let (url, _node) = spawn_node(node_with(json!(["0xBBB"]), json!("0x38"))).await;
	let provider = Arc::new(HttpProvider::new(HttpProviderOptions::new(url)).unwrap());

	let seen: Arc<Mutex<Vec<(ProviderEvent, Value)>>> = Arc::default();
	for event in ProviderEvent::ALL {
		let seen = Arc::clone(&seen);
		provider.on(event, Arc::new(move |payload| seen.lock().push((event, payload))));
	}

	let seed = WatchState::connected("0xAAA", Some(56));
	assert_eq!(seed.chain_id, Some(json!("0x38")));
	let watcher = provider.watch(Duration::from_millis(20), seed);
	tokio::time::sleep(Duration::from_millis(150)).await;
	drop(watcher);

	assert_eq!(seen.lock().as_slice(), &[(ProviderEvent::AccountsChanged, json!(["0xBBB"]))]);
}

#[tokio::test]
async fn watcher_stops_when_dropped() {
	let (url, node) = spawn_node(node_with(json!(["0xAAA"]), json!("0x38"))).await;
	let provider = Arc::new(HttpProvider::new(HttpProviderOptions::new(url)).unwrap());

	let watcher = provider.watch(Duration::from_millis(20), WatchState::default());
	tokio::time::sleep(Duration::from_millis(120)).await;
	drop(watcher);

	tokio::time::sleep(Duration::from_millis(50)).await;
	let after_stop = node.requests.load(Ordering::SeqCst);
	assert!(after_stop >= 2);

	tokio::time::sleep(Duration::from_millis(100)).await;
	assert_eq!(node.requests.load(Ordering::SeqCst), after_stop);
}
