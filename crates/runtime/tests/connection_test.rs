// Integration tests for command correlation and event dispatch over a fake peer.
//
// Tests cover:
// - Response/event ordering for a navigation
// - Out-of-order responses and concurrent commands
// - Unknown ids, malformed messages, remote errors
// - Bounded sinks under pressure
// - Peer hang-up while commands are pending

mod fake_peer;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use fake_peer::FakePeer;
use hc_protocol::domains::page::{LoadEventFired, Navigate, NavigateParams};
use hc_protocol::domains::runtime::{Evaluate, EvaluateParams};
use hc_runtime::{Command, ConnectionOptions, Error, EventSink};
use serde_json::json;

const WAIT: Duration = Duration::from_secs(5);

#[tokio::test]
async fn test_navigate_then_load_event() {
	let (connection, mut peer) = FakePeer::connect(ConnectionOptions::default());
	let mut loads = connection.subscribe::<LoadEventFired>();

	let navigate = tokio::spawn({
		let connection = Arc::clone(&connection);
		async move {
			connection
				.call::<Navigate>(NavigateParams::new("https://example.com"))
				.await
		}
	});

	let command = peer.next_command().await;
	assert_eq!(command["method"], "Page.navigate");
	assert_eq!(command["params"]["url"], "https://example.com");

	peer.respond(&command["id"], json!({"frameId": "F1", "loaderId": "L1"}))
		.await;
	peer.event("Page.loadEventFired", json!({"timestamp": 1234.5}))
		.await;

	let returns = navigate.await.unwrap().unwrap();
	assert_eq!(returns.frame_id, "F1");

	let load = loads.next_timeout(WAIT).await.unwrap();
	assert_eq!(load.timestamp, 1234.5);
}

#[tokio::test]
async fn test_responses_correlate_by_id_not_order() {
	let (connection, mut peer) = FakePeer::connect(ConnectionOptions::default());

	// Burn ids 1-4 so the interesting commands get 5 and 6.
	for _ in 0..4 {
		let (command, _reply) = Command::with_reply("Page.enable", None);
		connection.send(command).await.unwrap();
		peer.next_command().await;
	}

	let (first, first_reply) = Command::with_reply("Runtime.evaluate", Some(json!({"expression": "1"})));
	let (second, second_reply) = Command::with_reply("Runtime.evaluate", Some(json!({"expression": "2"})));
	assert_eq!(connection.send(first).await.unwrap().0, 5);
	assert_eq!(connection.send(second).await.unwrap().0, 6);
	peer.next_command().await;
	peer.next_command().await;

	peer.respond(&json!(6), json!({"result": {"type": "number", "value": 2}}))
		.await;
	peer.respond(&json!(5), json!({"result": {"type": "number", "value": 1}}))
		.await;

	let first: serde_json::Value = first_reply.await.unwrap().decode().unwrap();
	let second: serde_json::Value = second_reply.await.unwrap().decode().unwrap();
	assert_eq!(first["result"]["value"], 1);
	assert_eq!(second["result"]["value"], 2);
}

#[tokio::test]
async fn test_concurrent_commands_each_get_their_own_response() {
	const N: usize = 64;
	let (connection, mut peer) = FakePeer::connect(ConnectionOptions::default());

	let mut callers = Vec::new();
	for n in 0..N {
		let connection = Arc::clone(&connection);
		callers.push(tokio::spawn(async move {
			let params = EvaluateParams::by_value(format!("{n}"));
			let returns = connection.call::<Evaluate>(params).await?;
			Ok::<_, Error>((n, returns.into_value()))
		}));
	}

	let mut commands = Vec::new();
	let mut ids = HashSet::new();
	for _ in 0..N {
		let command = peer.next_command().await;
		assert!(ids.insert(command["id"].as_u64().unwrap()), "duplicate id");
		commands.push(command);
	}

	// Answer in a scrambled but deterministic order.
	for i in 0..N {
		let command = &commands[(i * 37) % N];
		let expression = command["params"]["expression"].as_str().unwrap();
		let value: u64 = expression.parse().unwrap();
		peer.respond(&command["id"], json!({"result": {"type": "number", "value": value}}))
			.await;
	}

	for caller in callers {
		let (n, value) = caller.await.unwrap().unwrap();
		assert_eq!(value.unwrap(), json!(n));
	}
	assert_eq!(connection.pending_count().await, 0);
}

#[tokio::test]
async fn test_unknown_id_is_dropped() {
	let (connection, mut peer) = FakePeer::connect(ConnectionOptions::default());

	let call = tokio::spawn({
		let connection = Arc::clone(&connection);
		async move { connection.call_raw("Page.enable", None).await }
	});
	let command = peer.next_command().await;

	peer.respond(&json!(999), json!({"bogus": true})).await;
	peer.respond(&command["id"], json!({})).await;

	let result = call.await.unwrap().unwrap();
	assert_eq!(result.get(), "{}");
	assert!(!connection.is_closed());
}

#[tokio::test]
async fn test_malformed_message_is_skipped() {
	let (connection, mut peer) = FakePeer::connect(ConnectionOptions::default());

	let call = tokio::spawn({
		let connection = Arc::clone(&connection);
		async move { connection.call_raw("Page.enable", None).await }
	});
	let command = peer.next_command().await;

	peer.send_raw(b"this is not json".to_vec()).await;
	peer.send_raw(br#"{"id": 0}"#.to_vec()).await;
	peer.respond(&command["id"], json!({"ok": 1})).await;

	assert_eq!(call.await.unwrap().unwrap().get(), r#"{"ok":1}"#);
}

#[tokio::test]
async fn test_remote_errors_surface_to_caller() {
	let (connection, mut peer) = FakePeer::connect(ConnectionOptions::default());

	let detailed = tokio::spawn({
		let connection = Arc::clone(&connection);
		async move {
			connection
				.call::<Navigate>(NavigateParams::new("not a url"))
				.await
		}
	});
	let command = peer.next_command().await;
	peer.send(json!({
		"id": command["id"],
		"error": {"code": -32000, "message": "Cannot navigate to invalid URL"}
	}))
	.await;

	let err = detailed.await.unwrap().unwrap_err();
	let remote = err.remote().expect("remote error");
	assert_eq!(remote.code, -32000);
	assert_eq!(remote.message, "Cannot navigate to invalid URL");

	let bare = tokio::spawn({
		let connection = Arc::clone(&connection);
		async move { connection.call_raw("Page.enable", None).await }
	});
	let command = peer.next_command().await;
	peer.send(json!({"id": command["id"], "error": "Page domain unavailable"}))
		.await;

	let err = bare.await.unwrap().unwrap_err();
	assert_eq!(err.remote().unwrap().message, "Page domain unavailable");
}

#[tokio::test]
async fn test_undecodable_result_is_an_error_not_a_panic() {
	let (connection, mut peer) = FakePeer::connect(ConnectionOptions::default());

	let call = tokio::spawn({
		let connection = Arc::clone(&connection);
		async move {
			connection
				.call::<Navigate>(NavigateParams::new("https://example.com"))
				.await
		}
	});
	let command = peer.next_command().await;
	peer.respond(&command["id"], json!({"frameId": 42})).await;

	let err = call.await.unwrap().unwrap_err();
	assert!(matches!(err, Error::Json(_)), "got: {err:?}");
}

#[tokio::test]
async fn test_full_sink_drops_without_blocking() {
	let (connection, mut peer) = FakePeer::connect(ConnectionOptions::default());
	let mut loads = connection.subscribe_with_capacity::<LoadEventFired>(1);

	peer.event("Page.loadEventFired", json!({"timestamp": 1.0}))
		.await;
	peer.event("Page.loadEventFired", json!({"timestamp": 2.0}))
		.await;

	// The reader keeps serving responses after dropping the second event.
	let call = tokio::spawn({
		let connection = Arc::clone(&connection);
		async move { connection.call_raw("Page.enable", None).await }
	});
	let command = peer.next_command().await;
	peer.respond(&command["id"], json!({})).await;
	call.await.unwrap().unwrap();

	let first = loads.next_timeout(WAIT).await.unwrap();
	assert_eq!(first.timestamp, 1.0);
	let err = loads
		.next_timeout(Duration::from_millis(50))
		.await
		.unwrap_err();
	assert!(err.is_timeout());
}

#[tokio::test]
async fn test_events_without_sinks_do_not_block() {
	let (connection, mut peer) = FakePeer::connect(ConnectionOptions::default());

	for i in 0..500 {
		peer.event("Network.dataReceived", json!({"seq": i})).await;
	}

	let call = tokio::spawn({
		let connection = Arc::clone(&connection);
		async move { connection.call_raw("Page.enable", None).await }
	});
	let command = peer.next_command().await;
	peer.respond(&command["id"], json!({})).await;

	tokio::time::timeout(WAIT, call).await.unwrap().unwrap().unwrap();
}

#[tokio::test]
async fn test_raw_sink_sees_wire_order() {
	let (connection, mut peer) = FakePeer::connect(ConnectionOptions::default());
	let (sink, mut stream) = EventSink::channel(16);
	assert!(connection.add_sink("Runtime.consoleAPICalled", &sink));
	assert!(!connection.add_sink("Runtime.consoleAPICalled", &sink));

	for seq in 0..10 {
		peer.event("Runtime.consoleAPICalled", json!({"seq": seq})).await;
	}
	for seq in 0..10 {
		let event = tokio::time::timeout(WAIT, stream.recv()).await.unwrap().unwrap();
		let params: serde_json::Value = event.params.decode().unwrap();
		assert_eq!(params["seq"], seq);
	}

	assert!(connection.remove_sink("Runtime.consoleAPICalled", &sink));
}

#[tokio::test]
async fn test_peer_hang_up_fails_pending_commands() {
	let (connection, mut peer) = FakePeer::connect(ConnectionOptions::default());
	let mut loads = connection.subscribe::<LoadEventFired>();

	let pending = tokio::spawn({
		let connection = Arc::clone(&connection);
		async move { connection.call_raw("Page.enable", None).await }
	});
	peer.next_command().await;

	peer.hang_up().await;

	let err = tokio::time::timeout(WAIT, pending)
		.await
		.unwrap()
		.unwrap()
		.unwrap_err();
	assert!(err.is_connection_closed(), "got: {err:?}");

	let err = connection.call_raw("Page.enable", None).await.unwrap_err();
	assert!(err.is_connection_closed(), "got: {err:?}");

	assert!(tokio::time::timeout(WAIT, loads.next()).await.unwrap().is_none());
	assert!(connection.is_closed());
	assert_eq!(connection.pending_count().await, 0);
}
