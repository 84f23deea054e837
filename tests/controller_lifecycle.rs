//! Integration tests for the fetch controller lifecycle
//!
//! These tests drive a controller against scripted transports, an in-memory
//! store and a manually advanced clock, covering supersession, cancellation,
//! cache hits and expiry, error retention and teardown.

use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use cached_fetch::app::{
    CacheKey, CacheStore, Capabilities, FetchController, FetchPhase, FetchRequest, ManualClock,
    MemoryStore, RawResponse, RequestOptions, ResponseTransform, StringHash, Transport,
};
use cached_fetch::errors::{CacheError, CacheResult, FetchError, FetchResult};

const URL: &str = "https://x/data";

type Reply = oneshot::Sender<FetchResult<RawResponse>>;

/// Transport whose calls stay pending until the test replies to them
#[derive(Debug, Default)]
struct GatedTransport {
    calls: AtomicUsize,
    pending: Mutex<VecDeque<Reply>>,
}

impl GatedTransport {
    /// Wait for the next call to reach the transport and take its reply slot
    async fn next_call(&self) -> Reply {
        tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                if let Some(reply) = self.pending.lock().unwrap().pop_front() {
                    return reply;
                }
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("transport was never called")
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for GatedTransport {
    async fn fetch(
        &self,
        _locator: &str,
        _options: &RequestOptions,
        _cancel: CancellationToken,
    ) -> FetchResult<RawResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = oneshot::channel();
        self.pending.lock().unwrap().push_back(tx);
        rx.await
            .unwrap_or_else(|_| Err(FetchError::transport("reply dropped")))
    }
}

/// Transport answering from a queue of scripted results
#[derive(Debug, Default)]
struct ScriptedTransport {
    locators: Mutex<Vec<String>>,
    replies: Mutex<VecDeque<FetchResult<RawResponse>>>,
}

impl ScriptedTransport {
    fn with_replies(replies: Vec<FetchResult<RawResponse>>) -> Self {
        Self {
            locators: Mutex::new(Vec::new()),
            replies: Mutex::new(replies.into()),
        }
    }

    fn push(&self, reply: FetchResult<RawResponse>) {
        self.replies.lock().unwrap().push_back(reply);
    }

    fn calls(&self) -> usize {
        self.locators.lock().unwrap().len()
    }

    fn locators(&self) -> Vec<String> {
        self.locators.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn fetch(
        &self,
        locator: &str,
        _options: &RequestOptions,
        _cancel: CancellationToken,
    ) -> FetchResult<RawResponse> {
        self.locators.lock().unwrap().push(locator.to_string());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(FetchError::transport("no scripted reply")))
    }
}

/// Store that reads as empty and rejects every write
#[derive(Debug, Default)]
struct ReadOnlyStore;

impl CacheStore for ReadOnlyStore {
    fn get(&self, _key: &str) -> CacheResult<Option<String>> {
        Ok(None)
    }

    fn set(&self, _key: &str, _value: &str) -> CacheResult<()> {
        Err(CacheError::Io(io::Error::new(io::ErrorKind::Other, "disk full")))
    }

    fn delete(&self, _key: &str) -> CacheResult<()> {
        Ok(())
    }
}

fn capabilities(
    transport: Arc<dyn Transport>,
    store: Arc<dyn CacheStore>,
    clock: Arc<ManualClock>,
) -> Capabilities {
    Capabilities::new(transport, store).with_clock(clock)
}

fn url_key() -> CacheKey {
    CacheKey::from_locator(URL, &StringHash)
}

/// Let spawned operations run to their next suspension point
async fn drain() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn test_only_last_start_is_reflected() {
    let transport = Arc::new(GatedTransport::default());
    let controller = FetchController::new(
        FetchRequest::new(URL, "initial".to_string()),
        capabilities(
            transport.clone(),
            Arc::new(MemoryStore::new()),
            Arc::new(ManualClock::at_secs(0)),
        ),
    );

    let first = transport.next_call().await;
    let second_task = controller.start().unwrap();
    let second = transport.next_call().await;
    assert_eq!(transport.calls(), 2);

    second.send(Ok(RawResponse::ok("\"second\""))).unwrap();
    second_task.await.unwrap();

    // The superseded call may already be gone; a late reply must not matter
    let _ = first.send(Ok(RawResponse::ok("\"first\"")));
    drain().await;

    let state = controller.state();
    assert_eq!(state.phase(), FetchPhase::Success);
    assert_eq!(state.data, "second");
    assert!(!state.canceled);
    assert!(state.error.is_none());
}

#[tokio::test]
async fn test_superseded_failure_is_suppressed() {
    let transport = Arc::new(GatedTransport::default());
    let controller = FetchController::new(
        FetchRequest::new(URL, 0u32),
        capabilities(
            transport.clone(),
            Arc::new(MemoryStore::new()),
            Arc::new(ManualClock::at_secs(0)),
        ),
    );

    let first = transport.next_call().await;
    controller.start();
    let second = transport.next_call().await;

    let _ = first.send(Err(FetchError::transport("connection reset")));
    drain().await;
    assert!(controller.state().loading);

    second.send(Ok(RawResponse::ok("5"))).unwrap();
    let state = controller.settled().await;
    assert_eq!(state.phase(), FetchPhase::Success);
    assert_eq!(state.data, 5);
}

#[tokio::test]
async fn test_abort_while_loading_settles_canceled() {
    let transport = Arc::new(GatedTransport::default());
    let controller = FetchController::new(
        FetchRequest::new(URL, "initial".to_string()),
        capabilities(
            transport.clone(),
            Arc::new(MemoryStore::new()),
            Arc::new(ManualClock::at_secs(0)),
        ),
    );

    let reply = transport.next_call().await;
    controller.abort();

    let state = controller.settled().await;
    assert!(!state.loading);
    assert!(state.canceled);
    assert!(state.error.is_none());
    assert_eq!(state.data, "initial");

    let _ = reply.send(Ok(RawResponse::ok("\"late\"")));
    drain().await;
    assert_eq!(controller.state().data, "initial");
    assert_eq!(controller.state().phase(), FetchPhase::Canceled);
}

#[tokio::test]
async fn test_abort_when_settled_is_noop() {
    let transport = Arc::new(ScriptedTransport::with_replies(vec![Ok(RawResponse::ok("1"))]));
    let controller = FetchController::new(
        FetchRequest::new(URL, 0u32),
        capabilities(
            transport,
            Arc::new(MemoryStore::new()),
            Arc::new(ManualClock::at_secs(0)),
        ),
    );

    controller.settled().await;
    controller.abort();
    drain().await;

    let state = controller.state();
    assert_eq!(state.phase(), FetchPhase::Success);
    assert_eq!(state.data, 1);
}

#[tokio::test]
async fn test_cache_hit_skips_network() {
    let transport = Arc::new(ScriptedTransport::with_replies(vec![Ok(RawResponse::ok(
        r#"{"v":1}"#,
    ))]));
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(ManualClock::at_secs(1_000));
    let controller = FetchController::new(
        FetchRequest::new(URL, Value::Null).with_expiry_secs(60),
        capabilities(transport.clone(), store.clone(), clock.clone()),
    );

    let state = controller.settled().await;
    assert_eq!(state.data, json!({"v": 1}));
    assert_eq!(transport.calls(), 1);

    clock.set_secs(1_010);
    controller.start().unwrap().await.unwrap();

    let state = controller.state();
    assert_eq!(state.phase(), FetchPhase::Success);
    assert_eq!(state.data, json!({"v": 1}));
    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn test_expired_entry_is_deleted_before_network() {
    let transport = Arc::new(ScriptedTransport::with_replies(vec![
        Ok(RawResponse::ok(r#"{"v":1}"#)),
        Err(FetchError::transport("offline")),
    ]));
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(ManualClock::at_secs(1_000));
    let controller = FetchController::new(
        FetchRequest::new(URL, Value::Null).with_expiry_secs(60),
        capabilities(transport.clone(), store.clone(), clock.clone()),
    );

    controller.settled().await;
    assert!(store.contains(url_key().value_slot()));

    clock.set_secs(1_070);
    controller.start().unwrap().await.unwrap();

    assert_eq!(transport.calls(), 2);
    assert!(store.is_empty());

    // The failed refresh keeps the previously resolved data
    let state = controller.state();
    assert_eq!(state.phase(), FetchPhase::Failed);
    assert_eq!(state.data, json!({"v": 1}));
}

#[tokio::test]
async fn test_data_retained_on_error() {
    let transport = Arc::new(ScriptedTransport::with_replies(vec![Err(
        FetchError::Status {
            status: 500,
            url: URL.to_string(),
        },
    )]));
    let controller = FetchController::new(
        FetchRequest::new(URL, "initial".to_string()),
        capabilities(
            transport,
            Arc::new(MemoryStore::new()),
            Arc::new(ManualClock::at_secs(0)),
        ),
    );

    let state = controller.settled().await;
    assert!(!state.loading);
    assert!(!state.canceled);
    assert_eq!(state.data, "initial");
    assert!(matches!(
        state.error.as_deref(),
        Some(FetchError::Status { status: 500, .. })
    ));
}

#[tokio::test]
async fn test_teardown_suppresses_late_completion() {
    let transport = Arc::new(GatedTransport::default());
    let store = Arc::new(MemoryStore::new());
    let controller = FetchController::new(
        FetchRequest::new(URL, "initial".to_string()).with_expiry_secs(60),
        capabilities(transport.clone(), store.clone(), Arc::new(ManualClock::at_secs(0))),
    );
    let updates = controller.subscribe();

    let reply = transport.next_call().await;
    controller.shutdown();

    let _ = reply.send(Ok(RawResponse::ok("\"late\"")));
    drain().await;

    let state = updates.borrow().clone();
    assert!(state.loading);
    assert!(!state.canceled);
    assert_eq!(state.data, "initial");
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_cache_round_trip_with_expiry() {
    let transport = Arc::new(GatedTransport::default());
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(ManualClock::at_secs(0));
    let controller = FetchController::new(
        FetchRequest::new(URL, json!({})).with_expiry_secs(5),
        capabilities(transport.clone(), store.clone(), clock.clone()),
    );
    assert!(controller.state().loading);

    // t=1: the network answers and the response is cached
    let reply = transport.next_call().await;
    clock.set_secs(1);
    reply.send(Ok(RawResponse::ok(r#"{"v":1}"#))).unwrap();

    let state = controller.settled().await;
    assert_eq!(state.data, json!({"v": 1}));
    assert!(!state.loading);
    assert!(state.error.is_none());
    assert!(!state.canceled);
    assert_eq!(
        store.get(&url_key().timestamp_slot()).unwrap().as_deref(),
        Some("1000")
    );

    // t=2: one second old, served from the cache
    clock.set_secs(2);
    controller.start().unwrap().await.unwrap();
    assert_eq!(controller.state().phase(), FetchPhase::Success);
    assert_eq!(controller.state().data, json!({"v": 1}));
    assert_eq!(transport.calls(), 1);

    // t=7: six seconds old, cleared and fetched again
    clock.set_secs(7);
    controller.start();
    let reply = transport.next_call().await;
    assert_eq!(transport.calls(), 2);
    assert!(store.is_empty());

    reply.send(Ok(RawResponse::ok(r#"{"v":2}"#))).unwrap();
    let state = controller.settled().await;
    assert_eq!(state.data, json!({"v": 2}));
    assert_eq!(
        store.get(&url_key().timestamp_slot()).unwrap().as_deref(),
        Some("7000")
    );
}

#[tokio::test]
async fn test_zero_expiry_never_caches() {
    let transport = Arc::new(ScriptedTransport::with_replies(vec![
        Ok(RawResponse::ok("1")),
        Ok(RawResponse::ok("2")),
    ]));
    let store = Arc::new(MemoryStore::new());
    let controller = FetchController::new(
        FetchRequest::new(URL, 0u32).with_expiry_secs(0),
        capabilities(transport.clone(), store.clone(), Arc::new(ManualClock::at_secs(0))),
    );

    controller.settled().await;
    controller.start().unwrap().await.unwrap();

    assert_eq!(controller.state().data, 2);
    assert_eq!(transport.calls(), 2);
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_jsonp_response_is_unwrapped() {
    let transport = Arc::new(ScriptedTransport::with_replies(vec![Ok(RawResponse::ok(
        r#"/**/ handle_data({"v":3});"#,
    ))]));
    let controller = FetchController::new(
        FetchRequest::new(URL, Value::Null).with_transform(ResponseTransform::Jsonp),
        capabilities(
            transport,
            Arc::new(MemoryStore::new()),
            Arc::new(ManualClock::at_secs(0)),
        ),
    );

    let state = controller.settled().await;
    assert_eq!(state.phase(), FetchPhase::Success);
    assert_eq!(state.data, json!({"v": 3}));
}

#[tokio::test]
async fn test_decode_failure_surfaces_as_error() {
    let transport = Arc::new(ScriptedTransport::with_replies(vec![Ok(RawResponse::ok(
        "<html>maintenance</html>",
    ))]));
    let store = Arc::new(MemoryStore::new());
    let controller = FetchController::new(
        FetchRequest::new(URL, Value::Null).with_expiry_secs(60),
        capabilities(transport, store.clone(), Arc::new(ManualClock::at_secs(0))),
    );

    let state = controller.settled().await;
    assert_eq!(state.phase(), FetchPhase::Failed);
    assert!(matches!(state.error.as_deref(), Some(FetchError::Decode(_))));
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_cache_write_failure_still_succeeds() {
    let transport = Arc::new(ScriptedTransport::with_replies(vec![Ok(RawResponse::ok(
        r#"{"v":1}"#,
    ))]));
    let controller = FetchController::new(
        FetchRequest::new(URL, Value::Null).with_expiry_secs(60),
        capabilities(
            transport,
            Arc::new(ReadOnlyStore),
            Arc::new(ManualClock::at_secs(0)),
        ),
    );

    let state = controller.settled().await;
    assert_eq!(state.phase(), FetchPhase::Success);
    assert_eq!(state.data, json!({"v": 1}));
}

#[tokio::test]
async fn test_corrupt_entry_is_treated_as_miss() {
    let transport = Arc::new(ScriptedTransport::with_replies(vec![Ok(RawResponse::ok(
        r#"{"v":4}"#,
    ))]));
    let store = Arc::new(MemoryStore::new());
    let key = url_key();
    store.set(key.value_slot(), r#"{"v":0}"#).unwrap();
    store.set(&key.timestamp_slot(), "yesterday").unwrap();

    let controller = FetchController::new(
        FetchRequest::new(URL, Value::Null).with_expiry_secs(60),
        capabilities(
            transport.clone(),
            store.clone(),
            Arc::new(ManualClock::at_secs(10)),
        ),
    );

    let state = controller.settled().await;
    assert_eq!(state.data, json!({"v": 4}));
    assert_eq!(transport.calls(), 1);
    assert_eq!(
        store.get(&key.timestamp_slot()).unwrap().as_deref(),
        Some("10000")
    );
}

#[tokio::test]
async fn test_out_of_range_timestamp_is_treated_as_miss() {
    let transport = Arc::new(ScriptedTransport::with_replies(vec![Ok(RawResponse::ok("2"))]));
    let store = Arc::new(MemoryStore::new());
    let key = CacheKey::explicit("k");
    store.set(key.value_slot(), "1").unwrap();
    store
        .set(&key.timestamp_slot(), &i64::MIN.to_string())
        .unwrap();

    let controller = FetchController::new(
        FetchRequest::new(URL, 0u32)
            .with_expiry_secs(60)
            .with_cache_key("k"),
        capabilities(
            transport.clone(),
            store.clone(),
            Arc::new(ManualClock::at_secs(10)),
        ),
    );

    let state = tokio::time::timeout(Duration::from_secs(2), controller.settled())
        .await
        .expect("fetch never settled");
    assert_eq!(state.phase(), FetchPhase::Success);
    assert_eq!(state.data, 2);
    assert_eq!(transport.calls(), 1);
    assert_eq!(
        store.get(&key.timestamp_slot()).unwrap().as_deref(),
        Some("10000")
    );
}

#[tokio::test]
async fn test_transport_cancellation_without_abort_is_failure() {
    let transport = Arc::new(ScriptedTransport::with_replies(vec![Err(FetchError::Canceled)]));
    let controller = FetchController::new(
        FetchRequest::new(URL, 0u32),
        capabilities(
            transport,
            Arc::new(MemoryStore::new()),
            Arc::new(ManualClock::at_secs(0)),
        ),
    );

    let state = controller.settled().await;
    assert_eq!(state.phase(), FetchPhase::Failed);
    assert!(!state.canceled);
    assert!(matches!(state.error.as_deref(), Some(FetchError::Canceled)));
}

#[tokio::test]
async fn test_explicit_cache_key_is_used() {
    let transport = Arc::new(ScriptedTransport::with_replies(vec![Ok(RawResponse::ok("1"))]));
    let store = Arc::new(MemoryStore::new());
    let controller = FetchController::new(
        FetchRequest::new(URL, 0u32)
            .with_expiry_secs(60)
            .with_cache_key("profile"),
        capabilities(transport, store.clone(), Arc::new(ManualClock::at_secs(0))),
    );

    controller.settled().await;
    assert_eq!(store.get("profile").unwrap().as_deref(), Some("1"));
    assert_eq!(store.get("profile:ts").unwrap().as_deref(), Some("0"));
    assert!(!store.contains(url_key().value_slot()));
}

#[tokio::test]
async fn test_restart_with_new_request() {
    let transport = Arc::new(ScriptedTransport::with_replies(vec![Ok(RawResponse::ok(
        "\"other\"",
    ))]));
    let controller = FetchController::new(
        FetchRequest::new(URL, String::new()),
        capabilities(
            transport.clone(),
            Arc::new(MemoryStore::new()),
            Arc::new(ManualClock::at_secs(0)),
        ),
    );

    let task = controller
        .restart_with(FetchRequest::new("https://x/other", String::new()))
        .unwrap();
    task.await.unwrap();

    assert_eq!(controller.request().locator, "https://x/other");
    assert_eq!(controller.state().data, "other");
    assert_eq!(transport.locators(), vec!["https://x/other".to_string()]);
}

#[tokio::test]
async fn test_purge_cache_forces_network() {
    let transport = Arc::new(ScriptedTransport::with_replies(vec![Ok(RawResponse::ok("1"))]));
    let store = Arc::new(MemoryStore::new());
    let controller = FetchController::new(
        FetchRequest::new(URL, 0u32).with_expiry_secs(60),
        capabilities(transport.clone(), store.clone(), Arc::new(ManualClock::at_secs(0))),
    );

    controller.settled().await;
    assert!(!store.is_empty());

    tokio_test::assert_ok!(controller.purge_cache());
    assert!(store.is_empty());

    transport.push(Ok(RawResponse::ok("2")));
    controller.start().unwrap().await.unwrap();
    assert_eq!(controller.state().data, 2);
    assert_eq!(transport.calls(), 2);
}

#[tokio::test]
async fn test_subscribers_observe_transitions() {
    let transport = Arc::new(GatedTransport::default());
    let controller = FetchController::new(
        FetchRequest::new(URL, 0u32),
        capabilities(
            transport.clone(),
            Arc::new(MemoryStore::new()),
            Arc::new(ManualClock::at_secs(0)),
        ),
    );
    let mut updates = controller.subscribe();
    assert_eq!(updates.borrow_and_update().phase(), FetchPhase::Loading);

    transport
        .next_call()
        .await
        .send(Ok(RawResponse::ok("9")))
        .unwrap();

    updates.changed().await.unwrap();
    let state = updates.borrow_and_update().clone();
    assert_eq!(state.phase(), FetchPhase::Success);
    assert_eq!(state.data, 9);
}
