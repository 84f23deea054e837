//! Fetch lifecycle controller
//!
//! [`FetchController`] owns one current-operation slot, a cache accessor and
//! the state-transition function. Each `start()` supersedes the previous
//! operation synchronously, then runs the fetch sequence as a tokio task:
//!
//! 1. cache lookup (only with a positive TTL); a fresh hit resolves
//!    immediately, an expired or corrupt entry is deleted
//! 2. network request bound to the operation's cancellation token
//! 3. body decoding (optionally unwrapping JSONP)
//! 4. best-effort cache write
//! 5. transition to success
//!
//! Every transition is committed only while the controller is alive and the
//! operation's generation is still current, so superseded or torn-down
//! operations can never overwrite newer state.
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use cached_fetch::app::{
//!     Capabilities, FetchController, FetchPhase, FetchRequest, HttpTransport, MemoryStore,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let capabilities = Capabilities::new(
//!     Arc::new(HttpTransport::new()?),
//!     Arc::new(MemoryStore::new()),
//! );
//! let request = FetchRequest::new("https://x/data", serde_json::Value::Null)
//!     .with_expiry_secs(60);
//!
//! let controller = FetchController::new(request, capabilities);
//! let state = controller.settled().await;
//! if state.phase() == FetchPhase::Success {
//!     println!("{}", state.data);
//! }
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::app::cache::{CacheEntry, CacheKey, CacheStore, KeyHasher, StringHash};
use crate::app::client::Transport;
use crate::app::clock::{Clock, SystemClock};
use crate::app::handle::{HandleSlot, OperationHandle};
use crate::app::request::FetchRequest;
use crate::app::state::FetchState;
use crate::errors::{CacheError, CacheResult, FetchError, FetchResult};

/// External capabilities the controller depends on
#[derive(Debug, Clone)]
pub struct Capabilities {
    /// Network transport
    pub transport: Arc<dyn Transport>,
    /// Key-value store for cached responses
    pub store: Arc<dyn CacheStore>,
    /// Hash used when a request has no explicit cache key
    pub hasher: Arc<dyn KeyHasher>,
    /// Time source for cache timestamps
    pub clock: Arc<dyn Clock>,
}

impl Capabilities {
    /// Capabilities with the default hasher and the system clock
    pub fn new(transport: Arc<dyn Transport>, store: Arc<dyn CacheStore>) -> Self {
        Self {
            transport,
            store,
            hasher: Arc::new(StringHash),
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the cache key hasher
    pub fn with_hasher(mut self, hasher: Arc<dyn KeyHasher>) -> Self {
        self.hasher = hasher;
        self
    }

    /// Replace the clock
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

/// Everything guarded by the control lock: handle identity, liveness and
/// the request configuration change together.
struct Control<T> {
    slot: HandleSlot,
    request: Arc<FetchRequest<T>>,
    alive: bool,
}

struct Shared<T> {
    control: Mutex<Control<T>>,
    state: watch::Sender<FetchState<T>>,
    capabilities: Capabilities,
}

/// Controller driving one request's fetch lifecycle
///
/// Dropping the controller tears it down: the current operation is canceled
/// and no further transitions are applied.
pub struct FetchController<T> {
    shared: Arc<Shared<T>>,
}

impl<T> fmt::Debug for FetchController<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let control = self.shared.lock_control();
        f.debug_struct("FetchController")
            .field("locator", &control.request.locator)
            .field("generation", &control.slot.current_generation())
            .field("alive", &control.alive)
            .finish()
    }
}

impl<T> FetchController<T>
where
    T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    /// Create a controller and immediately start the first fetch
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(request: FetchRequest<T>, capabilities: Capabilities) -> Self {
        let (state, _) = watch::channel(FetchState::initial(request.initial_data.clone()));
        let controller = Self {
            shared: Arc::new(Shared {
                control: Mutex::new(Control {
                    slot: HandleSlot::new(),
                    request: Arc::new(request),
                    alive: true,
                }),
                state,
                capabilities,
            }),
        };
        controller.start();
        controller
    }

    /// Supersede any in-flight operation and start a new fetch
    ///
    /// The new operation becomes current before this returns, so the
    /// completion of every earlier operation is suppressed. Returns the
    /// operation's task handle, or `None` if the controller was torn down.
    pub fn start(&self) -> Option<JoinHandle<()>> {
        let (handle, request) = {
            let mut control = self.shared.lock_control();
            if !control.alive {
                return None;
            }
            let handle = control.slot.supersede();
            self.shared.state.send_modify(FetchState::begin_loading);
            debug!(
                "Starting fetch {} for {}",
                handle.generation(),
                control.request.locator
            );
            (handle, Arc::clone(&control.request))
        };

        let shared = Arc::clone(&self.shared);
        Some(tokio::spawn(async move { shared.run(handle, request).await }))
    }

    /// Cancel the in-flight operation without starting a new one
    ///
    /// The operation settles as canceled; `data` is left untouched.
    pub fn abort(&self) {
        let mut control = self.shared.lock_control();
        if control.slot.cancel_current() {
            debug!(
                "Aborted fetch {:?} for {}",
                control.slot.current_generation(),
                control.request.locator
            );
        }
    }

    /// Replace the request configuration and restart
    pub fn restart_with(&self, request: FetchRequest<T>) -> Option<JoinHandle<()>> {
        {
            let mut control = self.shared.lock_control();
            if !control.alive {
                return None;
            }
            control.request = Arc::new(request);
        }
        self.start()
    }

    /// Delete the cache entry for the current request
    pub fn purge_cache(&self) -> CacheResult<()> {
        let request = self.request();
        let key = CacheKey::for_request(&request, self.shared.capabilities.hasher.as_ref());
        debug!("Purging cache entry {}", key);
        CacheEntry::remove(self.shared.capabilities.store.as_ref(), &key)
    }

    /// Current request configuration
    pub fn request(&self) -> Arc<FetchRequest<T>> {
        Arc::clone(&self.shared.lock_control().request)
    }

    /// Snapshot of the current state
    pub fn state(&self) -> FetchState<T> {
        self.shared.state.borrow().clone()
    }

    /// Receiver notified on every state transition
    pub fn subscribe(&self) -> watch::Receiver<FetchState<T>> {
        self.shared.state.subscribe()
    }

    /// Wait until no operation is in flight and return that state
    pub async fn settled(&self) -> FetchState<T> {
        let mut receiver = self.subscribe();
        let settled = match receiver.wait_for(FetchState::is_settled).await {
            Ok(state) => state.clone(),
            Err(_) => self.state(),
        };
        settled
    }

    /// Tear the controller down
    pub fn shutdown(self) {
        drop(self);
    }
}

impl<T> Drop for FetchController<T> {
    fn drop(&mut self) {
        let mut control = self.shared.lock_control();
        control.alive = false;
        control.slot.cancel_current();
        debug!("Controller for {} torn down", control.request.locator);
    }
}

impl<T> Shared<T> {
    fn lock_control(&self) -> MutexGuard<'_, Control<T>> {
        self.control.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_alive(&self) -> bool {
        self.lock_control().alive
    }

    /// Apply `transition` only if the controller is alive and `generation`
    /// is still the current operation.
    fn commit(&self, generation: u64, transition: impl FnOnce(&mut FetchState<T>)) -> bool {
        let control = self.lock_control();
        if !control.alive || !control.slot.is_current(generation) {
            debug!("Suppressing transition from stale fetch {}", generation);
            return false;
        }
        self.state.send_modify(transition);
        true
    }

    /// Re-assert loading for a current operation, notifying only on change
    fn confirm_loading(&self, generation: u64) {
        let control = self.lock_control();
        if control.alive && control.slot.is_current(generation) {
            self.state.send_if_modified(|state| {
                if state.loading {
                    return false;
                }
                state.begin_loading();
                true
            });
        }
    }
}

impl<T> Shared<T>
where
    T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    async fn run(self: Arc<Self>, handle: OperationHandle, request: Arc<FetchRequest<T>>) {
        let generation = handle.generation();

        match self.execute(&handle, &request).await {
            Ok(data) => {
                if self.commit(generation, |state| state.resolve(data)) {
                    debug!("Fetch {} for {} succeeded", generation, request.locator);
                }
            }
            Err(error) if error.is_cancellation() && handle.is_canceled() => {
                if self.commit(generation, FetchState::cancel) {
                    debug!("Fetch {} for {} canceled", generation, request.locator);
                }
            }
            Err(error) => {
                debug!("Fetch {} for {} failed: {}", generation, request.locator, error);
                self.commit(generation, |state| state.fail(error));
            }
        }
    }

    async fn execute(&self, handle: &OperationHandle, request: &FetchRequest<T>) -> FetchResult<T> {
        if handle.is_canceled() {
            return Err(FetchError::Canceled);
        }

        let cache = request.ttl().map(|ttl| {
            let key = CacheKey::for_request(request, self.capabilities.hasher.as_ref());
            (key, ttl)
        });

        if let Some((key, ttl)) = &cache {
            if let Some(data) = self.lookup_cache(key, *ttl) {
                debug!("Cache hit for {} ({})", request.locator, key);
                return Ok(data);
            }
        }

        self.confirm_loading(handle.generation());

        let token = handle.token().clone();
        let response = tokio::select! {
            biased;
            _ = token.cancelled() => return Err(FetchError::Canceled),
            result = self.capabilities.transport.fetch(&request.locator, &request.options, token.clone()) => result?,
        };

        let data: T = response.decode(request.transform)?;

        if let Some((key, _)) = &cache {
            if self.is_alive() {
                self.store_cache(key, &data);
            }
        }

        Ok(data)
    }

    fn lookup_cache(&self, key: &CacheKey, ttl: Duration) -> Option<T> {
        let store = self.capabilities.store.as_ref();
        let entry = match CacheEntry::load(store, key) {
            Ok(Some(entry)) => entry,
            Ok(None) => {
                debug!("Cache miss for {}", key);
                return None;
            }
            Err(e @ CacheError::CorruptTimestamp { .. }) => {
                warn!("Discarding cache entry {}: {}", key, e);
                self.remove_entry(key);
                return None;
            }
            Err(e) => {
                warn!("Failed to read cache entry {}: {}", key, e);
                return None;
            }
        };

        let now = self.capabilities.clock.now_millis();
        if !entry.is_fresh(now, ttl) {
            debug!(
                "Cache entry {} expired ({:.1}s old, ttl {}s)",
                key,
                entry.age_secs(now),
                ttl.as_secs_f64()
            );
            self.remove_entry(key);
            return None;
        }

        match entry.decode::<T>() {
            Ok(data) => Some(data),
            Err(e) => {
                warn!("Discarding undecodable cache entry {}: {}", key, e);
                self.remove_entry(key);
                None
            }
        }
    }

    fn store_cache(&self, key: &CacheKey, data: &T) {
        let now = self.capabilities.clock.now_millis();
        let result = CacheEntry::encode(data, now)
            .and_then(|entry| entry.save(self.capabilities.store.as_ref(), key));
        if let Err(e) = result {
            warn!("Failed to write cache entry {}: {}", key, e);
        }
    }

    fn remove_entry(&self, key: &CacheKey) {
        if let Err(e) = CacheEntry::remove(self.capabilities.store.as_ref(), key) {
            warn!("Failed to delete cache entry {}: {}", key, e);
        }
    }
}
