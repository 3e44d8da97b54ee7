//! Registry of uploads currently in progress, keyed by base name.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::domain::errors::ResolveError;

/// Shared handle every waiter on one flight polls.
pub type SharedFlight<T> = Shared<BoxFuture<'static, Result<T, ResolveError>>>;

struct Registration<T> {
    generation: u64,
    future: SharedFlight<T>,
}

/// Outcome of [`InFlightRegistry::join_or_start`].
pub struct Flight<T> {
    /// Resolves once the operation settles.
    pub future: SharedFlight<T>,
    /// True if this call started the operation.
    pub leader: bool,
}

/// Collapses concurrent operations on the same key into one.
///
/// The check for an existing flight and the registration of a new one happen
/// under one lock with no await in between, so at most one operation per key
/// runs at any time. The operation itself runs on its own task: callers that
/// stop waiting do not cancel it, and its entry is removed when the task ends
/// however it ends.
pub struct InFlightRegistry<T> {
    flights: Mutex<HashMap<String, Registration<T>>>,
    next_generation: AtomicU64,
}

impl<T> InFlightRegistry<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            flights: Mutex::new(HashMap::new()),
            next_generation: AtomicU64::new(0),
        }
    }

    /// Joins the flight registered under `key`, or registers and spawns the
    /// future built by `start` if there is none.
    ///
    /// `start` is only called when this call becomes the leader.
    pub fn join_or_start<F, Fut>(self: &Arc<Self>, key: &str, start: F) -> Flight<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ResolveError>> + Send + 'static,
    {
        let mut flights = self.flights.lock();

        if let Some(existing) = flights.get(key) {
            debug!(key, "Joining in-flight operation");
            return Flight {
                future: existing.future.clone(),
                leader: false,
            };
        }

        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let guard = FlightGuard {
            registry: Arc::downgrade(self),
            key: key.to_string(),
            generation,
        };
        let operation = start();

        let handle = tokio::spawn(async move {
            let _guard = guard;
            operation.await
        });

        let owned_key = key.to_string();
        let future = handle
            .map(move |joined| match joined {
                Ok(result) => result,
                Err(e) => {
                    warn!(key = %owned_key, error = %e, "In-flight operation aborted");
                    Err(ResolveError::Interrupted {
                        base_name: owned_key,
                        message: e.to_string(),
                    })
                }
            })
            .boxed()
            .shared();

        flights.insert(
            key.to_string(),
            Registration {
                generation,
                future: future.clone(),
            },
        );
        debug!(key, generation, "Started in-flight operation");

        Flight {
            future,
            leader: true,
        }
    }

    /// Returns true if an operation is registered under `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.flights.lock().contains_key(key)
    }

    /// Returns the number of operations in progress.
    pub fn len(&self) -> usize {
        self.flights.lock().len()
    }

    /// Returns true if nothing is in progress.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for InFlightRegistry<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Removes its registration when the owning task finishes, panics or is aborted.
struct FlightGuard<T> {
    registry: Weak<InFlightRegistry<T>>,
    key: String,
    generation: u64,
}

impl<T> Drop for FlightGuard<T> {
    fn drop(&mut self) {
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        let mut flights = registry.flights.lock();
        // A later flight may already own the key.
        if flights
            .get(&self.key)
            .is_some_and(|r| r.generation == self.generation)
        {
            flights.remove(&self.key);
        }
    }
}
