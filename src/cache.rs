//! In-process coordination for the on-disk resize cache.
//!
//! The cache itself is just files: a resized image exists at its
//! [`PathResolver`](crate::naming::PathResolver) path or it does not. What
//! files cannot express is "someone is writing this right now". Without that,
//! two threads asking for the same image at the same size both miss, both
//! decode, and both encode.
//!
//! # In-flight registry
//!
//! [`InFlight`] maps a cache path to a completion signal. The first caller
//! for a key becomes the *leader* and receives a [`BuildGuard`]; concurrent
//! callers become *followers* and block in [`InFlight::wait`] until the
//! leader's guard is dropped. Followers then re-check the disk: a successful
//! leader means a cache hit, a failed one means the follower tries again
//! itself. Different keys never wait on each other.
//!
//! The guard releases its slot on drop, so a leader that returns early with
//! an error (or panics) still wakes its followers.
//!
//! This only covers one process. Separate processes sharing a cache folder
//! can still both build the same file; the second write replaces the first
//! with equivalent content.
//!
//! # Statistics
//!
//! [`CacheStats`] tallies hits, newly created files, and fallbacks (requests
//! answered with the original path) for batch reporting.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

/// Completion signal for one cache key.
#[derive(Debug, Default)]
struct Flight {
    done: Mutex<bool>,
    cv: Condvar,
}

impl Flight {
    fn finish(&self) {
        let mut done = self.done.lock().unwrap_or_else(PoisonError::into_inner);
        *done = true;
        self.cv.notify_all();
    }

    fn wait(&self) {
        let mut done = self.done.lock().unwrap_or_else(PoisonError::into_inner);
        while !*done {
            done = self.cv.wait(done).unwrap_or_else(PoisonError::into_inner);
        }
    }
}

/// Registry of cache paths currently being built.
#[derive(Debug, Default)]
pub struct InFlight {
    flights: Mutex<HashMap<PathBuf, Arc<Flight>>>,
}

/// Outcome of trying to claim a cache key.
pub enum Claim<'a> {
    /// This caller builds the file. Dropping the guard releases the key.
    Leader(BuildGuard<'a>),
    /// Another caller is building it; pass this to [`InFlight::wait`].
    Follower(Waiter),
}

/// Held by the leader for the duration of a build.
pub struct BuildGuard<'a> {
    registry: &'a InFlight,
    key: PathBuf,
    flight: Arc<Flight>,
}

/// Held by a follower until the leader finishes.
pub struct Waiter {
    flight: Arc<Flight>,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<PathBuf, Arc<Flight>>> {
        self.flights.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Become the leader for `key`, or learn who already is.
    pub fn claim(&self, key: &Path) -> Claim<'_> {
        let mut flights = self.lock();
        if let Some(flight) = flights.get(key) {
            return Claim::Follower(Waiter {
                flight: Arc::clone(flight),
            });
        }
        let flight = Arc::new(Flight::default());
        flights.insert(key.to_path_buf(), Arc::clone(&flight));
        Claim::Leader(BuildGuard {
            registry: self,
            key: key.to_path_buf(),
            flight,
        })
    }

    /// Block until the leader holding `waiter`'s key is done.
    pub fn wait(&self, waiter: Waiter) {
        waiter.flight.wait();
    }

    /// Number of keys currently being built.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Drop for BuildGuard<'_> {
    fn drop(&mut self) {
        self.registry.lock().remove(&self.key);
        self.flight.finish();
    }
}

/// Summary of cache performance for a batch run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct CacheStats {
    pub hits: u32,
    pub created: u32,
    pub fallbacks: u32,
}

impl CacheStats {
    pub fn hit(&mut self) {
        self.hits += 1;
    }

    pub fn create(&mut self) {
        self.created += 1;
    }

    pub fn fallback(&mut self) {
        self.fallbacks += 1;
    }

    pub fn total(&self) -> u32 {
        self.hits + self.created + self.fallbacks
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.fallbacks > 0 {
            write!(
                f,
                "{} cached, {} created, {} skipped ({} total)",
                self.hits,
                self.created,
                self.fallbacks,
                self.total()
            )
        } else if self.hits > 0 {
            write!(
                f,
                "{} cached, {} created ({} total)",
                self.hits,
                self.created,
                self.total()
            )
        } else {
            write!(f, "{} created", self.created)
        }
    }
}
