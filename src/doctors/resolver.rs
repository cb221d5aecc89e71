//! Clinician display-name cache with debounced, de-duplicated lookups
//!
//! `resolve` never blocks. An uncached id returns [`DoctorName::Loading`] and
//! schedules a single lookup after the debounce delay; each further call made
//! before the lookup starts pushes the delay back. Results are published to
//! per-id watch channels.

use crate::api::{ClinicApi, Clinician, DataSource};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, warn};

/// Shown while a name is being fetched
pub const LOADING_PLACEHOLDER: &str = "Loading...";

/// Cached for ids whose lookup failed, so they are not retried this session
pub const UNKNOWN_DOCTOR: &str = "Unknown doctor";

/// Result of a synchronous resolve
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DoctorName {
    Resolved(String),
    Loading,
}

#[derive(Debug, Clone, Copy)]
struct Pending {
    generation: u64,
    fetching: bool,
}

#[derive(Default)]
struct ResolverState {
    cache: HashMap<String, String>,
    /// Insertion order of cache keys, oldest first
    order: VecDeque<String>,
    pending: HashMap<String, Pending>,
    channels: HashMap<String, watch::Sender<Option<String>>>,
    next_generation: u64,
}

impl ResolverState {
    fn insert(&mut self, id: &str, name: String, capacity: usize) {
        if self.cache.insert(id.to_string(), name).is_none() {
            self.order.push_back(id.to_string());
        }
        while self.cache.len() > capacity.max(1) {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            self.cache.remove(&oldest);
            debug!("Evicted doctor name {oldest} from cache");
        }
        // A later subscribe recreates the channel from the cache
        self.channels.retain(|_, channel| channel.receiver_count() > 0);
    }
}

struct Inner {
    api: Arc<dyn ClinicApi>,
    debounce: Duration,
    capacity: usize,
    state: Mutex<ResolverState>,
}

/// Shared, cloneable handle to the doctor-name cache
#[derive(Clone)]
pub struct DoctorResolver {
    inner: Arc<Inner>,
}

impl DoctorResolver {
    pub fn new(api: Arc<dyn ClinicApi>, debounce: Duration, capacity: usize) -> Self {
        Self {
            inner: Arc::new(Inner {
                api,
                debounce,
                capacity,
                state: Mutex::new(ResolverState::default()),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, ResolverState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Cached name, or `Loading` while a lookup is scheduled or running.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn resolve(&self, id: &str) -> DoctorName {
        let mut state = self.state();
        if let Some(name) = state.cache.get(id) {
            return DoctorName::Resolved(name.clone());
        }

        if state.pending.get(id).is_some_and(|p| p.fetching) {
            return DoctorName::Loading;
        }

        state.next_generation += 1;
        let generation = state.next_generation;
        state.pending.insert(
            id.to_string(),
            Pending {
                generation,
                fetching: false,
            },
        );
        drop(state);

        let resolver = self.clone();
        let id = id.to_string();
        tokio::spawn(async move {
            tokio::time::sleep(resolver.inner.debounce).await;
            resolver.run_fetch(id, generation).await;
        });

        DoctorName::Loading
    }

    /// Watch one id; the value becomes `Some(name)` once it is resolved
    pub fn subscribe(&self, id: &str) -> watch::Receiver<Option<String>> {
        let mut state = self.state();
        let current = state.cache.get(id).cloned();
        state
            .channels
            .entry(id.to_string())
            .or_insert_with(|| watch::channel(current).0)
            .subscribe()
    }

    /// Fill the cache from an already fetched clinician list
    pub fn prime(&self, clinicians: &[Clinician]) {
        let mut state = self.state();
        for clinician in clinicians {
            let name = clinician.display_name();
            if name.is_empty() || state.pending.get(&clinician.id).is_some_and(|p| p.fetching) {
                continue;
            }
            state.pending.remove(&clinician.id);
            state.insert(&clinician.id, name.clone(), self.inner.capacity);
            if let Some(channel) = state.channels.get(&clinician.id) {
                channel.send_replace(Some(name));
            }
        }
    }

    /// Cached name without scheduling anything
    #[cfg(test)]
    pub fn cached(&self, id: &str) -> Option<String> {
        self.state().cache.get(id).cloned()
    }

    async fn run_fetch(&self, id: String, generation: u64) {
        {
            let mut state = self.state();
            match state.pending.get_mut(&id) {
                Some(pending) if pending.generation == generation && !pending.fetching => {
                    pending.fetching = true;
                }
                // Superseded by a later resolve call
                _ => return,
            }
        }

        let name = match self
            .inner
            .api
            .get_clinician(DataSource::Primary, &id)
            .await
        {
            Ok(clinician) => {
                let name = clinician.display_name();
                debug!("Resolved doctor {id} to {name}");
                if name.is_empty() {
                    UNKNOWN_DOCTOR.to_string()
                } else {
                    name
                }
            }
            Err(e) => {
                warn!("Failed to resolve doctor {id}: {e}");
                UNKNOWN_DOCTOR.to_string()
            }
        };

        let mut state = self.state();
        state.insert(&id, name.clone(), self.inner.capacity);
        state.pending.remove(&id);
        if let Some(channel) = state.channels.get(&id) {
            channel.send_replace(Some(name));
        }
    }
}
