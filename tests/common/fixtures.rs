//! Scripted provider doubles.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use shelfmark::catalog::models::{EntityDetails, EntityKind, EntityLookup};
use shelfmark::enrichment::RateLimited;
use shelfmark::providers::MetadataClient;

/// Provider client double serving a scripted sequence of responses.
///
/// Once the script is exhausted it returns an all-absent bag, like a
/// provider that found nothing.
pub struct StubProvider {
    kind: EntityKind,
    calls: AtomicUsize,
    script: Mutex<Vec<Result<EntityDetails, RateLimited>>>,
}

impl StubProvider {
    pub fn new(
        kind: EntityKind,
        script: Vec<Result<EntityDetails, RateLimited>>,
    ) -> Arc<Self> {
        Arc::new(Self {
            kind,
            calls: AtomicUsize::new(0),
            script: Mutex::new(script),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MetadataClient for StubProvider {
    fn kind(&self) -> EntityKind {
        self.kind
    }

    async fn fetch_details(&self, _lookup: &EntityLookup) -> Result<EntityDetails, RateLimited> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut script = self.script.lock().unwrap();
        if script.is_empty() {
            Ok(EntityDetails::empty(self.kind))
        } else {
            script.remove(0)
        }
    }
}
