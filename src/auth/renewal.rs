//! Single-flight renewal coordination.
//!
//! N concurrent renewal attempts collapse into one network call whose
//! outcome every caller observes. The in-flight handle is the lock: its
//! presence in the slot means a renewal is running, and it is removed
//! unconditionally before any waiter resolves, so the next caller after
//! completion starts a fresh attempt instead of replaying a stale result.

use std::future::Future;
use std::sync::Arc;

use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use tokio::sync::Mutex;
use tracing::debug;

type RenewalHandle = Shared<BoxFuture<'static, Option<String>>>;

#[derive(Clone, Default)]
pub struct RenewalCoordinator {
    inflight: Arc<Mutex<Option<RenewalHandle>>>,
}

impl RenewalCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `op` unless a renewal is already in flight, in which case join it.
    /// `op` is only invoked by the caller that created the handle; joiners
    /// never touch the network.
    pub async fn run<F, Fut>(&self, op: F) -> Option<String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Option<String>> + Send + 'static,
    {
        let handle = {
            let mut slot = self.inflight.lock().await;
            match slot.as_ref() {
                Some(existing) => {
                    debug!("Joining in-flight token renewal");
                    existing.clone()
                }
                None => {
                    let inflight = Arc::clone(&self.inflight);
                    let fut = op();
                    let handle: RenewalHandle = async move {
                        let outcome = fut.await;
                        // Empty the slot before any waiter sees the outcome.
                        inflight.lock().await.take();
                        outcome
                    }
                    .boxed()
                    .shared();
                    *slot = Some(handle.clone());
                    handle
                }
            }
        };
        handle.await
    }
}
