//! Tokio timer driving a shared scroll engine

use crate::clock::Clock;
use crate::engine::ScrollEngine;
use crate::types::ScrollResult;
use crate::viewport::Viewport;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::task::JoinHandle;

pub type SharedScrollEngine<V, C> = Arc<Mutex<ScrollEngine<V, C>>>;

pub fn shared<V, C>(engine: ScrollEngine<V, C>) -> SharedScrollEngine<V, C> {
    Arc::new(Mutex::new(engine))
}

pub(crate) fn lock<V, C>(engine: &SharedScrollEngine<V, C>) -> MutexGuard<'_, ScrollEngine<V, C>> {
    engine.lock().unwrap_or_else(|e| e.into_inner())
}

/// Tick the engine at each deadline until its current session ends
///
/// Returns the final result, or `None` if the session was stopped or
/// replaced by a newer command. The lock is never held across an await.
/// Waits go through the engine's own clock, so deadlines and sleeps share
/// one timeline.
pub async fn drive<V, C>(engine: SharedScrollEngine<V, C>) -> Option<ScrollResult>
where
    V: Viewport,
    C: Clock + Clone,
{
    let (session, clock) = {
        let guard = lock(&engine);
        (guard.session(), guard.clock().clone())
    };
    loop {
        let deadline = {
            let guard = lock(&engine);
            if guard.session() != session {
                return None;
            }
            guard.next_deadline()?
        };

        clock.sleep_until(deadline).await;

        let mut guard = lock(&engine);
        if guard.session() != session {
            return None;
        }
        if let Some(result) = guard.tick() {
            tracing::debug!(session, completed = result.completed, "scroll session finished");
            return Some(result);
        }
    }
}

/// Spawn [`drive`] on the current runtime
pub fn spawn_driver<V, C>(engine: SharedScrollEngine<V, C>) -> JoinHandle<Option<ScrollResult>>
where
    V: Viewport + Send + 'static,
    C: Clock + Clone + 'static,
{
    tokio::spawn(drive(engine))
}
