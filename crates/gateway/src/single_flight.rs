use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;

use tokio::sync::{watch, Mutex};

/// Dedups concurrent callers sharing the same key into one in-flight
/// call, keyed here by the refresh token value (spec.md §5: "Gateway
/// refresh uses single-flight keyed by the refresh token value so
/// concurrent requests waiting on an expired access token cause at most
/// one upstream rotation").
///
/// Uses a `watch` channel rather than `broadcast` so a follower that
/// subscribes late — after the leader has already delivered its result —
/// still observes it: `watch::Receiver::borrow` always reflects the
/// current value regardless of when the subscription happened, whereas
/// `broadcast::Receiver::recv` only sees messages sent after
/// `subscribe()`, which races the leader's send against the map cleanup
/// that follows it.
pub struct SingleFlight<K, V> {
    inflight: Mutex<HashMap<K, watch::Receiver<Option<Result<V, String>>>>>,
}

impl<K, V> Default for SingleFlight<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> SingleFlight<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone + Send + 'static,
{
    pub fn new() -> Self {
        Self { inflight: Mutex::new(HashMap::new()) }
    }

    /// Runs `f` for `key` if no call is already in flight; otherwise
    /// awaits the in-flight call's result. Every caller — leader and
    /// followers — gets the same `Result`.
    pub async fn run<F, Fut>(&self, key: K, f: F) -> Result<V, String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, String>>,
    {
        let mut guard = self.inflight.lock().await;
        if let Some(receiver) = guard.get(&key) {
            let mut receiver = receiver.clone();
            drop(guard);
            return Self::await_result(&mut receiver).await;
        }

        let (sender, receiver) = watch::channel(None);
        guard.insert(key.clone(), receiver);
        drop(guard);

        let result = f().await;
        let _ = sender.send(Some(result.clone()));

        self.inflight.lock().await.remove(&key);
        result
    }

    async fn await_result(receiver: &mut watch::Receiver<Option<Result<V, String>>>) -> Result<V, String> {
        if let Some(result) = receiver.borrow().clone() {
            return result;
        }
        match receiver.changed().await {
            Ok(()) => receiver.borrow().clone().unwrap_or_else(|| Err("leader dropped result".to_string())),
            Err(_) => Err("leader dropped result".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn concurrent_callers_share_one_upstream_call() {
        let flight: Arc<SingleFlight<String, u32>> = Arc::new(SingleFlight::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let flight = flight.clone();
            let calls = calls.clone();
            handles.push(tokio::spawn(async move {
                flight
                    .run("refresh-token-abc".to_string(), || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
                        Ok::<u32, String>(42)
                    })
                    .await
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap(), Ok(42));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn different_keys_run_independently() {
        let flight: SingleFlight<String, u32> = SingleFlight::new();
        let a = flight.run("a".to_string(), || async { Ok::<u32, String>(1) }).await;
        let b = flight.run("b".to_string(), || async { Ok::<u32, String>(2) }).await;
        assert_eq!(a, Ok(1));
        assert_eq!(b, Ok(2));
    }
}
