//! Keyed single-flight execution.
//!
//! The first caller for a key becomes the leader and runs the work; callers
//! arriving while it runs park on a oneshot channel and receive a clone of
//! the leader's result. If the leader is dropped before finishing, parked
//! callers wake up and one of them takes over.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::Mutex;

use tokio::sync::oneshot;
use tracing::debug;

use super::lock::mutex_lock;

const SOURCE: &str = "util::flight";

type Waiters<K, V> = HashMap<K, Vec<oneshot::Sender<V>>>;

pub struct SingleFlight<K, V> {
    flights: Mutex<Waiters<K, V>>,
}

impl<K, V> SingleFlight<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new() -> Self {
        Self {
            flights: Mutex::new(HashMap::new()),
        }
    }

    /// Run `work` for `key`, or share the outcome of the run already in flight.
    pub async fn run<F, Fut>(&self, key: K, work: F) -> V
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V>,
    {
        self.run_unless(key, || None, work).await
    }

    /// Like [`run`](Self::run), but `precheck` is evaluated under the flight
    /// lock first; a `Some` result is returned without joining or starting a
    /// flight. The check and the in-flight test are atomic with respect to
    /// other callers.
    pub async fn run_unless<P, F, Fut>(&self, key: K, mut precheck: P, work: F) -> V
    where
        P: FnMut() -> Option<V>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = V>,
    {
        let guard = loop {
            let receiver = {
                let mut flights = mutex_lock(&self.flights, SOURCE, "run.acquire");
                if let Some(settled) = precheck() {
                    return settled;
                }
                match flights.get_mut(&key) {
                    Some(waiters) => {
                        let (tx, rx) = oneshot::channel();
                        waiters.push(tx);
                        rx
                    }
                    None => {
                        flights.insert(key.clone(), Vec::new());
                        break FlightGuard {
                            flights: &self.flights,
                            key: Some(key.clone()),
                        };
                    }
                }
            };

            match receiver.await {
                Ok(value) => return value,
                Err(_) => debug!("single-flight leader dropped; retrying acquisition"),
            }
        };

        let value = work().await;
        guard.complete(&value);
        value
    }

    /// Whether a flight is currently running for `key`.
    pub fn is_in_flight(&self, key: &K) -> bool {
        mutex_lock(&self.flights, SOURCE, "is_in_flight").contains_key(key)
    }
}

impl<K, V> Default for SingleFlight<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

struct FlightGuard<'a, K, V>
where
    K: Eq + Hash,
{
    flights: &'a Mutex<Waiters<K, V>>,
    key: Option<K>,
}

impl<K, V> FlightGuard<'_, K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    fn complete(mut self, value: &V) {
        let Some(key) = self.key.take() else {
            return;
        };
        let waiters = mutex_lock(self.flights, SOURCE, "run.complete")
            .remove(&key)
            .unwrap_or_default();
        for waiter in waiters {
            let _ = waiter.send(value.clone());
        }
    }
}

impl<K, V> Drop for FlightGuard<'_, K, V>
where
    K: Eq + Hash,
{
    fn drop(&mut self) {
        if let Some(key) = self.key.take() {
            // Dropping the senders wakes parked callers with a RecvError.
            mutex_lock(self.flights, SOURCE, "run.abandon").remove(&key);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use tokio::sync::Notify;

    use super::*;

    #[tokio::test]
    async fn concurrent_callers_share_one_execution() {
        let flight = Arc::new(SingleFlight::<&'static str, u32>::new());
        let runs = Arc::new(AtomicUsize::new(0));
        let gate = Arc::new(Notify::new());

        let mut handles = Vec::new();
        for _ in 0..5 {
            let flight = Arc::clone(&flight);
            let runs = Arc::clone(&runs);
            let gate = Arc::clone(&gate);
            handles.push(tokio::spawn(async move {
                flight
                    .run("renew", || async move {
                        runs.fetch_add(1, Ordering::SeqCst);
                        gate.notified().await;
                        42
                    })
                    .await
            }));
        }

        while !flight.is_in_flight(&"renew") {
            tokio::task::yield_now().await;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
        gate.notify_one();

        for handle in handles {
            assert_eq!(handle.await.expect("join"), 42);
        }
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert!(!flight.is_in_flight(&"renew"));
    }

    #[tokio::test]
    async fn sequential_calls_run_again() {
        let flight = SingleFlight::<u8, u8>::new();
        let runs = AtomicUsize::new(0);
        for _ in 0..3 {
            flight
                .run(1, || async {
                    runs.fetch_add(1, Ordering::SeqCst);
                    1
                })
                .await;
        }
        assert_eq!(runs.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn precheck_short_circuits() {
        let flight = SingleFlight::<u8, u8>::new();
        let runs = AtomicUsize::new(0);
        let value = flight
            .run_unless(
                1,
                || Some(7),
                || async {
                    runs.fetch_add(1, Ordering::SeqCst);
                    0
                },
            )
            .await;
        assert_eq!(value, 7);
        assert_eq!(runs.load(Ordering::SeqCst), 0);
        assert!(!flight.is_in_flight(&1));
    }

    #[tokio::test]
    async fn follower_takes_over_when_leader_is_dropped() {
        let flight = Arc::new(SingleFlight::<u8, u8>::new());
        let leader = {
            let flight = Arc::clone(&flight);
            tokio::spawn(async move {
                flight
                    .run(1, || async {
                        std::future::pending::<()>().await;
                        0
                    })
                    .await
            })
        };
        while !flight.is_in_flight(&1) {
            tokio::task::yield_now().await;
        }

        let follower = {
            let flight = Arc::clone(&flight);
            tokio::spawn(async move { flight.run(1, || async { 9 }).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        leader.abort();

        assert_eq!(follower.await.expect("join"), 9);
    }
}
