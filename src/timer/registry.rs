use std::{collections::HashMap, fmt::Display, hash::Hash, sync::Arc, time::Duration};

use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

const ENABLE_LOGS: bool = false;

use crate::log_debug;

/// Delivered to the registry's sink each time a timer elapses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerFired<K> {
    pub name: K,
    pub generation: u64,
}

type Sink<K> = Arc<dyn Fn(TimerFired<K>) + Send + Sync>;

struct ArmedTimer {
    generation: u64,
    repeating: bool,
    cancel_token: CancellationToken,
}

/// Named, cancellable delayed and periodic timers.
///
/// Scheduling under a name that is already armed replaces the old timer, so at
/// most one timer per name is ever live. Elapsed timers are not acted on
/// directly: a [`TimerFired`] is handed to the sink, and the owner must pass it
/// back through [`TimerRegistry::accept`] before reacting. That check rejects a
/// firing that raced with a `cancel` or a re-arm, because its generation no
/// longer matches.
///
/// Must be used from inside a tokio runtime.
pub struct TimerRegistry<K> {
    armed: HashMap<K, ArmedTimer>,
    next_generation: u64,
    sink: Sink<K>,
}

impl<K> TimerRegistry<K>
where
    K: Eq + Hash + Clone + Display + Send + 'static,
{
    pub fn new<F>(sink: F) -> Self
    where
        F: Fn(TimerFired<K>) + Send + Sync + 'static,
    {
        Self {
            armed: HashMap::new(),
            next_generation: 0,
            sink: Arc::new(sink),
        }
    }

    /// One-shot timer firing once after `delay`.
    pub fn schedule(&mut self, name: K, delay: Duration) {
        self.arm(name, delay, false);
    }

    /// Periodic timer firing every `period`, first after one full period.
    pub fn schedule_repeating(&mut self, name: K, period: Duration) {
        self.arm(name, period, true);
    }

    /// Returns whether a timer was armed under `name`.
    pub fn cancel(&mut self, name: &K) -> bool {
        match self.armed.remove(name) {
            Some(timer) => {
                timer.cancel_token.cancel();
                log_debug!("timer {} cancelled", name);
                true
            }
            None => false,
        }
    }

    /// Cancels every timer whose name matches; returns how many were armed.
    pub fn cancel_matching<P>(&mut self, predicate: P) -> usize
    where
        P: Fn(&K) -> bool,
    {
        let doomed: Vec<K> = self
            .armed
            .keys()
            .filter(|name| predicate(name))
            .cloned()
            .collect();
        for name in &doomed {
            self.cancel(name);
        }
        doomed.len()
    }

    pub fn cancel_all(&mut self) {
        for (_, timer) in self.armed.drain() {
            timer.cancel_token.cancel();
        }
    }

    pub fn is_armed(&self, name: &K) -> bool {
        self.armed.contains_key(name)
    }

    pub fn armed_count(&self) -> usize {
        self.armed.len()
    }

    pub fn armed_names(&self) -> impl Iterator<Item = &K> {
        self.armed.keys()
    }

    /// Validates a firing against the live table. One-shot timers are disarmed
    /// on acceptance; periodic ones stay armed.
    pub fn accept(&mut self, fired: &TimerFired<K>) -> bool {
        let Some(timer) = self.armed.get(&fired.name) else {
            log_debug!("dropping firing of disarmed timer {}", fired.name);
            return false;
        };

        if timer.generation != fired.generation {
            log_debug!(
                "dropping stale firing of timer {} (generation {} != {})",
                fired.name,
                fired.generation,
                timer.generation
            );
            return false;
        }

        if !timer.repeating {
            self.armed.remove(&fired.name);
        }
        true
    }

    fn arm(&mut self, name: K, delay: Duration, repeating: bool) {
        if let Some(previous) = self.armed.remove(&name) {
            previous.cancel_token.cancel();
        }

        self.next_generation += 1;
        let generation = self.next_generation;
        let cancel_token = CancellationToken::new();
        let token = cancel_token.clone();
        let sink = Arc::clone(&self.sink);
        let task_name = name.clone();

        tokio::spawn(async move {
            if repeating {
                let mut ticker = time::interval_at(Instant::now() + delay, delay);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    tokio::select! {
                        _ = ticker.tick() => {
                            sink(TimerFired { name: task_name.clone(), generation });
                        }
                        _ = token.cancelled() => break,
                    }
                }
            } else {
                tokio::select! {
                    _ = time::sleep(delay) => sink(TimerFired { name: task_name, generation }),
                    _ = token.cancelled() => {}
                }
            }
        });

        log_debug!(
            "timer {} armed for {:?}{}",
            name,
            delay,
            if repeating { " (repeating)" } else { "" }
        );

        self.armed.insert(
            name,
            ArmedTimer {
                generation,
                repeating,
                cancel_token,
            },
        );
    }
}

impl<K> Drop for TimerRegistry<K> {
    fn drop(&mut self) {
        for (_, timer) in self.armed.drain() {
            timer.cancel_token.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn registry() -> (
        TimerRegistry<String>,
        mpsc::UnboundedReceiver<TimerFired<String>>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        let registry = TimerRegistry::new(move |fired| {
            let _ = tx.send(fired);
        });
        (registry, rx)
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<TimerFired<String>>) -> Vec<TimerFired<String>> {
        let mut out = Vec::new();
        while let Ok(fired) = rx.try_recv() {
            out.push(fired);
        }
        out
    }

    #[tokio::test(start_paused = true)]
    async fn one_shot_fires_once_after_delay() {
        let (mut timers, mut rx) = registry();
        timers.schedule("slow".to_string(), Duration::from_secs(5));

        time::sleep(Duration::from_millis(4_999)).await;
        assert!(drain(&mut rx).is_empty());

        time::sleep(Duration::from_millis(2)).await;
        let fired = drain(&mut rx);
        assert_eq!(fired.len(), 1);
        assert!(timers.accept(&fired[0]));
        assert!(!timers.is_armed(&"slow".to_string()));

        time::sleep(Duration::from_secs(60)).await;
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn rescheduling_same_name_replaces_previous_timer() {
        let (mut timers, mut rx) = registry();
        timers.schedule("slow".to_string(), Duration::from_secs(5));
        time::sleep(Duration::from_secs(3)).await;
        timers.schedule("slow".to_string(), Duration::from_secs(5));
        assert_eq!(timers.armed_count(), 1);

        time::sleep(Duration::from_secs(3)).await;
        assert!(drain(&mut rx).is_empty(), "first timer must not fire");

        time::sleep(Duration::from_secs(3)).await;
        let fired = drain(&mut rx);
        assert_eq!(fired.len(), 1);
        assert!(timers.accept(&fired[0]));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_is_noop_when_absent() {
        let (mut timers, mut rx) = registry();
        assert!(!timers.cancel(&"missing".to_string()));

        timers.schedule("evict".to_string(), Duration::from_secs(1));
        assert!(timers.cancel(&"evict".to_string()));
        time::sleep(Duration::from_secs(2)).await;
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn stale_generation_is_rejected() {
        let (mut timers, _rx) = registry();
        timers.schedule("final".to_string(), Duration::from_secs(30));
        let stale = TimerFired {
            name: "final".to_string(),
            generation: 0,
        };
        assert!(!timers.accept(&stale));
        assert!(timers.is_armed(&"final".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn repeating_timer_keeps_firing_until_cancelled() {
        let (mut timers, mut rx) = registry();
        timers.schedule_repeating("progress".to_string(), Duration::from_millis(100));

        time::sleep(Duration::from_millis(350)).await;
        let fired = drain(&mut rx);
        assert_eq!(fired.len(), 3);
        for firing in &fired {
            assert!(timers.accept(firing));
        }
        assert!(timers.is_armed(&"progress".to_string()));

        timers.cancel(&"progress".to_string());
        time::sleep(Duration::from_millis(500)).await;
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_matching_only_hits_selected_names() {
        let (mut timers, _rx) = registry();
        timers.schedule("load:notes".to_string(), Duration::from_secs(5));
        timers.schedule("load:gallery".to_string(), Duration::from_secs(5));
        timers.schedule("evict:notes".to_string(), Duration::from_secs(300));

        let cancelled = timers.cancel_matching(|name| name.starts_with("load:"));
        assert_eq!(cancelled, 2);
        assert_eq!(timers.armed_count(), 1);
        assert!(timers.is_armed(&"evict:notes".to_string()));
    }
}
