// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! The counter-aggregating [`Stat`] decorator

use std::{fmt, sync::Arc, time::Duration};

use stattally_core::{BoxStat, Stat};
use tokio::runtime::{Handle, TryCurrentError};

use crate::{
    accumulator::{Accumulator, Generation},
    gate::{FlushGate, FlushPermit},
};

/// Outcome of [`CountAggregator::try_start_flush`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlushStart {
    /// No flush was pending; a flush task has been spawned.
    Started,
    /// A flush task is already pending and will pick up everything accumulated so far.
    Skipped,
}

/// A [`Stat`] that aggregates counters before forwarding them to another `Stat`.
///
/// Every [`Stat::count`] adds to a running sum per metric name and tag set, then makes sure a
/// flush is scheduled. The first counter after a flush spawns a task that sleeps for the flush
/// interval and forwards each sum with a single `count` call. Only one such task exists at a time
/// per aggregator; callers never wait for it.
///
/// Everything else ([`Stat::gauge`], [`Stat::histogram`], [`Stat::timing`], tag management) is
/// forwarded to the wrapped client immediately and unchanged.
///
/// Cloning is cheap and clones share their state.
pub struct CountAggregator<S = BoxStat> {
    inner: Arc<Inner<S>>,
}

struct Inner<S> {
    stat: S,
    accumulator: Accumulator,
    gate: FlushGate,
    flush_interval: Duration,
    runtime: Handle,
}

impl<S> Clone for CountAggregator<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S> fmt::Debug for CountAggregator<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CountAggregator")
            .field("flush_interval", &self.inner.flush_interval)
            .field("pending", &self.inner.accumulator.len())
            .field("flush_scheduled", &self.inner.gate.is_held())
            .finish()
    }
}

impl<S> CountAggregator<S>
where
    S: Stat + Send + Sync + 'static,
{
    /// Wrap `stat`, flushing aggregated counters every `flush_interval`.
    ///
    /// Flush tasks are spawned on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a tokio runtime, see [`CountAggregator::try_new`].
    pub fn new(stat: S, flush_interval: Duration) -> Self {
        Self::with_handle(stat, flush_interval, Handle::current())
    }

    /// Like [`CountAggregator::new`], but fails instead of panicking outside of a tokio runtime.
    pub fn try_new(stat: S, flush_interval: Duration) -> Result<Self, TryCurrentError> {
        Ok(Self::with_handle(stat, flush_interval, Handle::try_current()?))
    }

    /// Wrap `stat`, spawning flush tasks on `runtime`.
    pub fn with_handle(stat: S, flush_interval: Duration, runtime: Handle) -> Self {
        Self {
            inner: Arc::new(Inner {
                stat,
                accumulator: Accumulator::new(),
                gate: FlushGate::new(),
                flush_interval,
                runtime,
            }),
        }
    }

    /// Schedule a flush unless one is already pending.
    ///
    /// [`Stat::count`] calls this after every increment, so there's normally no need to call it
    /// directly.
    pub fn try_start_flush(&self) -> FlushStart {
        self.inner.try_start_flush()
    }

    /// Forward everything accumulated so far right away, returning the number of counters sent.
    ///
    /// Meant for shutdown. A pending timed flush is not cancelled; it will find whatever was
    /// added after this call.
    pub fn flush_now(&self) -> usize {
        self.inner.emit(self.inner.accumulator.drain_and_clear())
    }
}

impl<S> CountAggregator<S> {
    /// The wrapped client
    pub fn stat(&self) -> &S {
        &self.inner.stat
    }

    /// Time between the first counter of a generation and its flush
    pub fn flush_interval(&self) -> Duration {
        self.inner.flush_interval
    }

    /// Number of distinct counters waiting to be flushed
    pub fn pending(&self) -> usize {
        self.inner.accumulator.len()
    }

    /// True while a flush task is pending or running
    pub fn is_flush_scheduled(&self) -> bool {
        self.inner.gate.is_held()
    }
}

impl<S> Inner<S>
where
    S: Stat + Send + Sync + 'static,
{
    fn try_start_flush(self: &Arc<Self>) -> FlushStart {
        let Some(permit) = self.gate.try_acquire() else {
            tracing::trace!("flush already scheduled");
            return FlushStart::Skipped;
        };
        tracing::debug!(flush_interval = ?self.flush_interval, "scheduling counter flush");
        // detached: nobody waits for a flush
        self.runtime.spawn(Arc::clone(self).flush(permit));
        FlushStart::Started
    }

    async fn flush(self: Arc<Self>, permit: FlushPermit) {
        tokio::time::sleep(self.flush_interval).await;

        let emitted = self.emit(self.accumulator.drain_and_clear());
        tracing::debug!(emitted, "flushed aggregated counters");
        drop(permit);

        // counters that arrived while we were emitting found the gate closed, make sure they
        // don't wait for an unrelated future increment
        if !self.accumulator.is_empty() {
            self.try_start_flush();
        }
    }

    fn emit(&self, generation: Generation) -> usize {
        let emitted = generation.len();
        for (key, sum) in generation {
            self.stat.count(key.metric_name(), sum, &key.tags());
        }
        emitted
    }
}

impl<S> Stat for CountAggregator<S>
where
    S: Stat + Send + Sync + 'static,
{
    fn count(&self, stat: &str, count: f64, tags: &[&str]) {
        self.inner.accumulator.insert(stat, count, tags);
        self.inner.try_start_flush();
    }

    fn gauge(&self, stat: &str, value: f64, tags: &[&str]) {
        self.inner.stat.gauge(stat, value, tags)
    }

    fn histogram(&self, stat: &str, value: f64, tags: &[&str]) {
        self.inner.stat.histogram(stat, value, tags)
    }

    fn timing(&self, stat: &str, duration: Duration, tags: &[&str]) {
        self.inner.stat.timing(stat, duration, tags)
    }

    fn add_tags(&self, tags: &[&str]) {
        self.inner.stat.add_tags(tags)
    }

    fn get_tags(&self) -> Vec<String> {
        self.inner.stat.get_tags()
    }
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use assert2::check;
    use stattally_core::{Stat, test_util::RecordingStat};

    use super::{CountAggregator, FlushStart};

    const INTERVAL: Duration = Duration::from_millis(100);

    #[tokio::test(start_paused = true)]
    async fn only_first_count_schedules() {
        let recorder = RecordingStat::default();
        let stat = CountAggregator::new(recorder.clone(), INTERVAL);
        check!(!stat.is_flush_scheduled());

        stat.count("stat1", 1.0, &[]);
        check!(stat.is_flush_scheduled());
        check!(stat.try_start_flush() == FlushStart::Skipped);

        tokio::time::sleep(INTERVAL * 2).await;
        check!(!stat.is_flush_scheduled());
        check!(stat.pending() == 0);
        check!(stat.try_start_flush() == FlushStart::Started);
    }

    #[tokio::test(start_paused = true)]
    async fn flush_now_drains_without_waiting() {
        let recorder = RecordingStat::default();
        let stat = CountAggregator::new(recorder.clone(), INTERVAL);
        stat.count("stat1", 2.0, &["b", "a"]);
        stat.count("stat1", 3.0, &["a", "b"]);

        check!(stat.flush_now() == 1);
        check!(
            recorder.counts()
                == vec![(
                    "stat1".to_string(),
                    5.0,
                    vec!["a".to_string(), "b".to_string()]
                )]
        );

        // the timed flush still runs and finds nothing
        tokio::time::sleep(INTERVAL * 2).await;
        check!(recorder.counts().len() == 1);
    }

    #[test]
    fn try_new_needs_a_runtime() {
        check!(CountAggregator::try_new(RecordingStat::default(), INTERVAL).is_err());
    }
}
