// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use crate::{Stat, tags::owned_tags};

/// A call made to a [`RecordingStat`].
#[derive(Debug, Clone, PartialEq)]
pub enum StatEvent {
    /// [`Stat::count`]
    Count {
        /// Name of the counter
        stat: String,
        /// Increment
        value: f64,
        /// Tags in the order they were passed
        tags: Vec<String>,
    },
    /// [`Stat::gauge`]
    Gauge {
        /// Name of the gauge
        stat: String,
        /// Value
        value: f64,
        /// Tags in the order they were passed
        tags: Vec<String>,
    },
    /// [`Stat::histogram`]
    Histogram {
        /// Name of the histogram
        stat: String,
        /// Value
        value: f64,
        /// Tags in the order they were passed
        tags: Vec<String>,
    },
    /// [`Stat::timing`]
    Timing {
        /// Name of the timer
        stat: String,
        /// Recorded duration
        duration: Duration,
        /// Tags in the order they were passed
        tags: Vec<String>,
    },
    /// [`Stat::add_tags`]
    AddTags(Vec<String>),
}

impl StatEvent {
    /// Shorthand for building an expected [`StatEvent::Count`]
    pub fn count(stat: &str, value: f64, tags: &[&str]) -> Self {
        Self::Count {
            stat: stat.to_string(),
            value,
            tags: owned_tags(tags),
        }
    }

    /// Shorthand for building an expected [`StatEvent::Gauge`]
    pub fn gauge(stat: &str, value: f64, tags: &[&str]) -> Self {
        Self::Gauge {
            stat: stat.to_string(),
            value,
            tags: owned_tags(tags),
        }
    }

    /// Shorthand for building an expected [`StatEvent::Histogram`]
    pub fn histogram(stat: &str, value: f64, tags: &[&str]) -> Self {
        Self::Histogram {
            stat: stat.to_string(),
            value,
            tags: owned_tags(tags),
        }
    }

    /// Shorthand for building an expected [`StatEvent::Timing`]
    pub fn timing(stat: &str, duration: Duration, tags: &[&str]) -> Self {
        Self::Timing {
            stat: stat.to_string(),
            duration,
            tags: owned_tags(tags),
        }
    }
}

#[derive(Debug, Default)]
struct Recorded {
    events: Vec<StatEvent>,
    tags: Vec<String>,
}

/// A [`Stat`] that records every call it receives.
///
/// Clones share the same recording, so a test can hand one clone to the code under test and
/// inspect the other.
///
/// ```
/// use stattally_core::Stat;
/// use stattally_core::test_util::{RecordingStat, StatEvent};
///
/// let recorder = RecordingStat::default();
/// let stat = recorder.clone().boxed();
/// stat.count("requests", 1.0, &["route:index"]);
/// assert_eq!(recorder.events(), vec![StatEvent::count("requests", 1.0, &["route:index"])]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RecordingStat {
    inner: Arc<Mutex<Recorded>>,
}

impl RecordingStat {
    /// Every event recorded so far, in call order.
    pub fn events(&self) -> Vec<StatEvent> {
        self.inner.lock().unwrap().events.clone()
    }

    /// Removes and returns every event recorded so far.
    pub fn drain(&self) -> Vec<StatEvent> {
        std::mem::take(&mut self.inner.lock().unwrap().events)
    }

    /// The `(stat, value, tags)` of every [`StatEvent::Count`], sorted by name then tags.
    ///
    /// Sorting makes assertions independent of emission order, which aggregating decorators
    /// don't guarantee across keys.
    pub fn counts(&self) -> Vec<(String, f64, Vec<String>)> {
        let mut counts: Vec<_> = self
            .inner
            .lock()
            .unwrap()
            .events
            .iter()
            .filter_map(|event| match event {
                StatEvent::Count { stat, value, tags } => {
                    Some((stat.clone(), *value, tags.clone()))
                }
                _ => None,
            })
            .collect();
        counts.sort_by(|a, b| (&a.0, &a.2).cmp(&(&b.0, &b.2)));
        counts
    }

    fn record(&self, event: StatEvent) {
        self.inner.lock().unwrap().events.push(event);
    }
}

impl Stat for RecordingStat {
    fn count(&self, stat: &str, count: f64, tags: &[&str]) {
        self.record(StatEvent::count(stat, count, tags));
    }

    fn gauge(&self, stat: &str, value: f64, tags: &[&str]) {
        self.record(StatEvent::gauge(stat, value, tags));
    }

    fn histogram(&self, stat: &str, value: f64, tags: &[&str]) {
        self.record(StatEvent::histogram(stat, value, tags));
    }

    fn timing(&self, stat: &str, duration: Duration, tags: &[&str]) {
        self.record(StatEvent::timing(stat, duration, tags));
    }

    fn add_tags(&self, tags: &[&str]) {
        let mut inner = self.inner.lock().unwrap();
        inner.tags.extend(tags.iter().map(|t| t.to_string()));
        inner.events.push(StatEvent::AddTags(owned_tags(tags)));
    }

    fn get_tags(&self) -> Vec<String> {
        self.inner.lock().unwrap().tags.clone()
    }
}
