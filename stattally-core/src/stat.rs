// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Contains the [`Stat`] trait, the interface through which metric events
//! reach a telemetry backend.

use std::{fmt::Debug, sync::Arc, time::Duration};

/// A stat client.
///
/// Implementations either write events to some backend (a UDP socket, nothing at all) or decorate
/// another `Stat`, for example by aggregating counters before forwarding them.
///
/// None of the methods return errors. A `Stat` must never block for long and must never panic:
/// backends are expected to deal with their own failures, and to report them through `tracing`
/// rather than to the caller.
pub trait Stat {
    /// Increment the counter `stat` by `count`.
    fn count(&self, stat: &str, count: f64, tags: &[&str]);

    /// Set the gauge `stat` to `value`.
    fn gauge(&self, stat: &str, value: f64, tags: &[&str]);

    /// Record `value` in the histogram `stat`.
    fn histogram(&self, stat: &str, value: f64, tags: &[&str]);

    /// Record a duration for the timer `stat`.
    fn timing(&self, stat: &str, duration: Duration, tags: &[&str]);

    /// Add tags that are attached to every event written through this client.
    fn add_tags(&self, tags: &[&str]);

    /// Returns the tags added with [`Stat::add_tags`].
    fn get_tags(&self) -> Vec<String>;

    /// Returns a [`BoxStat`] that is a type-erased version of this stat client
    fn boxed(self) -> BoxStat
    where
        Self: Sized + Send + Sync + 'static,
    {
        BoxStat::new(self)
    }
}

macro_rules! forward_stat {
    ($($ty:ty),*) => {$(
        impl<T: Stat + ?Sized> Stat for $ty {
            fn count(&self, stat: &str, count: f64, tags: &[&str]) {
                (**self).count(stat, count, tags)
            }

            fn gauge(&self, stat: &str, value: f64, tags: &[&str]) {
                (**self).gauge(stat, value, tags)
            }

            fn histogram(&self, stat: &str, value: f64, tags: &[&str]) {
                (**self).histogram(stat, value, tags)
            }

            fn timing(&self, stat: &str, duration: Duration, tags: &[&str]) {
                (**self).timing(stat, duration, tags)
            }

            fn add_tags(&self, tags: &[&str]) {
                (**self).add_tags(tags)
            }

            fn get_tags(&self) -> Vec<String> {
                (**self).get_tags()
            }
        }
    )*};
}

forward_stat!(&T, Box<T>, Arc<T>);

/// A type-erased [`Stat`].
///
/// Cloning a `BoxStat` is cheap, and all clones write to the same client.
#[derive(Clone)]
pub struct BoxStat(Arc<dyn Stat + Send + Sync + 'static>);

impl Debug for BoxStat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("BoxStat").finish()
    }
}

impl BoxStat {
    /// Create a new [BoxStat]
    pub fn new(stat: impl Stat + Send + Sync + 'static) -> Self {
        Self(Arc::new(stat))
    }
}

impl Stat for BoxStat {
    fn count(&self, stat: &str, count: f64, tags: &[&str]) {
        self.0.count(stat, count, tags)
    }

    fn gauge(&self, stat: &str, value: f64, tags: &[&str]) {
        self.0.gauge(stat, value, tags)
    }

    fn histogram(&self, stat: &str, value: f64, tags: &[&str]) {
        self.0.histogram(stat, value, tags)
    }

    fn timing(&self, stat: &str, duration: Duration, tags: &[&str]) {
        self.0.timing(stat, duration, tags)
    }

    fn add_tags(&self, tags: &[&str]) {
        self.0.add_tags(tags)
    }

    fn get_tags(&self) -> Vec<String> {
        self.0.get_tags()
    }

    // already boxed, don't wrap a second time
    fn boxed(self) -> BoxStat {
        self
    }
}
