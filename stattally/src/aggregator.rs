// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use std::time::Duration;

use serde::{Deserialize, Serialize};
use stattally_aggregation::CountAggregator;
use stattally_core::BoxStat;
use tokio::runtime::Handle;

use crate::{Component, DatadogComponent, DatadogConfig, Error};

/// Default time counters are held before being sent
pub const DEFAULT_AGGREGATION_INTERVAL: Duration = Duration::from_secs(10);

/// Options for a [`CountAggregator`] in front of a DogStatsD client
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountAggregatorConfig {
    /// How long counters are summed before being sent
    #[serde(rename = "flushinterval", with = "crate::duration")]
    pub flush_interval: Duration,
    /// The wrapped client
    #[serde(rename = "statconfig")]
    pub stat_config: DatadogConfig,
}

/// Builds a DogStatsD client that aggregates counters.
///
/// Must be built within a tokio runtime, which runs the flush tasks.
#[derive(Clone, Copy, Debug, Default)]
pub struct CountAggregatorComponent {
    /// Builds the wrapped client
    pub stat_component: DatadogComponent,
}

impl Component for CountAggregatorComponent {
    const NAME: &'static str = "statcountaggregator";
    type Config = CountAggregatorConfig;
    type Output = CountAggregator<BoxStat>;

    fn settings(&self) -> CountAggregatorConfig {
        CountAggregatorConfig {
            flush_interval: DEFAULT_AGGREGATION_INTERVAL,
            stat_config: self.stat_component.settings(),
        }
    }

    fn build(&self, config: CountAggregatorConfig) -> Result<CountAggregator<BoxStat>, Error> {
        let runtime = Handle::try_current()?;
        let stat = self.stat_component.build(config.stat_config)?;
        tracing::debug!(flush_interval = ?config.flush_interval, "built count aggregator");
        Ok(CountAggregator::with_handle(
            stat,
            config.flush_interval,
            runtime,
        ))
    }
}
