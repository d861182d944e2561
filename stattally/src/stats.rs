// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use std::time::Duration;

use serde::{Deserialize, Serialize};
use stattally_core::{BoxStat, NullStat};
use stattally_dogstatsd::{
    DEFAULT_ADDRESS, DEFAULT_FLUSH_INTERVAL, DEFAULT_MAX_PACKET_SIZE, DogStatsd, DogStatsdConfig,
};

use crate::{Component, Error};

/// `stats.output` selecting [`NullComponent`]
pub const OUTPUT_NULL: &str = "NULL";
/// `stats.output` selecting [`DatadogComponent`]
pub const OUTPUT_DATADOG: &str = "DATADOG";

/// The null client has no options
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NullConfig {}

/// Builds a client that drops every stat
#[derive(Clone, Copy, Debug, Default)]
pub struct NullComponent;

impl Component for NullComponent {
    const NAME: &'static str = "nullstat";
    type Config = NullConfig;
    type Output = BoxStat;

    fn settings(&self) -> NullConfig {
        NullConfig {}
    }

    fn build(&self, _config: NullConfig) -> Result<BoxStat, Error> {
        Ok(BoxStat::new(NullStat::default()))
    }
}

/// Options for a DogStatsD client
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatadogConfig {
    /// Agent address, `host:port`
    pub address: String,
    /// How often partially filled packets are sent
    #[serde(rename = "flushinterval", with = "crate::duration")]
    pub flush_interval: Duration,
    /// Tags attached to every stat
    pub tags: Vec<String>,
    /// Largest packet to send, in bytes
    #[serde(rename = "packetsize")]
    pub packet_size: usize,
}

/// Builds a [`DogStatsd`] client
#[derive(Clone, Copy, Debug, Default)]
pub struct DatadogComponent;

impl Component for DatadogComponent {
    const NAME: &'static str = "datadog";
    type Config = DatadogConfig;
    type Output = BoxStat;

    fn settings(&self) -> DatadogConfig {
        DatadogConfig {
            address: DEFAULT_ADDRESS.to_string(),
            flush_interval: DEFAULT_FLUSH_INTERVAL,
            tags: vec![],
            packet_size: DEFAULT_MAX_PACKET_SIZE,
        }
    }

    fn build(&self, config: DatadogConfig) -> Result<BoxStat, Error> {
        let client = DogStatsd::connect(DogStatsdConfig {
            address: config.address,
            flush_interval: config.flush_interval,
            tags: config.tags,
            max_packet_size: config.packet_size,
        })?;
        Ok(BoxStat::new(client))
    }
}

/// Selects and configures the stat client
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsConfig {
    /// [`OUTPUT_NULL`] or [`OUTPUT_DATADOG`], in any case
    pub output: String,
    /// Used when `output` is [`OUTPUT_NULL`]
    pub nullstat: NullConfig,
    /// Used when `output` is [`OUTPUT_DATADOG`]
    pub datadog: DatadogConfig,
}

/// Builds the client named by [`StatsConfig::output`]
#[derive(Clone, Copy, Debug, Default)]
pub struct StatsComponent {
    /// Builds the null client
    pub null: NullComponent,
    /// Builds the DogStatsD client
    pub datadog: DatadogComponent,
}

impl Component for StatsComponent {
    const NAME: &'static str = "stats";
    type Config = StatsConfig;
    type Output = BoxStat;

    fn settings(&self) -> StatsConfig {
        StatsConfig {
            output: OUTPUT_NULL.to_string(),
            nullstat: self.null.settings(),
            datadog: self.datadog.settings(),
        }
    }

    fn build(&self, config: StatsConfig) -> Result<BoxStat, Error> {
        let output = config.output.trim();
        let stat = if output.eq_ignore_ascii_case(OUTPUT_NULL) {
            self.null.build(config.nullstat)?
        } else if output.eq_ignore_ascii_case(OUTPUT_DATADOG) {
            self.datadog.build(config.datadog)?
        } else {
            return Err(Error::UnknownOutput(config.output));
        };
        tracing::debug!(output, "built stats client");
        Ok(stat)
    }
}
