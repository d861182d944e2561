// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

#![deny(missing_docs)]
#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod aggregator;
mod component;
pub mod context;
mod duration;
mod error;
mod source;
mod stats;

pub use aggregator::{
    CountAggregatorComponent, CountAggregatorConfig, DEFAULT_AGGREGATION_INTERVAL,
};
pub use component::{Component, load};
pub use error::{Error, ParseError};
pub use source::Source;
pub use stats::{
    DatadogComponent, DatadogConfig, NullComponent, NullConfig, OUTPUT_DATADOG, OUTPUT_NULL,
    StatsComponent, StatsConfig,
};
pub use stattally_aggregation::CountAggregator;
pub use stattally_core::{BoxStat, NullStat, Stat};

/// Build the stat client selected by the `stats` section of `source`.
pub fn new(source: &Source) -> Result<BoxStat, Error> {
    load(source, &StatsComponent::default())
}
