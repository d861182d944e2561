// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

#![deny(missing_docs)]
#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod accumulator;
pub mod aggregator;
pub mod gate;
pub mod key;

pub use accumulator::Accumulator;
pub use aggregator::{CountAggregator, FlushStart};
pub use gate::FlushGate;
pub use key::{CompositeKey, TagSignature};
