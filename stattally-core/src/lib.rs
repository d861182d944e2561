// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

#![doc = include_str!("../README.md")]
#![deny(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub use crate::null::NullStat;
pub use crate::stat::{BoxStat, Stat};

mod null;
pub mod stat;
pub mod tags;

/// Utilities for asserting on the stats an application emits.
///
/// This requires that the `test-util` feature be enabled.
#[cfg(feature = "test-util")]
pub mod test_util;
