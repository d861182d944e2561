// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

#![doc = include_str!("../README.md")]
#![deny(missing_docs)]

mod client;
mod line;
mod rate_limit;

pub use client::{
    DEFAULT_ADDRESS, DEFAULT_FLUSH_INTERVAL, DEFAULT_MAX_PACKET_SIZE, DogStatsd, DogStatsdConfig,
};
