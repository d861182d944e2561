// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use serde::{Serialize, de::DeserializeOwned};

use crate::{Error, Source};

/// Something that can be built from one section of a [`Source`].
pub trait Component {
    /// Name of the section holding this component's configuration
    const NAME: &'static str;

    /// Configuration for [`Component::build`].
    ///
    /// Field names must be lowercase without underscores to match [`Source`] keys.
    type Config: Serialize + DeserializeOwned;

    /// What [`Component::build`] produces
    type Output;

    /// The configuration used when the source doesn't say otherwise
    fn settings(&self) -> Self::Config;

    /// Build the output from a complete configuration
    fn build(&self, config: Self::Config) -> Result<Self::Output, Error>;
}

/// Read `component`'s section from `source`, fill the gaps from its defaults, and build it.
pub fn load<C: Component>(source: &Source, component: &C) -> Result<C::Output, Error> {
    let config = source.resolve(C::NAME, component.settings())?;
    component.build(config)
}
