// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use std::{fmt, io};

use tokio::runtime::TryCurrentError;

/// Error building a [`Source`](crate::Source) or a client from one
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// The configuration text could not be read
    Parse(ParseError),
    /// A section did not match the shape of its component's configuration
    Config {
        /// Name of the section
        section: String,
        /// What didn't match
        source: serde_json::Error,
    },
    /// `stats.output` named an output that doesn't exist
    UnknownOutput(String),
    /// The client's socket could not be opened
    Io(io::Error),
    /// The client needs a tokio runtime to flush in the background, and there isn't one
    NoRuntime(TryCurrentError),
}

/// Why configuration text could not be read
#[derive(Debug)]
#[non_exhaustive]
pub enum ParseError {
    /// Invalid TOML
    Toml(toml::de::Error),
    /// Invalid JSON
    Json(serde_json::Error),
    /// The document is valid but its root is not a table of sections
    NotATable,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "invalid configuration: {err}"),
            Self::Config { section, source } => {
                write!(f, "invalid configuration for `{section}`: {source}")
            }
            Self::UnknownOutput(output) => write!(f, "unknown stats output {output}"),
            Self::Io(err) => fmt::Display::fmt(err, f),
            Self::NoRuntime(err) => fmt::Display::fmt(err, f),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            Self::Config { source, .. } => Some(source),
            Self::UnknownOutput(_) => None,
            Self::Io(err) => Some(err),
            Self::NoRuntime(err) => Some(err),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Toml(err) => fmt::Display::fmt(err, f),
            Self::Json(err) => fmt::Display::fmt(err, f),
            Self::NotATable => f.write_str("expected a table of sections at the root"),
        }
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Toml(err) => Some(err),
            Self::Json(err) => Some(err),
            Self::NotATable => None,
        }
    }
}

impl From<ParseError> for Error {
    fn from(value: ParseError) -> Self {
        Self::Parse(value)
    }
}

impl From<io::Error> for Error {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<TryCurrentError> for Error {
    fn from(value: TryCurrentError) -> Self {
        Self::NoRuntime(value)
    }
}
