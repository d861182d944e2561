// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Aggregation keys
//!
//! A counter is aggregated per `(metric name, tag set)`. The tag set is unordered, so it is
//! canonicalized into a [`TagSignature`]: the tags are sorted, then each one is written as
//! `<byte length>:<tag>`. The length prefix keeps the encoding unambiguous whatever characters
//! the tags contain, and lets the original tags be read back without any escaping.

use std::hash::{Hash, Hasher};

use hashbrown::Equivalent;
use stattally_core::tags::{TagRefs, tag_refs};

/// Canonical encoding of an unordered tag set.
///
/// Two tag lists that are permutations of each other produce equal signatures. Duplicate tags are
/// kept.
///
/// ```
/// use stattally_aggregation::key::TagSignature;
///
/// let signature = TagSignature::new(&["b:2", "a:1"]);
/// assert_eq!(signature, TagSignature::new(&["a:1", "b:2"]));
/// assert_eq!(signature.tags().collect::<Vec<_>>(), ["a:1", "b:2"]);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TagSignature(String);

impl TagSignature {
    /// Encode `tags`.
    pub fn new<S: AsRef<str>>(tags: &[S]) -> Self {
        let mut sorted = tag_refs(tags);
        sorted.sort_unstable();

        // 3 bytes covers the length prefix and separator of tags shorter than 100 bytes
        let mut encoded = String::with_capacity(sorted.iter().map(|t| t.len() + 3).sum());
        let mut len_buf = itoa::Buffer::new();
        for tag in sorted {
            encoded.push_str(len_buf.format(tag.len()));
            encoded.push(':');
            encoded.push_str(tag);
        }
        Self(encoded)
    }

    /// True if this is the signature of an empty tag set
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The encoded form
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Decode the tags, in sorted order.
    pub fn tags(&self) -> Tags<'_> {
        Tags { rest: &self.0 }
    }
}

/// Iterator over the tags of a [`TagSignature`], see [`TagSignature::tags`].
#[derive(Clone, Debug)]
pub struct Tags<'a> {
    rest: &'a str,
}

impl<'a> Iterator for Tags<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        // only `TagSignature::new` builds signatures, so the encoding is well formed
        let (len, rest) = self.rest.split_once(':')?;
        let len: usize = len.parse().ok()?;
        let tag = rest.get(..len)?;
        self.rest = &rest[len..];
        Some(tag)
    }
}

/// Identifies one aggregation bucket.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct CompositeKey {
    metric_name: String,
    tag_signature: TagSignature,
}

impl CompositeKey {
    /// Build the key of the counter `metric_name` with tags `tags`.
    pub fn new<S: AsRef<str>>(metric_name: impl Into<String>, tags: &[S]) -> Self {
        Self {
            metric_name: metric_name.into(),
            tag_signature: TagSignature::new(tags),
        }
    }

    /// Name of the counter
    pub fn metric_name(&self) -> &str {
        &self.metric_name
    }

    /// Canonical tag set
    pub fn tag_signature(&self) -> &TagSignature {
        &self.tag_signature
    }

    /// The tags of this key, sorted.
    pub fn tags(&self) -> TagRefs<'_> {
        self.tag_signature.tags().collect()
    }
}

// Hash must agree with `KeyRef` so the bucket can be probed without allocating the metric name
impl Hash for CompositeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.metric_name.as_str().hash(state);
        self.tag_signature.as_str().hash(state);
    }
}

/// Borrowed form of a [`CompositeKey`], used to look up existing buckets.
#[derive(Clone, Copy, Debug)]
pub(crate) struct KeyRef<'a> {
    pub(crate) metric_name: &'a str,
    pub(crate) tag_signature: &'a TagSignature,
}

impl Hash for KeyRef<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.metric_name.hash(state);
        self.tag_signature.as_str().hash(state);
    }
}

impl Equivalent<CompositeKey> for KeyRef<'_> {
    fn equivalent(&self, key: &CompositeKey) -> bool {
        self.metric_name == key.metric_name && *self.tag_signature == key.tag_signature
    }
}

impl KeyRef<'_> {
    pub(crate) fn to_owned_key(self) -> CompositeKey {
        CompositeKey {
            metric_name: self.metric_name.to_string(),
            tag_signature: self.tag_signature.clone(),
        }
    }
}
