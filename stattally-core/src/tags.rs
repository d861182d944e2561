// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Helpers for passing tag lists to a [`Stat`](crate::Stat).
//!
//! Tags are plain strings, conventionally `key:value`. [`Stat`](crate::Stat) methods take them as
//! `&[&str]`; these helpers convert from owned storage without allocating for the common case of
//! a handful of tags.

use smallvec::SmallVec;

/// Number of tags that fit in a [`TagRefs`] without a heap allocation.
pub const INLINE_TAGS: usize = 8;

/// Borrowed view over a list of tags.
pub type TagRefs<'a> = SmallVec<[&'a str; INLINE_TAGS]>;

/// Borrow every tag in `tags`.
///
/// ```
/// use stattally_core::tags::tag_refs;
///
/// let owned = vec!["a:1".to_string(), "b:2".to_string()];
/// assert_eq!(&tag_refs(&owned)[..], &["a:1", "b:2"]);
/// ```
pub fn tag_refs<S: AsRef<str>>(tags: &[S]) -> TagRefs<'_> {
    tags.iter().map(AsRef::as_ref).collect()
}

/// Copy `tags` into owned strings.
pub fn owned_tags(tags: &[&str]) -> Vec<String> {
    tags.iter().map(|t| t.to_string()).collect()
}
