// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Running sums of counter increments

use std::sync::Mutex;

use crate::key::{CompositeKey, KeyRef, TagSignature};

type Bucket = hashbrown::HashMap<CompositeKey, f64>;

/// Sums counter increments per [`CompositeKey`].
///
/// All access goes through one mutex. [`Accumulator::drain_and_clear`] swaps the whole bucket out
/// under that lock, so every increment lands in exactly one generation.
#[derive(Debug, Default)]
pub struct Accumulator {
    bucket: Mutex<Bucket>,
}

impl Accumulator {
    /// Create an empty accumulator
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `delta` to the sum of `metric_name` with `tags`.
    ///
    /// Values are not validated: a NaN or infinite `delta` poisons the sum of its key until the
    /// next drain.
    pub fn insert<S: AsRef<str>>(&self, metric_name: &str, delta: f64, tags: &[S]) {
        // encode before taking the lock
        let tag_signature = TagSignature::new(tags);
        let key = KeyRef {
            metric_name,
            tag_signature: &tag_signature,
        };

        let mut bucket = self.bucket.lock().unwrap();
        match bucket.get_mut(&key) {
            Some(sum) => *sum += delta,
            None => {
                bucket.insert(key.to_owned_key(), delta);
            }
        }
    }

    /// Take every pending sum, leaving the accumulator empty.
    pub fn drain_and_clear(&self) -> Generation {
        let mut bucket = self.bucket.lock().unwrap();
        // the next generation usually sees the same keys
        let capacity = bucket.len();
        let sums = std::mem::replace(&mut *bucket, Bucket::with_capacity(capacity));
        Generation {
            sums: sums.into_iter(),
        }
    }

    /// Number of keys with a pending sum
    pub fn len(&self) -> usize {
        self.bucket.lock().unwrap().len()
    }

    /// True if nothing is pending
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The sums captured by one [`Accumulator::drain_and_clear`].
///
/// Yields each key with its sum, in no particular order.
#[derive(Debug)]
pub struct Generation {
    sums: hashbrown::hash_map::IntoIter<CompositeKey, f64>,
}

impl Iterator for Generation {
    type Item = (CompositeKey, f64);

    fn next(&mut self) -> Option<Self::Item> {
        self.sums.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.sums.size_hint()
    }
}

impl ExactSizeIterator for Generation {}
