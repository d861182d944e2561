// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use std::{
    io,
    sync::Mutex,
    time::{Duration, Instant},
};

/// Decides which send errors get logged.
///
/// Each [`io::ErrorKind`] is reported at most once per interval, so an unreachable agent and a
/// full socket buffer each show up without one log line per datagram. Errors in between are
/// counted and the count is handed out with the next report of the same kind.
#[derive(Debug)]
pub(crate) struct SendErrorLimiter {
    interval: Duration,
    kinds: Mutex<Vec<KindState>>,
}

#[derive(Debug)]
struct KindState {
    kind: io::ErrorKind,
    last_report: Instant,
    suppressed: u64,
}

impl SendErrorLimiter {
    pub(crate) fn new(interval: Duration) -> Self {
        Self {
            interval,
            kinds: Mutex::new(vec![]),
        }
    }

    /// Record an error of `kind` seen at `now`.
    ///
    /// Returns `Some(suppressed)` if it should be reported, where `suppressed` is the number of
    /// errors of that kind dropped since the previous report.
    pub(crate) fn record(&self, kind: io::ErrorKind, now: Instant) -> Option<u64> {
        let mut kinds = self.kinds.lock().unwrap();
        let Some(index) = kinds.iter().position(|state| state.kind == kind) else {
            kinds.push(KindState {
                kind,
                last_report: now,
                suppressed: 0,
            });
            return Some(0);
        };

        let state = &mut kinds[index];
        if now.saturating_duration_since(state.last_report) >= self.interval {
            state.last_report = now;
            Some(std::mem::take(&mut state.suppressed))
        } else {
            state.suppressed += 1;
            None
        }
    }
}
