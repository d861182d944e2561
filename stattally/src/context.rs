// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! The stat client of the current task.
//!
//! Code deep in a call stack can emit stats through [`current`] instead of having a client passed
//! down to it. Outside of a [`scope`], [`current`] hands out a [`NullStat`].
//!
//! ```
//! use stattally::{NullStat, Stat, context};
//!
//! async fn handle_request() {
//!     context::current().count("requests", 1.0, &["route:index"]);
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let stat = NullStat::default().boxed();
//! context::scope(stat, handle_request()).await;
//! # }
//! ```

use std::future::Future;

use stattally_core::{BoxStat, NullStat, Stat};

tokio::task_local! {
    static CURRENT: BoxStat;
}

/// Run `future` with `stat` as the [`current`] client.
pub async fn scope<F: Future>(stat: BoxStat, future: F) -> F::Output {
    CURRENT.scope(stat, future).await
}

/// Run `f` with `stat` as the [`current`] client.
pub fn sync_scope<R>(stat: BoxStat, f: impl FnOnce() -> R) -> R {
    CURRENT.sync_scope(stat, f)
}

/// The client of the innermost enclosing scope, or a [`NullStat`] outside of any.
pub fn current() -> BoxStat {
    CURRENT
        .try_with(BoxStat::clone)
        .unwrap_or_else(|_| NullStat::default().boxed())
}
