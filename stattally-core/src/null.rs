// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use std::{sync::Mutex, time::Duration};

use crate::Stat;

/// A [`Stat`] that drops every event.
///
/// Tags added with [`Stat::add_tags`] are kept, so code that reads back its static tags behaves
/// the same with metrics disabled.
#[derive(Debug, Default)]
pub struct NullStat {
    tags: Mutex<Vec<String>>,
}

impl Stat for NullStat {
    fn count(&self, _stat: &str, _count: f64, _tags: &[&str]) {}

    fn gauge(&self, _stat: &str, _value: f64, _tags: &[&str]) {}

    fn histogram(&self, _stat: &str, _value: f64, _tags: &[&str]) {}

    fn timing(&self, _stat: &str, _duration: Duration, _tags: &[&str]) {}

    fn add_tags(&self, tags: &[&str]) {
        self.tags
            .lock()
            .unwrap()
            .extend(tags.iter().map(|t| t.to_string()));
    }

    fn get_tags(&self) -> Vec<String> {
        self.tags.lock().unwrap().clone()
    }
}

#[cfg(test)]
mod test {
    use assert2::check;

    use super::NullStat;
    use crate::Stat;

    #[test]
    fn keeps_tags_and_nothing_else() {
        let stat = NullStat::default();
        stat.count("dropped", 1.0, &["a"]);
        check!(stat.get_tags().is_empty());

        stat.add_tags(&["env:prod", "region:eu"]);
        stat.add_tags(&["az:1"]);
        check!(stat.get_tags() == ["env:prod", "region:eu", "az:1"]);
    }
}
