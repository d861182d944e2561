// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

// https://docs.datadoghq.com/developers/dogstatsd/datagram_shell/?tab=metrics

/// DogStatsD metric types this crate writes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum MetricType {
    Count,
    Gauge,
    Histogram,
    Timing,
}

impl MetricType {
    fn as_str(self) -> &'static str {
        match self {
            MetricType::Count => "c",
            MetricType::Gauge => "g",
            MetricType::Histogram => "h",
            MetricType::Timing => "ms",
        }
    }
}

// characters that would end the field they appear in
const NAME_RESERVED: &[char] = &[':', '|', '@', '#', ',', '\n'];
const TAG_RESERVED: &[char] = &['|', '#', ',', '\n'];

/// Append one `name:value|type[|#tags]` line to `buf`.
///
/// `value` must be finite. Reserved characters in names and tags are replaced with `_`.
/// Per-call tags come first, followed by `static_tags`.
pub(crate) fn write_line(
    buf: &mut String,
    name: &str,
    value: f64,
    metric_type: MetricType,
    tags: &[&str],
    static_tags: &[String],
) {
    push_sanitized(buf, name, NAME_RESERVED);
    buf.push(':');
    push_value(buf, value);
    buf.push('|');
    buf.push_str(metric_type.as_str());

    let mut all_tags = tags.iter().copied().chain(static_tags.iter().map(String::as_str));
    if let Some(first) = all_tags.next() {
        buf.push_str("|#");
        push_sanitized(buf, first, TAG_RESERVED);
        for tag in all_tags {
            buf.push(',');
            push_sanitized(buf, tag, TAG_RESERVED);
        }
    }
}

fn push_value(buf: &mut String, value: f64) {
    // integral values read better (and are shorter) without the trailing `.0`
    if value.fract() == 0.0 && value.abs() < 1e15 {
        buf.push_str(itoa::Buffer::new().format(value as i64));
    } else {
        buf.push_str(ryu::Buffer::new().format_finite(value));
    }
}

fn push_sanitized(buf: &mut String, s: &str, reserved: &[char]) {
    if s.contains(reserved) {
        buf.extend(s.chars().map(|c| if reserved.contains(&c) { '_' } else { c }));
    } else {
        buf.push_str(s);
    }
}

#[cfg(test)]
mod test {
    use assert2::check;
    use rstest::rstest;

    use super::{MetricType, write_line};

    #[rstest]
    #[case::count("stat1", 15.0, MetricType::Count, &["tag1"], &[], "stat1:15|c|#tag1")]
    #[case::gauge("queue.depth", 0.25, MetricType::Gauge, &[], &[], "queue.depth:0.25|g")]
    #[case::histogram("size", -3.0, MetricType::Histogram, &["a", "b"], &[], "size:-3|h|#a,b")]
    #[case::timing("latency", 12.5, MetricType::Timing, &[], &["env:prod"], "latency:12.5|ms|#env:prod")]
    #[case::static_tags_last(
        "hits",
        1.0,
        MetricType::Count,
        &["route:index"],
        &["env:prod", "az:b"],
        "hits:1|c|#route:index,env:prod,az:b"
    )]
    #[case::reserved("a:b|c", 1.0, MetricType::Count, &["x,y", "k:v|w"], &[], "a_b_c:1|c|#x_y,k:v_w")]
    #[case::huge("big", 1e20, MetricType::Gauge, &[], &[], "big:1e20|g")]
    fn encodes_line(
        #[case] name: &str,
        #[case] value: f64,
        #[case] metric_type: MetricType,
        #[case] tags: &[&str],
        #[case] static_tags: &[&str],
        #[case] expected: &str,
    ) {
        let static_tags: Vec<String> = static_tags.iter().map(|t| t.to_string()).collect();
        let mut buf = String::new();
        write_line(&mut buf, name, value, metric_type, tags, &static_tags);
        check!(buf == expected);
    }
}
