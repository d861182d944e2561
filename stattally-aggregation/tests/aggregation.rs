//! End to end behaviour of the counter aggregator, driven with tokio's paused clock

use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    thread,
    time::Duration,
};

use assert2::check;
use rand::{SeedableRng, seq::SliceRandom};
use rand_chacha::ChaCha8Rng;
use rstest::rstest;
use stattally_aggregation::{CountAggregator, FlushStart};
use stattally_core::{
    Stat,
    test_util::{RecordingStat, StatEvent},
};

const INTERVAL: Duration = Duration::from_millis(100);

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn count(stat: &str, value: f64, tags: &[&str]) -> (String, f64, Vec<String>) {
    (
        stat.to_string(),
        value,
        tags.iter().map(|t| t.to_string()).collect(),
    )
}

/// Sleeps just past one flush interval
async fn wait_for_flush() {
    tokio::time::sleep(INTERVAL + Duration::from_millis(1)).await;
}

#[tokio::test(start_paused = true)]
async fn simple_aggregation() {
    init_tracing();
    let recorder = RecordingStat::default();
    let stat = CountAggregator::new(recorder.clone(), INTERVAL);

    let (a, b) = (stat.clone(), stat.clone());
    let first = tokio::spawn(async move { a.count("stat1", 9.0, &["tag1"]) });
    let second = tokio::spawn(async move { b.count("stat1", 6.0, &["tag1"]) });
    first.await.unwrap();
    second.await.unwrap();

    check!(recorder.counts().is_empty());
    wait_for_flush().await;
    check!(recorder.counts() == vec![count("stat1", 15.0, &["tag1"])]);
}

#[tokio::test(start_paused = true)]
async fn tag_ordering_aggregation() {
    let recorder = RecordingStat::default();
    let stat = CountAggregator::new(recorder.clone(), INTERVAL);

    stat.count("stat1", 9.0, &["aTag", "bTag"]);
    stat.count("stat1", 1.0, &["bTag", "aTag"]);

    wait_for_flush().await;
    check!(recorder.counts() == vec![count("stat1", 10.0, &["aTag", "bTag"])]);
}

#[tokio::test(start_paused = true)]
async fn complex_stat_aggregation() {
    let recorder = RecordingStat::default();
    let stat = CountAggregator::new(recorder.clone(), INTERVAL);

    stat.count("stat1", 9.0, &["tag1"]);
    stat.count("stat2", 3.0, &["tag2"]);
    stat.count("stat1", 6.0, &["tag1"]);
    stat.count("stat2", 1.0, &["tag2"]);

    wait_for_flush().await;
    check!(
        recorder.counts()
            == vec![
                count("stat1", 15.0, &["tag1"]),
                count("stat2", 4.0, &["tag2"]),
            ]
    );
}

#[tokio::test(start_paused = true)]
async fn bursts_in_separate_intervals_flush_separately() {
    let recorder = RecordingStat::default();
    let stat = CountAggregator::new(recorder.clone(), INTERVAL);

    stat.count("stat1", 9.0, &["tag1"]);
    stat.count("stat2", 3.0, &["tag2"]);
    stat.count("stat1", 6.0, &["tag1"]);
    stat.count("stat2", 1.0, &["tag2"]);
    wait_for_flush().await;
    let mut first = recorder.drain();
    first.sort_by(|a, b| format!("{a:?}").cmp(&format!("{b:?}")));
    check!(
        first
            == vec![
                StatEvent::count("stat1", 15.0, &["tag1"]),
                StatEvent::count("stat2", 4.0, &["tag2"]),
            ]
    );

    stat.count("stat1", 1.0, &["tag1"]);
    stat.count("stat2", 1.0, &["tag2"]);
    stat.count("stat1", 1.0, &["tag1"]);
    stat.count("stat2", 1.0, &["tag2"]);
    wait_for_flush().await;
    check!(
        recorder.counts()
            == vec![
                count("stat1", 2.0, &["tag1"]),
                count("stat2", 2.0, &["tag2"]),
            ]
    );
}

#[rstest]
#[case::different_names("stat1", &["tag1"], "stat2", &["tag1"])]
#[case::different_tags("stat1", &["tag1"], "stat1", &["tag2"])]
#[case::extra_tag("stat1", &["tag1"], "stat1", &["tag1", "tag2"])]
#[case::no_tags("stat1", &[], "stat1", &["tag1"])]
#[case::space_in_tag("stat1", &["a b"], "stat1", &["a", "b"])]
#[tokio::test(start_paused = true)]
async fn distinct_keys_never_combine(
    #[case] first_name: &str,
    #[case] first_tags: &[&str],
    #[case] second_name: &str,
    #[case] second_tags: &[&str],
) {
    let recorder = RecordingStat::default();
    let stat = CountAggregator::new(recorder.clone(), INTERVAL);

    stat.count(first_name, 1.0, first_tags);
    stat.count(second_name, 2.0, second_tags);
    stat.count(first_name, 1.0, first_tags);

    wait_for_flush().await;
    let mut expected = vec![
        count(first_name, 2.0, first_tags),
        count(second_name, 2.0, second_tags),
    ];
    expected.sort_by(|a, b| (&a.0, &a.2).cmp(&(&b.0, &b.2)));
    check!(recorder.counts() == expected);
}

#[tokio::test(start_paused = true)]
async fn untagged_counters_are_emitted_without_tags() {
    let recorder = RecordingStat::default();
    let stat = CountAggregator::new(recorder.clone(), INTERVAL);
    stat.count("bare", 1.0, &[]);
    stat.count("bare", 1.0, &[]);

    wait_for_flush().await;
    check!(recorder.events() == vec![StatEvent::count("bare", 2.0, &[])]);
}

#[tokio::test(start_paused = true)]
async fn tag_order_never_matters() {
    let recorder = RecordingStat::default();
    let stat = CountAggregator::new(recorder.clone(), INTERVAL);
    let mut rng = ChaCha8Rng::seed_from_u64(0x5747);

    let mut expected = 0.0;
    for i in 0..64 {
        let mut tags = ["service:api", "env:prod", "region:eu-west-1", "az:b", "version:1.2"];
        tags.shuffle(&mut rng);
        stat.count("requests", f64::from(i), &tags);
        expected += f64::from(i);
    }

    wait_for_flush().await;
    check!(
        recorder.counts()
            == vec![count(
                "requests",
                expected,
                &["az:b", "env:prod", "region:eu-west-1", "service:api", "version:1.2"],
            )]
    );
}

#[tokio::test(start_paused = true)]
async fn one_flush_per_interval_under_contention() {
    let recorder = RecordingStat::default();
    let stat = CountAggregator::new(recorder.clone(), INTERVAL);
    let started = AtomicUsize::new(0);

    thread::scope(|s| {
        for _ in 0..8 {
            s.spawn(|| {
                for _ in 0..100 {
                    if stat.try_start_flush() == FlushStart::Started {
                        started.fetch_add(1, Ordering::Relaxed);
                    }
                }
            });
        }
    });
    check!(started.load(Ordering::Relaxed) == 1);
    check!(stat.is_flush_scheduled());

    // counters written while that flush is pending all fold into it
    thread::scope(|s| {
        for _ in 0..8 {
            s.spawn(|| {
                for _ in 0..100 {
                    stat.count("hits", 1.0, &["a"]);
                }
            });
        }
    });

    wait_for_flush().await;
    check!(recorder.events() == vec![StatEvent::count("hits", 800.0, &["a"])]);
    check!(!stat.is_flush_scheduled());
}

#[tokio::test(start_paused = true)]
async fn counts_from_outside_the_runtime() {
    let recorder = RecordingStat::default();
    let stat = CountAggregator::new(recorder.clone(), INTERVAL);

    let remote = stat.clone();
    thread::spawn(move || remote.count("remote", 3.0, &["t"]))
        .join()
        .unwrap();

    wait_for_flush().await;
    check!(recorder.counts() == vec![count("remote", 3.0, &["t"])]);
}

/// Runs a callback the first time `count` is called, before recording it
#[derive(Clone, Default)]
struct HookStat {
    recorder: RecordingStat,
    on_first_count: Arc<Mutex<Option<Box<dyn FnOnce() + Send>>>>,
}

impl Stat for HookStat {
    fn count(&self, stat: &str, count: f64, tags: &[&str]) {
        let hook = self.on_first_count.lock().unwrap().take();
        if let Some(hook) = hook {
            hook();
        }
        self.recorder.count(stat, count, tags)
    }

    fn gauge(&self, stat: &str, value: f64, tags: &[&str]) {
        self.recorder.gauge(stat, value, tags)
    }

    fn histogram(&self, stat: &str, value: f64, tags: &[&str]) {
        self.recorder.histogram(stat, value, tags)
    }

    fn timing(&self, stat: &str, duration: Duration, tags: &[&str]) {
        self.recorder.timing(stat, duration, tags)
    }

    fn add_tags(&self, tags: &[&str]) {
        self.recorder.add_tags(tags)
    }

    fn get_tags(&self) -> Vec<String> {
        self.recorder.get_tags()
    }
}

#[tokio::test(start_paused = true)]
async fn counts_during_emission_go_to_the_next_generation() {
    init_tracing();
    let sink = HookStat::default();
    let stat = CountAggregator::new(sink.clone(), INTERVAL);

    let during_emission = stat.clone();
    *sink.on_first_count.lock().unwrap() = Some(Box::new(move || {
        during_emission.count("stat1", 5.0, &["tag1"]);
    }));

    stat.count("stat1", 9.0, &["tag1"]);
    wait_for_flush().await;
    check!(sink.recorder.drain() == vec![StatEvent::count("stat1", 9.0, &["tag1"])]);
    check!(stat.pending() == 1);

    // no further count: the flush task re-arms itself for the leftovers
    wait_for_flush().await;
    check!(sink.recorder.drain() == vec![StatEvent::count("stat1", 5.0, &["tag1"])]);
    check!(stat.pending() == 0);
    check!(!stat.is_flush_scheduled());
}

#[tokio::test(start_paused = true)]
async fn pass_through_is_immediate_and_unchanged() {
    let recorder = RecordingStat::default();
    let stat = CountAggregator::new(recorder.clone(), INTERVAL);

    stat.gauge("stat", 1.0, &["tag"]);
    stat.histogram("stat", 1.0, &["tag"]);
    stat.timing("stat", Duration::from_millis(1), &["tag"]);
    stat.add_tags(&["tag1", "tag2"]);

    check!(
        recorder.events()
            == vec![
                StatEvent::gauge("stat", 1.0, &["tag"]),
                StatEvent::histogram("stat", 1.0, &["tag"]),
                StatEvent::timing("stat", Duration::from_millis(1), &["tag"]),
                StatEvent::AddTags(vec!["tag1".to_string(), "tag2".to_string()]),
            ]
    );
    check!(stat.get_tags() == ["tag1", "tag2"]);
    check!(!stat.is_flush_scheduled());
}

#[tokio::test(start_paused = true)]
async fn aggregators_do_not_share_state() {
    let (left_sink, right_sink) = (RecordingStat::default(), RecordingStat::default());
    let left = CountAggregator::new(left_sink.clone(), INTERVAL);
    let right = CountAggregator::new(right_sink.clone(), INTERVAL * 3);

    left.count("stat1", 1.0, &[]);
    right.count("stat1", 2.0, &[]);
    check!(left.is_flush_scheduled());
    check!(right.is_flush_scheduled());

    wait_for_flush().await;
    check!(left_sink.counts() == vec![count("stat1", 1.0, &[])]);
    check!(right_sink.counts().is_empty());

    tokio::time::sleep(INTERVAL * 2).await;
    check!(right_sink.counts() == vec![count("stat1", 2.0, &[])]);
}
