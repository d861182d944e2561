//! Sends aggregated counters to a DogStatsD agent.
//!
//! ```text
//! RUST_LOG=debug cargo run -p stattally --example aggregate -- 127.0.0.1:8125
//! ```

use std::time::Duration;

use stattally::{CountAggregatorComponent, Source, Stat};

#[tokio::main]
async fn main() -> Result<(), stattally::Error> {
    tracing_subscriber::fmt::init();

    let address = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "127.0.0.1:8125".to_string());
    let source = Source::from_toml_str(&format!(
        r#"
        [statcountaggregator]
        flush_interval = "1s"

        [statcountaggregator.stat_config]
        address = "{address}"
        flush_interval = "1s"
        tags = ["example:aggregate"]
        "#
    ))?;
    let stat = stattally::load(&source, &CountAggregatorComponent::default())?;

    let workers: Vec<_> = (0..4)
        .map(|worker| {
            let stat = stat.clone();
            tokio::spawn(async move {
                let worker = format!("worker:{worker}");
                for _ in 0..1000 {
                    stat.count("example.requests", 1.0, &[&worker, "status:ok"]);
                    tokio::time::sleep(Duration::from_millis(1)).await;
                }
            })
        })
        .collect();
    for worker in workers {
        worker.await.expect("worker panicked");
    }

    // one combined counter per worker and second instead of 4000 lines
    let sent = stat.flush_now();
    tracing::info!(sent, "flushed remaining counters");
    // the client sends its partial packet when the last handle goes away
    drop(stat);
    Ok(())
}
