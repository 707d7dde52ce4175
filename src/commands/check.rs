//! Check command implementation.
//!
//! Validates the configuration and tries one fetch from the configured source.

use std::time::Instant;

use climate_board::config::{validate_effective_config, Config};
use climate_board::poller::fetch_metrics;
use climate_board::query::lookup;
use climate_board::source::MetricsSource;

/// Validates configuration and source reachability.
pub async fn command_check(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 climate-board - Check");
    println!("========================");

    let mut all_ok = true;

    println!("\n⚙️  Checking configuration...");
    match validate_effective_config(config) {
        Ok(_) => println!("   ✅ Configuration is valid"),
        Err(e) => {
            println!("   ❌ Configuration invalid: {}", e);
            all_ok = false;
        }
    }

    println!("\n🌐 Checking metrics source...");
    let source = MetricsSource::from_config(config)?;
    let start = Instant::now();
    match fetch_metrics(&source).await {
        Ok(metrics) => {
            println!(
                "   ✅ {} answered in {:.1}ms: {} samples across {} metrics",
                source.describe(),
                start.elapsed().as_secs_f64() * 1000.0,
                metrics.sample_count(),
                metrics.len()
            );

            println!("\n📊 Checking rooms...");
            for room in &config.rooms {
                let found = config
                    .quantities
                    .iter()
                    .filter(|q| {
                        lookup(&metrics, &q.metric, config.sensor_label(), &room.sensor_id)
                            .is_some()
                    })
                    .count();
                if found == 0 {
                    println!(
                        "   ⚠️  {} ({}={}): no samples",
                        room.name,
                        config.sensor_label(),
                        room.sensor_id
                    );
                } else {
                    println!(
                        "   ✅ {} ({}={}): {}/{} quantities",
                        room.name,
                        config.sensor_label(),
                        room.sensor_id,
                        found,
                        config.quantities.len()
                    );
                }
            }

            for q in &config.quantities {
                if metrics.samples(&q.metric).is_none() {
                    println!("   ⚠️  Metric '{}' not present in source", q.metric);
                }
            }
        }
        Err(e) => {
            println!("   ❌ {}: {:#}", source.describe(), e);
            all_ok = false;
        }
    }

    println!("\n📋 Summary:");
    if all_ok {
        println!("   ✅ All checks passed");
        Ok(())
    } else {
        println!("   ❌ Some checks failed - please review the output above");
        std::process::exit(1);
    }
}
