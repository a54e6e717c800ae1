//! CLI `feed` command: stream feed entries to the terminal through the pacer.

use anyhow::Result;

use crate::config::LaneConfig;
use crate::feed::{DeliveryPacer, DisplayItem};

/// Print `total` feed entries, delivered in paced batches.
pub async fn feed(config: &LaneConfig, total: usize, json: bool) -> Result<()> {
    let mut orchestrator = super::open_orchestrator(config)?;
    let pacer = DeliveryPacer::new(config.pacing.clone());

    let mut shown = 0usize;
    let loaded = pacer
        .load_more_smoothly(
            0,
            total,
            |batch: Vec<DisplayItem>| {
                for entry in batch {
                    shown += 1;
                    if json {
                        match serde_json::to_string(&entry) {
                            Ok(line) => println!("{line}"),
                            Err(e) => tracing::warn!(error = %e, "failed to serialize entry"),
                        }
                    } else {
                        print_entry(shown, &entry);
                    }
                }
            },
            &mut orchestrator,
        )
        .await?;

    if loaded == 0 {
        println!("No items in the catalog. Use `memlane import <file>` to add some.");
    } else if !json {
        println!();
        println!("{loaded} entries");
    }

    Ok(())
}

fn print_entry(position: usize, entry: &DisplayItem) {
    let item = &entry.item;
    let brand = item.brand_name().map(|b| format!(" ({b})")).unwrap_or_default();
    println!(
        "{position:>4}. {}{brand}  [{}]  score {:.3} / {:.3}",
        item.name, item.category, entry.algorithm_score, entry.display_score
    );
    if let (Some(kind), Some(text)) = (entry.reason_type, entry.reason_text.as_deref()) {
        println!("        {kind}: {text}");
    }
}
