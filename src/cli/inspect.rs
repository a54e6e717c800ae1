//! CLI `inspect` command: show how a single item scores.

use anyhow::{bail, Result};

use crate::config::LaneConfig;

/// Print the score breakdown and recovery parameters for one item.
///
/// Uses a fresh session, so display state is always empty here.
pub async fn inspect(config: &LaneConfig, id: &str) -> Result<()> {
    let orchestrator = super::open_orchestrator(config)?;

    let Some(info) = orchestrator.item_debug_info(id).await? else {
        bail!("item not found: {id}");
    };

    let item = &info.item;
    println!("Item: {}", item.id);
    println!("{}", "=".repeat(50));
    println!("  Name:           {}", item.name);
    println!("  Category:       {}", item.category);
    if let Some(brand) = item.brand_name() {
        println!("  Brand:          {brand}");
    }
    if let Some(price) = item.price {
        println!("  Price:          {price:.2}");
    }
    println!("  Added:          {}", item.added_at);
    println!("  Open status:    {}", item.open_status);
    println!("  Status:         {}", item.status);
    if let Some(location) = item.location_name() {
        println!("  Location:       {location}");
    }
    if !item.tags.is_empty() {
        let tags: Vec<&str> = item.tags.iter().map(String::as_str).collect();
        println!("  Tags:           {}", tags.join(", "));
    }
    println!();

    let b = &info.breakdown;
    println!("Scores:");
    println!("  Memory:         {:.3}", b.memory);
    println!("  Insight:        {:.3}", b.insight);
    println!("  Relationship:   {:.3}", b.relationship);
    println!("  Needs:          {:.3}", b.needs);
    println!("  Total:          {:.3}", b.total);
    println!();

    println!("Recovery:");
    println!("  Rate:           {:.2}", info.recovery_rate);
    println!("  Distance:       {}", info.display.required_distance);

    Ok(())
}
