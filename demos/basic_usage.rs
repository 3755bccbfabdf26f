//! Zonehouse API walkthrough
//!
//! Inserts a batch of rows, then runs keyed updates, queries and deletes
//! while printing what the zone maps managed to skip.

use zonehouse::{row, Config, DataWarehouse, Value, Warehouse};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let dir = std::env::temp_dir().join("zonehouse_demo");
    let config = Config::new(1000, &dir).with_identifier_columns(["id"]);
    let mut wh = Warehouse::open(config)?;
    println!(
        "Warehouse at {} ({} rows per partition)",
        wh.config().storage_path.display(),
        wh.config().partition_size
    );

    println!("Inserting 10,000 rows...");
    for i in 1..=10_000 {
        wh.add_data(row! {
            "id" => i.to_string(),
            "name" => format!("user-{}", i),
            "email" => format!("user{}@example.com", i),
        })?;
    }

    let patched = wh.update_data("id", &Value::from("4242"), &row! { "name" => "Updated-4242" })?;
    println!("Updated {} row(s)", patched);

    let keys: Vec<Value> = ["9", "10", "4242", "20000"].iter().map(|k| Value::from(*k)).collect();
    let rows = wh.query_data("id", &keys)?;
    println!("Query for {:?} returned {} row(s)", keys, rows.len());
    for row in &rows {
        println!("  {}", zonehouse::core::types::row_to_json(row));
    }

    let removed = wh.delete_data("id", &Value::from("10"))?;
    println!("Deleted {} row(s)", removed);

    let stats = wh.stats();
    println!("\n{}", serde_json::to_string_pretty(&stats)?);
    println!("Prune ratio: {:.1}%", stats.prune_ratio() * 100.0);

    wh.close()?;
    Ok(())
}
