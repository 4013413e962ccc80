//! `bulkpost results` – list results persisted by earlier runs.

use anyhow::Result;
use bulkpost_core::store::ResultDb;

pub async fn run_results(failed_only: bool) -> Result<()> {
    let db = ResultDb::open_default().await?;
    let rows = db.list_results(failed_only).await?;
    if rows.is_empty() {
        println!("No results in database.");
        return Ok(());
    }
    println!("{:<24} {:<10} {:<8} {}", "ITEM", "RESULT", "ATTEMPTS", "DETAIL");
    for r in &rows {
        let detail = r
            .error
            .as_deref()
            .or(r.body.as_deref())
            .unwrap_or("-");
        println!("{:<24} {:<10} {:<8} {}", r.item_id, r.resolution, r.attempts, detail);
    }
    let counts = db.counts().await?;
    println!();
    println!("{} succeeded, {} failed", counts.succeeded, counts.failed);
    Ok(())
}
