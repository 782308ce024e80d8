use anyhow::Result;
use chrono::NaiveDate;
use opticore_core::report::ReportSummary;
use opticore_services::{ComplaintFilter, ComplaintStore};

pub async fn run(
    sentiments: Vec<String>,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Result<()> {
    let store = ComplaintStore::try_from_env()?;
    let filter = ComplaintFilter {
        sentiments,
        from,
        to,
    };
    let rows = store.fetch(&filter).await?;
    let summary = ReportSummary::from_rows(&rows);

    println!("Total complaints: {}", summary.total);
    if summary.total == 0 {
        return Ok(());
    }

    println!("\nBy sentiment:");
    for (sentiment, count) in &summary.by_sentiment {
        println!("  {sentiment}: {count}");
    }

    println!("\nBy category:");
    for (category, sentiments) in &summary.by_category {
        let total: usize = sentiments.values().sum();
        println!("  {category}: {total}");
        for (sentiment, count) in sentiments {
            println!("    {sentiment}: {count}");
        }
    }

    println!("\nBy day:");
    for (day, count) in &summary.by_day {
        println!("  {day}: {count}");
    }
    Ok(())
}
