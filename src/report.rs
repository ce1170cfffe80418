use std::fmt::Write;

use chrono::NaiveDate;

use crate::aggregate::{fold_records, DashboardStats, ImpactFactors};
use crate::models::{Category, CategorySummary, ClassificationRecord};

pub fn summarize_by_category(records: &[ClassificationRecord]) -> Vec<CategorySummary> {
    let mut map: std::collections::HashMap<Category, (usize, f64)> =
        std::collections::HashMap::new();

    for record in records {
        if let Some(category) = Category::parse_label(&record.category_label) {
            let entry = map.entry(category).or_insert((0, 0.0));
            entry.0 += 1;
            entry.1 += record.weight_kg.max(0.0);
        }
    }

    let mut summaries: Vec<CategorySummary> = map
        .into_iter()
        .map(|(category, (batch_count, total_kg))| CategorySummary {
            category,
            batch_count,
            avg_batch_kg: if batch_count == 0 {
                0.0
            } else {
                total_kg / batch_count as f64
            },
        })
        .collect();

    summaries.sort_by(|a, b| b.batch_count.cmp(&a.batch_count));
    summaries
}

pub fn build_report(
    category: Option<&str>,
    since: Option<NaiveDate>,
    records: &[ClassificationRecord],
    factors: &ImpactFactors,
) -> String {
    let stats = DashboardStats::compute(fold_records(records), factors);
    let summaries = summarize_by_category(records);

    let mut output = String::new();
    let scope_label = category.unwrap_or("all categories");
    let window_label = match since {
        Some(date) => format!("classifications since {date}"),
        None => "all recorded classifications".to_string(),
    };

    let _ = writeln!(output, "# Waste Sorting Dashboard Report");
    let _ = writeln!(output, "Generated for {} ({})", scope_label, window_label);
    let _ = writeln!(output);
    let _ = writeln!(output, "## Composition");

    if records.is_empty() {
        let _ = writeln!(output, "No classifications recorded for this window.");
    } else {
        for bucket in Category::ALL {
            let _ = writeln!(
                output,
                "- {}: {:.1}% ({:.2} kg)",
                bucket.label(),
                stats.percentages[bucket.index()],
                stats.totals.get(bucket)
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Impact");
    let _ = writeln!(output, "- Total processed: {:.2} kg", stats.total_kg);
    let _ = writeln!(
        output,
        "- Landfill diverted: {:.2} kg",
        stats.landfill_diversion_kg
    );
    let _ = writeln!(output, "- CO2 saved: {:.2} kg", stats.co2_saved_kg);

    let _ = writeln!(output);
    let _ = writeln!(output, "## Busiest Categories");

    if summaries.is_empty() {
        let _ = writeln!(output, "No classifications recorded for this window.");
    } else {
        for summary in summaries.iter() {
            let _ = writeln!(
                output,
                "- {}: {} batches (avg {:.2} kg)",
                summary.category.label(),
                summary.batch_count,
                summary.avg_batch_kg
            );
        }
    }

    let mut recent = records.to_vec();
    recent.sort_by(|a, b| b.classified_at.cmp(&a.classified_at));
    let _ = writeln!(output);
    let _ = writeln!(output, "## Recent Classifications");

    if recent.is_empty() {
        let _ = writeln!(output, "No classifications recorded for this window.");
    } else {
        for record in recent.iter().take(5) {
            let _ = writeln!(
                output,
                "- {} ({:.2} kg) on {}: {}",
                record.category_label, record.weight_kg, record.classified_at, record.note
            );
        }
    }

    output
}
