use std::path::Path;

use anyhow::Context;
use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Category, ClassificationRecord};

/// Running weight per category, in kilograms, aligned with [`Category::ALL`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CategoryTotals {
    by_category: [f64; Category::COUNT],
}

impl CategoryTotals {
    /// Buckets never go negative, whatever the store delivers.
    pub fn add(&mut self, category: Category, weight_kg: f64) {
        self.by_category[category.index()] += weight_kg.max(0.0);
    }

    pub fn get(&self, category: Category) -> f64 {
        self.by_category[category.index()]
    }

    pub fn values(&self) -> [f64; Category::COUNT] {
        self.by_category
    }

    pub fn grand_total(&self) -> f64 {
        self.by_category.iter().sum()
    }

    /// Percentage of the grand total per category. A zero total reports every
    /// category as 0 instead of dividing by zero.
    pub fn percentages(&self) -> [f64; Category::COUNT] {
        let total = self.grand_total();
        let denominator = if total > 0.0 { total } else { 1.0 };
        self.by_category.map(|weight| weight / denominator * 100.0)
    }
}

/// Fold a record set into per-category totals. Unseen categories stay at 0
/// and unrecognized labels are skipped outright.
pub fn fold_records(records: &[ClassificationRecord]) -> CategoryTotals {
    let mut totals = CategoryTotals::default();
    for record in records {
        if let Some(category) = Category::parse_label(&record.category_label) {
            totals.add(category, record.weight_kg);
        }
    }
    totals
}

pub fn cutoff_date(since_days: i64) -> NaiveDate {
    Utc::now().date_naive() - Duration::days(since_days.max(1))
}

/// CO2-saved multipliers in kg CO2 per kg of diverted material. These are
/// configuration, not derived values; a JSON file may override any subset.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ImpactFactors {
    pub plastic: f64,
    pub metal: f64,
    pub organic: f64,
    pub glass: f64,
}

impl Default for ImpactFactors {
    fn default() -> Self {
        Self {
            plastic: 2.5,
            metal: 1.8,
            organic: 0.1,
            glass: 0.2,
        }
    }
}

impl ImpactFactors {
    pub fn for_category(&self, category: Category) -> f64 {
        match category {
            Category::Plastic => self.plastic,
            Category::Metal => self.metal,
            Category::Organic => self.organic,
            Category::Glass => self.glass,
        }
    }

    pub fn co2_saved(&self, totals: &CategoryTotals) -> f64 {
        Category::ALL
            .iter()
            .map(|&category| totals.get(category) * self.for_category(category))
            .sum()
    }

    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read impact factors from {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("invalid impact factor file {}", path.display()))
    }
}

/// The projection handed to the presentation sink on every update.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardStats {
    pub totals: CategoryTotals,
    pub percentages: [f64; Category::COUNT],
    pub total_kg: f64,
    pub landfill_diversion_kg: f64,
    pub co2_saved_kg: f64,
}

impl DashboardStats {
    pub fn compute(totals: CategoryTotals, factors: &ImpactFactors) -> Self {
        let total_kg = totals.grand_total();
        Self {
            percentages: totals.percentages(),
            total_kg,
            // Everything sorted is diverted 1:1.
            landfill_diversion_kg: total_kg,
            co2_saved_kg: factors.co2_saved(&totals),
            totals,
        }
    }
}

/// Session accumulator for the local demo feed. Owns its own totals instead
/// of leaking them into module state; buckets only ever grow.
#[derive(Debug, Default)]
pub struct Aggregator {
    totals: CategoryTotals,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ingest(&mut self, records: &[ClassificationRecord]) {
        let batch = fold_records(records);
        for category in Category::ALL {
            self.totals.add(category, batch.get(category));
        }
    }

    pub fn totals(&self) -> CategoryTotals {
        self.totals
    }

    pub fn stats(&self, factors: &ImpactFactors) -> DashboardStats {
        DashboardStats::compute(self.totals, factors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn record(label: &str, weight_kg: f64) -> ClassificationRecord {
        ClassificationRecord {
            id: Uuid::new_v4(),
            category_label: label.to_string(),
            weight_kg,
            note: "test batch".to_string(),
            classified_at: Utc::now().date_naive(),
        }
    }

    #[test]
    fn folds_records_into_expected_totals() {
        let records = vec![
            record("Plastic", 1.0),
            record("Metal", 0.5),
            record("Organic", 1.5),
        ];
        let totals = fold_records(&records);

        assert!((totals.get(Category::Plastic) - 1.0).abs() < 1e-9);
        assert!((totals.get(Category::Metal) - 0.5).abs() < 1e-9);
        assert!((totals.get(Category::Organic) - 1.5).abs() < 1e-9);
        assert_eq!(totals.get(Category::Glass), 0.0);
        assert!((totals.grand_total() - 3.0).abs() < 1e-9);

        let percentages = totals.percentages();
        assert!((percentages[0] - 33.33).abs() < 0.01);
        assert!((percentages[1] - 16.67).abs() < 0.01);
        assert!((percentages[2] - 50.0).abs() < 0.01);

        let co2 = ImpactFactors::default().co2_saved(&totals);
        assert!((co2 - 3.55).abs() < 1e-9);
    }

    #[test]
    fn percentages_sum_to_one_hundred() {
        let records = vec![
            record("plastic", 0.3),
            record("metal", 1.7),
            record("organic", 0.25),
            record("glass", 4.05),
        ];
        let sum: f64 = fold_records(&records).percentages().iter().sum();
        assert!((sum - 100.0).abs() < 1e-6);
    }

    #[test]
    fn empty_input_yields_all_zeroes() {
        let stats = DashboardStats::compute(fold_records(&[]), &ImpactFactors::default());
        assert_eq!(stats.total_kg, 0.0);
        assert_eq!(stats.co2_saved_kg, 0.0);
        assert!(stats.percentages.iter().all(|&percent| percent == 0.0));
    }

    #[test]
    fn folding_is_order_independent() {
        let mut records = vec![
            record("glass", 0.4),
            record("plastic", 1.2),
            record("metal", 0.7),
            record("plastic", 0.3),
        ];
        let forward = fold_records(&records);
        records.reverse();
        assert_eq!(forward, fold_records(&records));
    }

    #[test]
    fn unrecognized_labels_touch_no_bucket() {
        let records = vec![record("unknown", 5.0), record("Plastic", 1.0)];
        let totals = fold_records(&records);
        assert!((totals.grand_total() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn negative_weights_do_not_shrink_buckets() {
        let records = vec![record("Plastic", 2.0), record("Plastic", -1.0)];
        assert!((fold_records(&records).get(Category::Plastic) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn aggregator_only_accumulates() {
        let mut aggregator = Aggregator::new();
        aggregator.ingest(&[record("Plastic", 1.0)]);
        aggregator.ingest(&[record("Plastic", 0.5), record("Glass", 0.25)]);

        let totals = aggregator.totals();
        assert!((totals.get(Category::Plastic) - 1.5).abs() < 1e-9);
        assert!((totals.get(Category::Glass) - 0.25).abs() < 1e-9);
    }

    #[test]
    fn partial_factor_file_keeps_defaults() {
        let factors: ImpactFactors = serde_json::from_str(r#"{"plastic": 3.0}"#).unwrap();
        assert_eq!(factors.plastic, 3.0);
        assert_eq!(factors.metal, 1.8);
        assert_eq!(factors.glass, 0.2);
    }

    #[test]
    fn cutoff_date_respects_since_days() {
        let cutoff = cutoff_date(14);
        let expected = Utc::now().date_naive() - Duration::days(14);
        assert_eq!(cutoff, expected);
    }
}
