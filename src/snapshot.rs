use std::collections::BTreeMap;

use anyhow::Context;
use serde::Deserialize;

use crate::aggregate::{CategoryTotals, DashboardStats, ImpactFactors};
use crate::models::Category;

/// One classification document inside a raw snapshot.
#[derive(Debug, Clone, Deserialize)]
pub struct SnapshotRecord {
    #[serde(rename = "type")]
    pub category: String,
    #[serde(default)]
    pub weight_kg: f64,
}

/// One aggregate delivery from the document store. Deployments disagree on
/// shape: some publish per-category totals with precomputed figures, others
/// publish the raw per-document records and leave aggregation to us.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Snapshot {
    PreAggregated {
        #[serde(default)]
        totals: BTreeMap<String, f64>,
        #[serde(default)]
        total_kg: Option<f64>,
        #[serde(default)]
        co2_saved_kg: Option<f64>,
    },
    Raw {
        #[serde(default)]
        records: Vec<SnapshotRecord>,
    },
}

impl Snapshot {
    pub fn from_json(text: &str) -> anyhow::Result<Self> {
        serde_json::from_str(text).context("invalid snapshot document")
    }

    /// Project either shape onto the dashboard stats. Missing figures are
    /// recomputed; a supplied grand total wins over the bucket sum, both for
    /// the summary fields and as the percentage denominator.
    pub fn into_stats(self, factors: &ImpactFactors) -> DashboardStats {
        match self {
            Snapshot::Raw { records } => {
                let mut totals = CategoryTotals::default();
                for record in &records {
                    if let Some(category) = Category::parse_label(&record.category) {
                        totals.add(category, record.weight_kg);
                    }
                }
                DashboardStats::compute(totals, factors)
            }
            Snapshot::PreAggregated {
                totals: buckets,
                total_kg,
                co2_saved_kg,
            } => {
                let mut totals = CategoryTotals::default();
                for (label, weight_kg) in &buckets {
                    if let Some(category) = Category::parse_label(label) {
                        totals.add(category, *weight_kg);
                    }
                }

                let mut stats = DashboardStats::compute(totals, factors);
                if let Some(total_kg) = total_kg {
                    let total_kg = total_kg.max(0.0);
                    let denominator = if total_kg > 0.0 { total_kg } else { 1.0 };
                    stats.percentages = totals.values().map(|weight| weight / denominator * 100.0);
                    stats.total_kg = total_kg;
                    stats.landfill_diversion_kg = total_kg;
                }
                if let Some(co2_saved_kg) = co2_saved_kg {
                    stats.co2_saved_kg = co2_saved_kg.max(0.0);
                }
                stats
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_snapshot_is_aggregated_client_side() {
        let snapshot = Snapshot::from_json(
            r#"{"kind": "raw", "records": [
                {"type": "Plastic", "weight_kg": 1.0},
                {"type": "Metal", "weight_kg": 0.5},
                {"type": "Organic", "weight_kg": 1.5}
            ]}"#,
        )
        .unwrap();

        let stats = snapshot.into_stats(&ImpactFactors::default());
        assert!((stats.total_kg - 3.0).abs() < 1e-9);
        assert!((stats.co2_saved_kg - 3.55).abs() < 1e-9);
        assert!((stats.percentages[0] - 33.33).abs() < 0.01);
    }

    #[test]
    fn preaggregated_missing_figures_are_recomputed() {
        let snapshot = Snapshot::from_json(
            r#"{"kind": "pre_aggregated", "totals": {"plastic": 2.0, "glass": 1.0}}"#,
        )
        .unwrap();

        let stats = snapshot.into_stats(&ImpactFactors::default());
        assert!((stats.total_kg - 3.0).abs() < 1e-9);
        assert!((stats.co2_saved_kg - 5.2).abs() < 1e-9);
        assert!((stats.landfill_diversion_kg - 3.0).abs() < 1e-9);
    }

    #[test]
    fn preaggregated_supplied_figures_win() {
        let snapshot = Snapshot::from_json(
            r#"{"kind": "pre_aggregated",
                "totals": {"plastic": 1.0},
                "total_kg": 4.0,
                "co2_saved_kg": 9.9}"#,
        )
        .unwrap();

        let stats = snapshot.into_stats(&ImpactFactors::default());
        assert!((stats.total_kg - 4.0).abs() < 1e-9);
        assert!((stats.co2_saved_kg - 9.9).abs() < 1e-9);
        assert!((stats.percentages[0] - 25.0).abs() < 1e-9);
    }

    #[test]
    fn empty_bucket_map_reports_all_zeroes() {
        let snapshot = Snapshot::from_json(r#"{"kind": "pre_aggregated"}"#).unwrap();

        let stats = snapshot.into_stats(&ImpactFactors::default());
        assert_eq!(stats.total_kg, 0.0);
        assert!(stats.percentages.iter().all(|&percent| percent == 0.0));
    }

    #[test]
    fn unknown_document_types_are_skipped() {
        let snapshot = Snapshot::from_json(
            r#"{"kind": "raw", "records": [{"type": "styrofoam", "weight_kg": 5.0}]}"#,
        )
        .unwrap();

        let stats = snapshot.into_stats(&ImpactFactors::default());
        assert_eq!(stats.total_kg, 0.0);
        assert_eq!(stats.co2_saved_kg, 0.0);
    }

    #[test]
    fn missing_weight_defaults_to_zero() {
        let snapshot =
            Snapshot::from_json(r#"{"kind": "raw", "records": [{"type": "Plastic"}]}"#).unwrap();

        let stats = snapshot.into_stats(&ImpactFactors::default());
        assert_eq!(stats.total_kg, 0.0);
    }

    #[test]
    fn reingesting_the_same_snapshot_is_pure() {
        let text = r#"{"kind": "raw", "records": [
            {"type": "Metal", "weight_kg": 0.5},
            {"type": "glass", "weight_kg": 0.2}
        ]}"#;
        let factors = ImpactFactors::default();

        let first = Snapshot::from_json(text).unwrap().into_stats(&factors);
        let second = Snapshot::from_json(text).unwrap().into_stats(&factors);
        assert_eq!(first, second);
    }
}
