use std::fmt::Write;

use crate::aggregate::DashboardStats;
use crate::models::Category;

const BAR_WIDTH: usize = 30;

/// One chart's data arrays, labels aligned with [`Category::ALL`] order.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartDataset {
    pub label: &'static str,
    pub labels: [&'static str; Category::COUNT],
    pub data: [f64; Category::COUNT],
}

impl ChartDataset {
    fn new(label: &'static str) -> Self {
        Self {
            label,
            labels: [
                Category::Plastic.label(),
                Category::Metal.label(),
                Category::Organic.label(),
                Category::Glass.label(),
            ],
            data: [0.0; Category::COUNT],
        }
    }
}

/// Terminal rendering of the two dashboard charts plus the summary fields.
/// The chart instances live as long as the dashboard; each update replaces
/// their data arrays in place and computes nothing itself.
#[derive(Debug)]
pub struct Dashboard {
    composition: ChartDataset,
    weights: ChartDataset,
    total_kg: f64,
    landfill_diversion_kg: f64,
    co2_saved_kg: f64,
}

impl Dashboard {
    pub fn new() -> Self {
        Self {
            composition: ChartDataset::new("Waste Composition"),
            weights: ChartDataset::new("Weight (kg)"),
            total_kg: 0.0,
            landfill_diversion_kg: 0.0,
            co2_saved_kg: 0.0,
        }
    }

    pub fn apply(&mut self, stats: &DashboardStats) {
        self.composition.data = stats.percentages;
        self.weights.data = stats.totals.values();
        self.total_kg = stats.total_kg;
        self.landfill_diversion_kg = stats.landfill_diversion_kg;
        self.co2_saved_kg = stats.co2_saved_kg;
    }

    pub fn composition(&self) -> &ChartDataset {
        &self.composition
    }

    pub fn weights(&self) -> &ChartDataset {
        &self.weights
    }

    pub fn render(&self) -> String {
        let mut output = String::new();

        let _ = writeln!(output, "{}", self.composition.label);
        for (index, label) in self.composition.labels.iter().enumerate() {
            let percent = self.composition.data[index];
            let filled = ((percent / 100.0) * BAR_WIDTH as f64).round() as usize;
            let _ = writeln!(
                output,
                "  {label:<8} {percent:5.1}% {}",
                "#".repeat(filled.min(BAR_WIDTH))
            );
        }

        let _ = writeln!(output);
        let _ = writeln!(output, "{}", self.weights.label);
        for (index, label) in self.weights.labels.iter().enumerate() {
            let _ = writeln!(output, "  {label:<8} {:8.2} kg", self.weights.data[index]);
        }

        let _ = writeln!(output);
        let _ = writeln!(output, "Total processed    {:.2} kg", self.total_kg);
        let _ = writeln!(
            output,
            "Landfill diverted  {:.2} kg",
            self.landfill_diversion_kg
        );
        let _ = writeln!(output, "CO2 saved          {:.2} kg", self.co2_saved_kg);

        output
    }
}
