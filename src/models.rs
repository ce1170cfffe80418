use chrono::NaiveDate;
use uuid::Uuid;

/// One waste-type bucket. [`Category::ALL`] fixes the display order used by
/// every chart and report: plastic, metal, organic, glass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Plastic,
    Metal,
    Organic,
    Glass,
}

impl Category {
    pub const COUNT: usize = 4;

    pub const ALL: [Category; Category::COUNT] = [
        Category::Plastic,
        Category::Metal,
        Category::Organic,
        Category::Glass,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Category::Plastic => "Plastic",
            Category::Metal => "Metal",
            Category::Organic => "Organic",
            Category::Glass => "Glass",
        }
    }

    pub fn index(self) -> usize {
        match self {
            Category::Plastic => 0,
            Category::Metal => 1,
            Category::Organic => 2,
            Category::Glass => 3,
        }
    }

    /// Lenient label matching. Classifier deployments disagree on casing, and
    /// labels outside the fixed set belong to no bucket.
    pub fn parse_label(raw: &str) -> Option<Category> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "plastic" => Some(Category::Plastic),
            "metal" => Some(Category::Metal),
            "organic" => Some(Category::Organic),
            "glass" => Some(Category::Glass),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClassificationRecord {
    pub id: Uuid,
    pub category_label: String,
    pub weight_kg: f64,
    pub note: String,
    pub classified_at: NaiveDate,
}

#[derive(Debug, Clone)]
pub struct CategorySummary {
    pub category: Category,
    pub batch_count: usize,
    pub avg_batch_kg: f64,
}
