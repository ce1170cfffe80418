use chrono::Utc;
use rand::Rng;
use uuid::Uuid;

use crate::models::{Category, ClassificationRecord};

/// Upper bound in kg for one simulated batch, per category.
const BATCH_CAPS_KG: [(Category, f64); Category::COUNT] = [
    (Category::Plastic, 2.0),
    (Category::Metal, 1.0),
    (Category::Organic, 3.0),
    (Category::Glass, 0.5),
];

/// One synthetic batch of sorted waste, as if the classifier had just
/// processed a tray of items.
pub fn generate_batch<R: Rng>(rng: &mut R) -> Vec<ClassificationRecord> {
    BATCH_CAPS_KG
        .iter()
        .map(|&(category, cap_kg)| ClassificationRecord {
            id: Uuid::new_v4(),
            category_label: category.label().to_string(),
            weight_kg: rng.gen_range(0.0..cap_kg),
            note: "simulated batch".to_string(),
            classified_at: Utc::now().date_naive(),
        })
        .collect()
}
