use anyhow::Context;
use chrono::NaiveDate;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::ClassificationRecord;

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let classifications = vec![
        (
            "seed-001",
            "Plastic",
            1.4,
            "PET bottles from the cafeteria bin",
            NaiveDate::from_ymd_opt(2026, 8, 1).context("invalid date")?,
        ),
        (
            "seed-002",
            "Metal",
            0.6,
            "Aluminium cans",
            NaiveDate::from_ymd_opt(2026, 8, 1).context("invalid date")?,
        ),
        (
            "seed-003",
            "Organic",
            2.1,
            "Food scraps from the pilot run",
            NaiveDate::from_ymd_opt(2026, 8, 2).context("invalid date")?,
        ),
        (
            "seed-004",
            "Glass",
            0.8,
            "Brown glass jars",
            NaiveDate::from_ymd_opt(2026, 8, 2).context("invalid date")?,
        ),
        (
            "seed-005",
            "Plastic",
            0.9,
            "Mixed film plastic",
            NaiveDate::from_ymd_opt(2026, 8, 3).context("invalid date")?,
        ),
    ];

    for (source_key, category, weight_kg, note, classified_at) in classifications {
        sqlx::query(
            r#"
            INSERT INTO waste_dashboard.classifications
            (id, category, weight_kg, note, classified_at, source_key)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(category)
        .bind(weight_kg)
        .bind(note)
        .bind(classified_at)
        .bind(source_key)
        .execute(pool)
        .await?;
    }

    Ok(())
}

pub async fn fetch_classifications(
    pool: &PgPool,
    since: Option<NaiveDate>,
    category: Option<&str>,
) -> anyhow::Result<Vec<ClassificationRecord>> {
    let mut query = String::from(
        "SELECT id, category, weight_kg, note, classified_at \
         FROM waste_dashboard.classifications",
    );

    let mut filters = Vec::new();
    if since.is_some() {
        filters.push(format!("classified_at >= ${}", filters.len() + 1));
    }
    if category.is_some() {
        filters.push(format!("lower(category) = lower(${})", filters.len() + 1));
    }
    if !filters.is_empty() {
        query.push_str(" WHERE ");
        query.push_str(&filters.join(" AND "));
    }
    query.push_str(" ORDER BY classified_at DESC, source_key");

    let mut rows = sqlx::query(&query);
    if let Some(value) = since {
        rows = rows.bind(value);
    }
    if let Some(value) = category {
        rows = rows.bind(value);
    }

    let records = rows.fetch_all(pool).await?;
    let mut classifications = Vec::new();

    for row in records {
        classifications.push(ClassificationRecord {
            id: row.get("id"),
            category_label: row.get("category"),
            weight_kg: row.get("weight_kg"),
            note: row.get("note"),
            classified_at: row.get("classified_at"),
        });
    }

    Ok(classifications)
}

pub async fn import_csv(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        category: String,
        weight_kg: f64,
        note: String,
        classified_at: NaiveDate,
        source_key: Option<String>,
    }

    let mut reader = csv::Reader::from_path(csv_path)?;
    let mut inserted = 0usize;

    for result in reader.deserialize::<CsvRow>() {
        let row = result?;
        let source_key = row
            .source_key
            .unwrap_or_else(|| format!("import-{}", Uuid::new_v4()));

        let result = sqlx::query(
            r#"
            INSERT INTO waste_dashboard.classifications
            (id, category, weight_kg, note, classified_at, source_key)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&row.category)
        .bind(row.weight_kg)
        .bind(&row.note)
        .bind(row.classified_at)
        .bind(source_key)
        .execute(pool)
        .await?;

        if result.rows_affected() > 0 {
            inserted += 1;
        }
    }

    Ok(inserted)
}
