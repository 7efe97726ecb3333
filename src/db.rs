use anyhow::Context;
use csv::StringRecord;
use serde_json::Value;
use sqlx::{PgPool, Row as _};
use uuid::Uuid;

use crate::mock::MockData;
use crate::models::Row;
use crate::source::Table;

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Rows of one logical table in insertion order.
pub async fn fetch_rows(pool: &PgPool, table: Table) -> Result<Vec<Row>, sqlx::Error> {
    let records = sqlx::query(
        "SELECT fields FROM recruiting_dashboard.table_rows \
         WHERE table_name = $1 \
         ORDER BY position",
    )
    .bind(table.name())
    .fetch_all(pool)
    .await?;

    let mut rows = Vec::with_capacity(records.len());
    for record in records {
        let fields: Value = record.try_get("fields")?;
        if let Value::Object(map) = fields {
            rows.push(map);
        }
    }

    Ok(rows)
}

/// Loads a generated data set. Re-running is a no-op for rows already seeded.
pub async fn seed(pool: &PgPool, data: &MockData) -> anyhow::Result<usize> {
    let mut inserted = 0usize;

    for table in Table::ALL {
        for (index, fields) in data.rows(table).into_iter().enumerate() {
            let source_key = format!("seed-{}-{index:05}", table.name());
            inserted += insert_row(pool, table, fields, &source_key).await?;
        }
    }

    Ok(inserted)
}

pub async fn import_csv(
    pool: &PgPool,
    table: Table,
    csv_path: &std::path::Path,
) -> anyhow::Result<usize> {
    let mut reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let headers = reader.headers()?.clone();
    let mut inserted = 0usize;

    for result in reader.records() {
        let record = result?;
        let mut fields = csv_fields(&headers, &record);
        let source_key = match fields.remove("source_key") {
            Some(Value::String(key)) => key,
            _ => format!("import-{}", Uuid::new_v4()),
        };
        inserted += insert_row(pool, table, fields, &source_key).await?;
    }

    Ok(inserted)
}

async fn insert_row(
    pool: &PgPool,
    table: Table,
    fields: Row,
    source_key: &str,
) -> anyhow::Result<usize> {
    let result = sqlx::query(
        r#"
        INSERT INTO recruiting_dashboard.table_rows
        (id, table_name, fields, source_key)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (source_key) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(table.name())
    .bind(Value::Object(fields))
    .bind(source_key)
    .execute(pool)
    .await
    .with_context(|| format!("failed to insert row {source_key}"))?;

    Ok(result.rows_affected() as usize)
}

/// One CSV record as a row. Integer-looking cells become numbers, empty
/// cells are left out.
pub fn csv_fields(headers: &StringRecord, record: &StringRecord) -> Row {
    let mut fields = Row::new();
    for (header, cell) in headers.iter().zip(record.iter()) {
        let cell = cell.trim();
        if cell.is_empty() {
            continue;
        }
        let value = match cell.parse::<i64>() {
            Ok(number) => Value::from(number),
            Err(_) => Value::from(cell),
        };
        fields.insert(header.trim().to_string(), value);
    }
    fields
}
