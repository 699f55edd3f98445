//! Document generation pipeline: record → template data → rendered `.docx` → store.

use std::path::Path;

use chrono::NaiveDate;
use tracing::{error, info};

use crate::document::mapper::{format_date, to_template_data};
use crate::document::renderer::render;
use crate::document::storage::{DocumentStore, StoredDocument};
use crate::errors::AppError;
use crate::models::deal::DealRecord;

/// Template key for the date printed at the top of the letter.
pub const LETTER_DATE_KEY: &str = "letter_date";

/// Renders `record` into the template at `template_path` and saves the result.
///
/// The document is rendered fully in memory; nothing is written unless
/// rendering succeeds.
pub async fn generate_document(
    record: &DealRecord,
    template_path: &Path,
    store: &DocumentStore,
    today: NaiveDate,
) -> Result<StoredDocument, AppError> {
    let template = tokio::fs::read(template_path).await.map_err(|e| {
        error!(path = %template_path.display(), "LOI template unavailable: {e}");
        AppError::TemplateConfig(format!(
            "cannot read template {}: {e}",
            template_path.display()
        ))
    })?;

    let mut data = to_template_data(record);
    data.insert_text(LETTER_DATE_KEY, format_date(Some(today)));

    let rendered = render(&template, &data)?;
    let stored = store.save(&rendered).await?;

    info!(
        filename = %stored.filename,
        path = %stored.path.display(),
        transaction_type = %record.financial_terms.transaction_type,
        "LOI document generated"
    );
    Ok(stored)
}
