use crate::domain::model::{BatchReport, ItemOutcome, ItemRecord, ObjectKind, RecordStatus};
use crate::domain::ports::{BusinessObject, Company, FieldUpdateStrategy};
use crate::utils::error::Result;
use std::io::Write;

/// Applies a field update strategy to each record, one after the other.
pub struct BatchUpdater {
    strategy: Box<dyn FieldUpdateStrategy>,
}

impl BatchUpdater {
    pub fn new(strategy: Box<dyn FieldUpdateStrategy>) -> Self {
        Self { strategy }
    }

    /// Processes `items` in order and writes one status line per item to
    /// `out` as soon as it is known.
    ///
    /// Per-item failures end up in the report; only a failed write to `out`
    /// stops the batch.
    pub async fn run<C: Company, W: Write + Send>(
        &self,
        company: &C,
        items: &[ItemRecord],
        out: &mut W,
    ) -> Result<BatchReport> {
        let total = items.len();
        let mut report = BatchReport::default();

        for (position, item) in items.iter().enumerate() {
            let status = self.update_one(company, item).await;
            let outcome = ItemOutcome {
                index: position + 1,
                code: item.code.clone(),
                status,
            };

            writeln!(out, "{}", outcome.status_line(total))?;
            out.flush()?;

            report.outcomes.push(outcome);
        }

        tracing::info!(
            "Batch finished: {} updated, {} not found, {} failed, {} total",
            report.updated(),
            report.not_found(),
            report.failed(),
            report.total()
        );

        Ok(report)
    }

    pub async fn update_one<C: Company>(&self, company: &C, item: &ItemRecord) -> RecordStatus {
        match self.try_update(company, item).await {
            Ok(status) => status,
            Err(e) => {
                tracing::debug!("Item {} (line {}) failed: {}", item.code, item.line, e);
                RecordStatus::Failed(e.to_string())
            }
        }
    }

    async fn try_update<C: Company>(&self, company: &C, item: &ItemRecord) -> Result<RecordStatus> {
        let mut object = company.business_object(ObjectKind::ItemMaster)?;

        if !object.load_by_key(&item.code).await? {
            tracing::debug!("Item {} not found", item.code);
            return Ok(RecordStatus::NotFound);
        }

        for (field, value) in self.strategy.assignments(item)? {
            tracing::debug!("{}: {} = {}", item.code, field, value);
            object.set_field(&field, value)?;
        }

        let status = object.commit().await?;
        if status != 0 {
            return Ok(RecordStatus::UpdateFailed(company.last_error_description()));
        }

        Ok(RecordStatus::Updated)
    }
}
