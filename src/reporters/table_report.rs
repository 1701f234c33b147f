use crate::models::TableItem;
use crate::utils::constants::SAMPLE_FIELDS_SHOWN;
use serde::Serialize;

/// Row and write tallies for one table upload
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UploadCounts {
    pub rows_read: usize,
    pub rows_skipped: usize,
    pub items_written: usize,
    pub batches_written: usize,
    pub key_collisions: usize,
}

/// Post-upload check of the table; failures are reported, not raised.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Verification {
    Completed {
        total_items: u64,
        sample_item: Option<TableItem>,
        table_status: String,
    },
    Failed {
        error: String,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct TableRunReport {
    pub table_name: String,
    pub region: String,
    pub counts: UploadCounts,
    pub verification: Verification,
}

impl TableRunReport {
    pub fn summary(&self) -> String {
        let counts = &self.counts;
        let total_items = match &self.verification {
            Verification::Completed { total_items, .. } => total_items.to_string(),
            Verification::Failed { .. } => "unknown".to_string(),
        };

        let mut lines = vec![
            "Upload completed successfully!".to_string(),
            format!("Total items in table: {}", total_items),
            format!("Table: {}", self.table_name),
            format!("Region: {}", self.region),
            format!(
                "Rows read: {} (skipped: {}), items written: {} in {} batches",
                counts.rows_read, counts.rows_skipped, counts.items_written, counts.batches_written
            ),
        ];
        if counts.key_collisions > 0 {
            lines.push(format!(
                "Composite key collisions: {} (later rows overwrote earlier ones)",
                counts.key_collisions
            ));
        }

        match &self.verification {
            Verification::Completed {
                sample_item,
                table_status,
                ..
            } => {
                lines.push(format!("Table status: {}", table_status));
                if let Some(item) = sample_item {
                    lines.push("\nSample item structure:".to_string());
                    let fields = item.fields();
                    lines.extend(
                        fields
                            .iter()
                            .take(SAMPLE_FIELDS_SHOWN)
                            .map(|(name, value)| format!("   {}: {}", name, value)),
                    );
                    if fields.len() > SAMPLE_FIELDS_SHOWN {
                        lines.push(format!(
                            "   ... and {} more fields",
                            fields.len() - SAMPLE_FIELDS_SHOWN
                        ));
                    }
                }
            }
            Verification::Failed { error } => {
                lines.push(format!("Verification failed: {}", error));
            }
        }

        lines.join("\n")
    }
}
