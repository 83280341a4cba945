use tracing::{error, info};

use crate::client::AdminHttpClient;
use crate::error::AdminError;
use crate::record::Record;

#[derive(Debug)]
pub struct TableOutcome {
    pub table: String,
    /// Empty when the fetch failed.
    pub rows: Vec<Record>,
    pub error: Option<AdminError>,
}

impl TableOutcome {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Result of fetching every table once, in table order.
#[derive(Debug, Default)]
pub struct RunAllReport {
    pub outcomes: Vec<TableOutcome>,
    pub total: usize,
    pub success: usize,
}

impl RunAllReport {
    pub fn rows(&self, table: &str) -> Option<&[Record]> {
        self.outcomes
            .iter()
            .find(|o| o.table == table)
            .map(|o| o.rows.as_slice())
    }

    pub fn summary(&self) -> String {
        format!("Successfully loaded {} of {} tables", self.success, self.total)
    }
}

/// Fetch each table in turn. A failed table is recorded and the loop moves on.
pub async fn run_all(client: &AdminHttpClient, tables: &[String]) -> RunAllReport {
    let mut report = RunAllReport::default();

    for table in tables {
        let outcome = match client.fetch_rows(table).await {
            Ok(rows) => {
                report.success += 1;
                TableOutcome {
                    table: table.clone(),
                    rows,
                    error: None,
                }
            }
            Err(e) => {
                error!("Error fetching {}: {}", table, e);
                TableOutcome {
                    table: table.clone(),
                    rows: Vec::new(),
                    error: Some(e),
                }
            }
        };
        report.total += 1;
        report.outcomes.push(outcome);
    }

    info!("📊 {}", report.summary());
    report
}
