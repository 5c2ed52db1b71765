use anyhow::{bail, Result};
use ledger::reconcile::reconcile_all;
use sea_orm::Database;
use tracing::{error, info};

pub async fn reconcile(database_url: &str) -> Result<()> {
    info!("Reconciling ledgers at {}", database_url);

    let db = Database::connect(database_url).await?;
    let report = reconcile_all(&db).await?;

    info!(
        "Checked {} budget rows and {} fund rows",
        report.budgets_checked, report.funds_checked
    );

    if report.is_clean() {
        info!("All ledger balances reconcile with the transaction log");
        return Ok(());
    }

    for drift in &report.drifts {
        error!(
            "{}: admin {} employee {:?} column {}: stored {} != derived {} (delta {})",
            drift.ledger,
            drift.admin_id,
            drift.employee_id,
            drift.column,
            drift.stored,
            drift.derived,
            drift.delta()
        );
    }
    bail!("{} drifted ledger columns found", report.drifts.len());
}
