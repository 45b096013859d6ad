//! Inventory Ledger Service
//!
//! Stock receipts, consumption against samples and derived stock health.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};
use validator::Validate;

use labqc_database::{AuditRepository, InventoryRepository};
use labqc_models::{
    AuditAction, ConsumptionLogEntry, InventoryItem, StockReceipt, StockStatus, StockThresholds,
};
use labqc_utils::{validate_model, validate_not_blank, validate_positive, LabQcError, LabQcResult};

const ENTITY_TYPE: &str = "inventory";

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddStockRequest {
    #[validate(length(min = 1, max = 200, message = "Item name is required"))]
    pub name: String,
    #[validate(range(min = 1, message = "At least one package is required"))]
    pub package_count: u32,
    pub capacity_per_package: f64,
    #[validate(length(min = 1, max = 20, message = "Unit is required"))]
    pub unit: String,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LogConsumptionRequest {
    #[validate(length(min = 1, max = 200, message = "Item name is required"))]
    pub name: String,
    pub amount: f64,
    pub date: NaiveDate,
    #[validate(length(min = 1, max = 300, message = "Product analyzed is required"))]
    pub product_ref: String,
}

#[derive(Serialize)]
struct ConsumptionRow<'a> {
    date: NaiveDate,
    item: &'a str,
    amount: f64,
    unit: &'a str,
    #[serde(rename = "productAnalyzed")]
    product_analyzed: &'a str,
}

/// Reagent inventory ledger
pub struct InventoryLedger {
    items: Arc<InventoryRepository>,
    audit: Arc<AuditRepository>,
    thresholds: StockThresholds,
}

impl InventoryLedger {
    pub fn new(
        items: Arc<InventoryRepository>,
        audit: Arc<AuditRepository>,
        thresholds: StockThresholds,
    ) -> Self {
        Self {
            items,
            audit,
            thresholds,
        }
    }

    pub fn thresholds(&self) -> StockThresholds {
        self.thresholds
    }

    /// Receive stock, creating the item on its first receipt
    pub fn add_stock(&self, request: AddStockRequest) -> LabQcResult<InventoryItem> {
        validate_model(&request)?;
        validate_positive("capacityPerPackage", request.capacity_per_package)?;

        let name = request.name.trim().to_string();
        let unit = request.unit.trim().to_string();
        validate_not_blank("name", &name)?;
        validate_not_blank("unit", &unit)?;

        let receipt = StockReceipt {
            date: request.date,
            package_count: request.package_count,
            capacity_per_package: request.capacity_per_package,
            quantity: f64::from(request.package_count) * request.capacity_per_package,
        };
        let quantity = receipt.quantity;
        let thresholds = self.thresholds;

        let item = self.items.upsert(
            &name,
            || InventoryItem::new(name.clone(), unit.clone()),
            |item| {
                if !item.unit.eq_ignore_ascii_case(&unit) {
                    return Err(LabQcError::validation(
                        "unit",
                        format!("{} is stocked in {}, not {}", item.name, item.unit, unit),
                    ));
                }

                let previous = item.status;
                item.receive(receipt, &thresholds);

                self.audit.record(
                    AuditAction::StockReceived,
                    ENTITY_TYPE,
                    &item.name,
                    None,
                    format!(
                        "+{} {} ({} x {}) received {}",
                        quantity, item.unit, request.package_count, request.capacity_per_package, request.date
                    ),
                )?;
                alert_on_transition(&self.audit, previous, item)?;
                Ok(item.clone())
            },
        )?;

        info!(
            item = %item.name,
            quantity,
            current_stock = item.current_stock,
            total_stock = item.total_stock,
            "Stock received"
        );

        Ok(item)
    }

    /// Deduct consumed stock and log it against the analyzed product
    pub fn log_consumption(&self, request: LogConsumptionRequest) -> LabQcResult<InventoryItem> {
        validate_model(&request)?;
        validate_positive("amount", request.amount)?;
        validate_not_blank("productRef", &request.product_ref)?;

        let name = request.name.trim();
        let entry = ConsumptionLogEntry {
            date: request.date,
            amount: request.amount,
            product_analyzed: request.product_ref.trim().to_string(),
        };
        let thresholds = self.thresholds;

        let item = self
            .items
            .update(name, |item| {
                let previous = item.status;
                item.consume(entry.clone(), &thresholds).map_err(|shortfall| {
                    LabQcError::insufficient_stock(
                        &item.name,
                        shortfall.requested,
                        shortfall.available,
                    )
                })?;

                self.audit.record(
                    AuditAction::ConsumptionLogged,
                    ENTITY_TYPE,
                    &item.name,
                    None,
                    format!(
                        "-{} {} for {} on {}",
                        entry.amount, item.unit, entry.product_analyzed, entry.date
                    ),
                )?;
                alert_on_transition(&self.audit, previous, item)?;
                Ok(item.clone())
            })
            .map_err(|e| {
                if matches!(e, LabQcError::InsufficientStock { .. }) {
                    warn!(item = %name, error = %e, "Consumption refused");
                }
                e
            })?;

        info!(
            item = %item.name,
            amount = entry.amount,
            current_stock = item.current_stock,
            product = %entry.product_analyzed,
            "Consumption logged"
        );

        Ok(item)
    }

    pub fn get_item(&self, name: &str) -> LabQcResult<InventoryItem> {
        self.items.fetch(name.trim())
    }

    /// All items ordered by name
    pub fn list_items(&self) -> LabQcResult<Vec<InventoryItem>> {
        self.items.list()
    }

    pub fn critical_items(&self) -> LabQcResult<Vec<InventoryItem>> {
        Ok(self
            .list_items()?
            .into_iter()
            .filter(|item| item.status == StockStatus::Critical)
            .collect())
    }

    /// Total consumed per item name
    pub fn consumption_totals(&self) -> LabQcResult<BTreeMap<String, f64>> {
        Ok(self
            .list_items()?
            .into_iter()
            .map(|item| {
                let total = item.total_consumed();
                (item.name, total)
            })
            .collect())
    }

    /// Every consumption entry as CSV, ordered by date then item
    pub fn export_consumption_csv(&self) -> LabQcResult<String> {
        let items = self.list_items()?;

        let mut rows: Vec<ConsumptionRow<'_>> = items
            .iter()
            .flat_map(|item| {
                item.consumption.iter().map(move |entry| ConsumptionRow {
                    date: entry.date,
                    item: &item.name,
                    amount: entry.amount,
                    unit: &item.unit,
                    product_analyzed: &entry.product_analyzed,
                })
            })
            .collect();
        rows.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.item.cmp(b.item)));

        let mut writer = csv::Writer::from_writer(Vec::new());
        if rows.is_empty() {
            writer.write_record(["date", "item", "amount", "unit", "productAnalyzed"])?;
        }
        for row in &rows {
            writer.serialize(row)?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| LabQcError::internal(format!("CSV export failed: {}", e)))?;
        String::from_utf8(bytes).map_err(|e| LabQcError::internal(format!("CSV export failed: {}", e)))
    }
}

/// Audits and logs a status change for the worse, inside the item's update.
fn alert_on_transition(
    audit: &AuditRepository,
    previous: StockStatus,
    item: &InventoryItem,
) -> LabQcResult<()> {
    if severity(item.status) <= severity(previous) {
        return Ok(());
    }

    warn!(
        item = %item.name,
        status = %item.status,
        current_stock = item.current_stock,
        total_stock = item.total_stock,
        "Stock level alert"
    );

    audit.record(
        AuditAction::StockAlert,
        ENTITY_TYPE,
        &item.name,
        None,
        format!(
            "{} -> {}: {} of {} {} remaining ({:.1}%)",
            previous,
            item.status,
            item.current_stock,
            item.total_stock,
            item.unit,
            item.remaining_pct()
        ),
    )?;

    Ok(())
}

fn severity(status: StockStatus) -> u8 {
    match status {
        StockStatus::Ok => 0,
        StockStatus::Low => 1,
        StockStatus::Critical => 2,
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use labqc_database::initialize_repositories;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn stock_stays_within_bounds(amounts in prop::collection::vec(1u32..400, 1..30)) {
            let repos = initialize_repositories();
            let ledger = InventoryLedger::new(repos.inventory, repos.audit, StockThresholds::default());
            let day = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();

            ledger.add_stock(AddStockRequest {
                name: "Hexane".to_string(),
                package_count: 4,
                capacity_per_package: 250.0,
                unit: "mL".to_string(),
                date: day,
            }).unwrap();

            for amount in amounts {
                let before = ledger.get_item("Hexane").unwrap();
                let result = ledger.log_consumption(LogConsumptionRequest {
                    name: "Hexane".to_string(),
                    amount: f64::from(amount),
                    date: day,
                    product_ref: "Organic Shea Nuts (RM-0001)".to_string(),
                });
                let after = ledger.get_item("Hexane").unwrap();

                match result {
                    Ok(_) => {
                        prop_assert_eq!(after.current_stock, before.current_stock - f64::from(amount));
                    }
                    Err(_) => {
                        prop_assert_eq!(&after, &before);
                    }
                }
                prop_assert!(after.current_stock >= 0.0);
                prop_assert!(after.current_stock <= after.total_stock);
            }
        }
    }
}
