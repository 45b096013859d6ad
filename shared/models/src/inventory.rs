//! Reagent inventory domain models.
//!
//! Stock items grow by receipts and shrink by consumption. Both histories are
//! append-only; the stock status is derived from the remaining fraction.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StockStatus {
    #[serde(rename = "OK")]
    Ok,
    Low,
    Critical,
}

impl fmt::Display for StockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => write!(f, "OK"),
            Self::Low => write!(f, "Low"),
            Self::Critical => write!(f, "Critical"),
        }
    }
}

/// Percent-of-total boundaries below which stock is Critical or Low.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StockThresholds {
    pub critical_pct: f64,
    pub low_pct: f64,
}

impl Default for StockThresholds {
    fn default() -> Self {
        Self {
            critical_pct: 10.0,
            low_pct: 25.0,
        }
    }
}

impl StockStatus {
    pub fn classify(current_stock: f64, total_stock: f64, thresholds: &StockThresholds) -> Self {
        if total_stock <= 0.0 {
            return Self::Ok;
        }

        let pct = current_stock / total_stock * 100.0;
        if pct < thresholds.critical_pct {
            Self::Critical
        } else if pct < thresholds.low_pct {
            Self::Low
        } else {
            Self::Ok
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsumptionLogEntry {
    pub date: NaiveDate,
    pub amount: f64,
    pub product_analyzed: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockReceipt {
    pub date: NaiveDate,
    pub package_count: u32,
    pub capacity_per_package: f64,
    pub quantity: f64,
}

/// Relative slack for stock comparisons; fractional amounts drift in `f64`.
const STOCK_EPSILON: f64 = 1e-9;

/// Consumption that would take stock below zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StockShortfall {
    pub requested: f64,
    pub available: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub name: String,
    pub total_stock: f64,
    pub current_stock: f64,
    pub unit: String,
    pub status: StockStatus,
    pub consumption: Vec<ConsumptionLogEntry>,
    #[serde(default)]
    pub receipts: Vec<StockReceipt>,
}

impl InventoryItem {
    /// An item with no stock yet.
    pub fn new(name: impl Into<String>, unit: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            total_stock: 0.0,
            current_stock: 0.0,
            unit: unit.into(),
            status: StockStatus::Ok,
            consumption: Vec::new(),
            receipts: Vec::new(),
        }
    }

    pub fn receive(&mut self, receipt: StockReceipt, thresholds: &StockThresholds) {
        self.total_stock += receipt.quantity;
        self.current_stock += receipt.quantity;
        self.receipts.push(receipt);
        self.refresh_status(thresholds);
    }

    /// Deducts the entry's amount and appends it to the log. Leaves the item
    /// untouched when stock is insufficient.
    pub fn consume(
        &mut self,
        entry: ConsumptionLogEntry,
        thresholds: &StockThresholds,
    ) -> Result<(), StockShortfall> {
        let tolerance = self.total_stock.max(entry.amount) * STOCK_EPSILON;
        if entry.amount > self.current_stock + tolerance {
            return Err(StockShortfall {
                requested: entry.amount,
                available: self.current_stock,
            });
        }

        self.current_stock -= entry.amount;
        if self.current_stock <= tolerance {
            self.current_stock = 0.0;
        }
        self.consumption.push(entry);
        self.refresh_status(thresholds);
        Ok(())
    }

    pub fn refresh_status(&mut self, thresholds: &StockThresholds) {
        self.status = StockStatus::classify(self.current_stock, self.total_stock, thresholds);
    }

    pub fn remaining_pct(&self) -> f64 {
        if self.total_stock <= 0.0 {
            return 100.0;
        }
        self.current_stock / self.total_stock * 100.0
    }

    pub fn total_consumed(&self) -> f64 {
        self.consumption.iter().map(|c| c.amount).sum()
    }
}
