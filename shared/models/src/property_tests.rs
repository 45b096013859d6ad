//! Property-based tests for LabQC core domain models
//!
//! Universal properties of the verdict aggregation, stock classification and
//! audit sealing rules.

use proptest::prelude::*;
use chrono::{NaiveDate, TimeZone, Utc};

use crate::{
    AnalysisType, AuditAction, AuditEntry, ConsumptionLogEntry, InventoryItem, ResultStatus,
    ResultValue, Sample, StockReceipt, StockStatus, StockThresholds, TestResult,
    OVERALL_AWAITING, OVERALL_OUT_OF_SPEC, OVERALL_WITHIN_SPEC,
};

prop_compose! {
    fn arb_status()(status in prop_oneof![
        Just(ResultStatus::Pass),
        Just(ResultStatus::Pending),
        Just(ResultStatus::Fail),
    ]) -> ResultStatus {
        status
    }
}

prop_compose! {
    fn arb_sample()(statuses in prop::collection::vec(arb_status(), 0..12)) -> Sample {
        let mut sample = Sample::new(
            "RM-0001",
            "Organic Shea Nuts",
            "SN-445",
            AnalysisType::RawMaterial,
            Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
        );
        for (i, status) in statuses.into_iter().enumerate() {
            sample.test_results.insert(
                format!("param{}", i),
                TestResult {
                    value: ResultValue::Number(i as f64),
                    unit: "%".to_string(),
                    spec_expression: "<10".to_string(),
                    status,
                },
            );
        }
        sample
    }
}

fn severity_rank(status: StockStatus) -> u8 {
    match status {
        StockStatus::Ok => 0,
        StockStatus::Low => 1,
        StockStatus::Critical => 2,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// The aggregate verdict is the worst test result status.
    #[test]
    fn prop_verdict_is_worst_status(mut sample in arb_sample()) {
        sample.refresh_verdict();
        let statuses: Vec<ResultStatus> = sample.test_results.values().map(|r| r.status).collect();

        if statuses.contains(&ResultStatus::Fail) {
            prop_assert_eq!(sample.verdict, ResultStatus::Fail);
            prop_assert!(sample.overall_result.starts_with(OVERALL_OUT_OF_SPEC));
        } else if statuses.is_empty() || statuses.contains(&ResultStatus::Pending) {
            prop_assert_eq!(sample.verdict, ResultStatus::Pending);
            prop_assert_eq!(sample.overall_result.as_str(), OVERALL_AWAITING);
        } else {
            prop_assert_eq!(sample.verdict, ResultStatus::Pass);
            prop_assert_eq!(sample.overall_result.as_str(), OVERALL_WITHIN_SPEC);
        }
    }

    /// Every failing parameter is named in the out-of-spec message.
    #[test]
    fn prop_out_of_spec_names_failures(mut sample in arb_sample()) {
        sample.refresh_verdict();
        for id in sample.failing_parameters() {
            prop_assert!(sample.overall_result.contains(id));
        }
    }

    /// Consuming stock never makes the status healthier.
    #[test]
    fn prop_consumption_never_improves_status(
        total in 1.0..1000.0f64,
        fractions in prop::collection::vec(0.0..0.2f64, 1..20),
    ) {
        let thresholds = StockThresholds::default();
        let date = NaiveDate::from_ymd_opt(2024, 7, 20).unwrap();
        let mut item = InventoryItem::new("Methanol (AR Grade)", "L");
        item.receive(
            StockReceipt { date, package_count: 1, capacity_per_package: total, quantity: total },
            &thresholds,
        );

        let mut previous = severity_rank(item.status);
        for fraction in fractions {
            let amount = total * fraction;
            let entry = ConsumptionLogEntry { date, amount, product_analyzed: "ref".to_string() };
            if item.consume(entry, &thresholds).is_ok() {
                let current = severity_rank(item.status);
                prop_assert!(current >= previous);
                previous = current;
            }
            prop_assert!(item.current_stock >= 0.0);
            prop_assert!(item.current_stock <= item.total_stock);
        }
    }

    /// Status is a pure function of the remaining fraction.
    #[test]
    fn prop_status_depends_only_on_fraction(pct in 0.0..100.0f64, scale in 1.0..500.0f64) {
        let thresholds = StockThresholds::default();
        let a = StockStatus::classify(pct, 100.0, &thresholds);
        let b = StockStatus::classify(pct * scale / 100.0 * 100.0, 100.0 * scale, &thresholds);
        prop_assert_eq!(a, b);
    }

    /// Sealed audit entries verify; any detail change breaks verification.
    #[test]
    fn prop_audit_seal_detects_detail_changes(
        details in "[a-z ]{1,40}",
        suffix in "[a-z]{1,5}",
        previous in proptest::option::of("[0-9a-f]{64}"),
    ) {
        let mut entry = AuditEntry::new(AuditAction::ResultRecorded, "sample", "RM-0001", None, details);
        entry.seal(previous);
        prop_assert!(entry.verify_integrity());

        entry.details.push_str(&suffix);
        prop_assert!(!entry.verify_integrity());
    }
}
