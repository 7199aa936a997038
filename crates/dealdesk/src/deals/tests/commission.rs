use chrono::{Duration, TimeZone, Utc};
use rust_decimal::Decimal;

use super::common::{
    actor, deal_at, default_rule, draft_update, open_deal, rig, seed_market,
    seed_market_without_commission_rule, supporting_document, CAPTURING_BROKER,
};
use crate::deals::commission::commission_breakdown;
use crate::deals::domain::{
    BrokerId, CommissionRole, CommissionRule, DocumentReviewStatus, NegotiationStatus,
};
use crate::deals::error::{DealError, ValidationError};

#[test]
fn split_breakdown_pays_each_side_its_percentage() {
    let rule = default_rule();
    let allocations = commission_breakdown(
        Decimal::from(200_000),
        &BrokerId("broker-10".into()),
        &BrokerId("broker-20".into()),
        &rule,
    );

    assert_eq!(allocations.len(), 2);
    assert_eq!(allocations[0].role, CommissionRole::Capturing);
    assert_eq!(allocations[0].amount.to_string(), "4000.00");
    assert_eq!(allocations[1].role, CommissionRole::Selling);
    assert_eq!(allocations[1].amount.to_string(), "6000.00");
}

#[test]
fn self_deal_earns_the_total_percentage_in_one_entry() {
    let rule = default_rule();
    let broker = BrokerId("broker-10".into());
    let allocations =
        commission_breakdown(Decimal::from(200_000), &broker, &broker, &rule);

    assert_eq!(allocations.len(), 1);
    assert_eq!(allocations[0].role, CommissionRole::Capturing);
    assert_eq!(allocations[0].broker_id, broker);
    assert_eq!(allocations[0].amount.to_string(), "10000.00");
}

#[test]
fn each_side_rounds_independently() {
    let rule = CommissionRule {
        capturing_percentage: Decimal::new(25, 1),
        selling_percentage: Decimal::new(35, 1),
        total_percentage: Decimal::from(6),
        is_active: true,
        created_at: Utc.with_ymd_and_hms(2026, 1, 10, 9, 0, 0).unwrap(),
    };
    let allocations = commission_breakdown(
        Decimal::from(333_333),
        &BrokerId("broker-10".into()),
        &BrokerId("broker-20".into()),
        &rule,
    );

    // 8333.325 and 11666.655, each rounded away from zero on its own; the
    // sum intentionally drifts from a rounded total.
    assert_eq!(allocations[0].amount.to_string(), "8333.33");
    assert_eq!(allocations[1].amount.to_string(), "11666.66");
}

#[test]
fn settlement_uses_the_most_recent_active_rule() {
    let rig = rig();
    seed_market_without_commission_rule(&rig);
    let base = Utc.with_ymd_and_hms(2026, 1, 10, 9, 0, 0).unwrap();
    rig.transactions
        .run(|tx| {
            tx.insert_commission_rule(default_rule());
            tx.insert_commission_rule(CommissionRule {
                capturing_percentage: Decimal::from(1),
                selling_percentage: Decimal::from(1),
                total_percentage: Decimal::from(2),
                is_active: true,
                created_at: base + Duration::days(30),
            });
            // Inactive rows never win, however recent.
            tx.insert_commission_rule(CommissionRule {
                capturing_percentage: Decimal::from(9),
                selling_percentage: Decimal::from(9),
                total_percentage: Decimal::from(18),
                is_active: false,
                created_at: base + Duration::days(60),
            });
            Ok(())
        })
        .unwrap();

    let awaiting = deal_at(&rig, NegotiationStatus::AwaitingSignatures);
    rig.service.mark_sold(&awaiting.id, &actor()).unwrap();

    let commissions = rig.store.commissions_for(&awaiting.id);
    assert_eq!(commissions.len(), 2);
    assert!(commissions
        .iter()
        .all(|entry| entry.amount.to_string() == "2000.00"));
}

#[test]
fn later_rules_apply_only_to_later_settlements() {
    let rig = rig();
    seed_market(&rig);
    let awaiting = deal_at(&rig, NegotiationStatus::AwaitingSignatures);
    rig.service.mark_sold(&awaiting.id, &actor()).unwrap();

    let first_batch = rig.store.commissions_for(&awaiting.id);
    assert_eq!(first_batch[0].amount.to_string(), "4000.00");

    rig.transactions
        .run(|tx| {
            tx.insert_commission_rule(CommissionRule {
                capturing_percentage: Decimal::from(1),
                selling_percentage: Decimal::from(1),
                total_percentage: Decimal::from(2),
                is_active: true,
                created_at: Utc::now(),
            });
            Ok(())
        })
        .unwrap();

    // The original entries are untouched; only the re-run follows the new
    // percentages.
    let rerun = rig.commissions.settle_closed_deal(&awaiting.id).unwrap();
    assert!(rerun
        .iter()
        .all(|entry| entry.amount.to_string() == "2000.00"));
    let all = rig.store.commissions_for(&awaiting.id);
    assert_eq!(all.len(), 4);
    assert_eq!(all[0].amount.to_string(), "4000.00");
}

#[test]
fn self_deal_settles_end_to_end() {
    let rig = rig();
    seed_market(&rig);
    let opened = open_deal(&rig);
    let actor = actor();

    let mut update = draft_update();
    update.selling_broker_id = None;
    update.self_as_selling_broker = true;
    rig.service.update_draft(&opened.id, update).unwrap();
    rig.service.send_proposal(&opened.id, &actor, false).unwrap();
    rig.service.approve_proposal(&opened.id, &actor).unwrap();
    rig.service.request_documentation(&opened.id, &actor).unwrap();
    supporting_document(&rig, &opened.id, DocumentReviewStatus::Approved);
    rig.service
        .begin_contract_drafting(&opened.id, &actor)
        .unwrap();
    rig.service
        .upload_final_contract(&opened.id, &actor, b"contract".to_vec())
        .unwrap();
    rig.service.mark_sold(&opened.id, &actor).unwrap();

    let commissions = rig.store.commissions_for(&opened.id);
    assert_eq!(commissions.len(), 1);
    assert_eq!(commissions[0].broker_id.0, CAPTURING_BROKER);
    assert_eq!(commissions[0].role, CommissionRole::Capturing);
    assert_eq!(commissions[0].amount.to_string(), "10000.00");
}

#[test]
fn settlement_guards_reject_incomplete_closures() {
    let rig = rig();
    seed_market(&rig);
    let awaiting = deal_at(&rig, NegotiationStatus::AwaitingSignatures);
    rig.service.mark_sold(&awaiting.id, &actor()).unwrap();

    rig.transactions
        .run(|tx| {
            tx.inner
                .negotiations
                .get_mut(&awaiting.id)
                .unwrap()
                .final_value = None;
            Ok(())
        })
        .unwrap();
    match rig.commissions.settle_closed_deal(&awaiting.id) {
        Err(DealError::Validation(ValidationError::FinalValueUnavailable)) => {}
        other => panic!("expected missing value rejection, got {other:?}"),
    }

    for bad_value in [Decimal::ZERO, Decimal::from(-5)] {
        rig.transactions
            .run(|tx| {
                tx.inner
                    .negotiations
                    .get_mut(&awaiting.id)
                    .unwrap()
                    .final_value = Some(bad_value);
                Ok(())
            })
            .unwrap();
        match rig.commissions.settle_closed_deal(&awaiting.id) {
            Err(DealError::Validation(ValidationError::FinalValueNotPositive { value })) => {
                assert_eq!(value, bad_value);
            }
            other => panic!("expected non-positive rejection, got {other:?}"),
        }
    }

    rig.transactions
        .run(|tx| {
            let row = tx.inner.negotiations.get_mut(&awaiting.id).unwrap();
            row.final_value = Some(Decimal::from(200_000));
            row.selling_broker_id = None;
            Ok(())
        })
        .unwrap();
    match rig.commissions.settle_closed_deal(&awaiting.id) {
        Err(DealError::Validation(ValidationError::SellingBrokerRequired)) => {}
        other => panic!("expected missing broker rejection, got {other:?}"),
    }

    // The failed attempts wrote nothing beyond the original settlement.
    assert_eq!(rig.store.commissions_for(&awaiting.id).len(), 2);
}
