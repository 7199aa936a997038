use rust_decimal::{Decimal, RoundingStrategy};
use tracing::{info, warn};

use super::domain::{
    BrokerId, Commission, CommissionRole, CommissionRule, NegotiationId, NegotiationStatus,
};
use super::error::{DealError, ValidationError};
use super::events::{DealClosedEvent, DealClosedSubscriber};
use super::repository::{CommissionRulesRepository, CommissionsRepository, NegotiationsRepository};
use super::store::TransactionManager;

/// One commission entry before persistence.
#[derive(Debug, Clone, PartialEq)]
pub struct CommissionAllocation {
    pub broker_id: BrokerId,
    pub role: CommissionRole,
    pub amount: Decimal,
}

/// Split the deal value between the capturing and selling brokers under the
/// given rule. A broker on both sides of the deal earns the total percentage
/// in a single capturing entry; otherwise each side is rounded independently
/// and the halves are never reconciled against the total.
pub fn commission_breakdown(
    final_value: Decimal,
    capturing_broker_id: &BrokerId,
    selling_broker_id: &BrokerId,
    rule: &CommissionRule,
) -> Vec<CommissionAllocation> {
    if capturing_broker_id == selling_broker_id {
        return vec![CommissionAllocation {
            broker_id: capturing_broker_id.clone(),
            role: CommissionRole::Capturing,
            amount: round_money(final_value * rule.total_percentage / Decimal::from(100)),
        }];
    }
    vec![
        CommissionAllocation {
            broker_id: capturing_broker_id.clone(),
            role: CommissionRole::Capturing,
            amount: round_money(final_value * rule.capturing_percentage / Decimal::from(100)),
        },
        CommissionAllocation {
            broker_id: selling_broker_id.clone(),
            role: CommissionRole::Selling,
            amount: round_money(final_value * rule.selling_percentage / Decimal::from(100)),
        },
    ]
}

/// Monetary rounding: two decimal places, midpoint away from zero, scale
/// pinned so 4000 renders as 4000.00.
fn round_money(value: Decimal) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}

/// Settles commissions for closed deals. Runs in its own transaction against
/// a fresh read of the negotiation, so it composes with the closing
/// transition without nesting and can be re-run by hand when an automatic
/// settlement was missed.
#[derive(Clone)]
pub struct CommissionService {
    transactions: TransactionManager,
}

impl CommissionService {
    pub fn new(transactions: TransactionManager) -> Self {
        Self { transactions }
    }

    /// Compute and persist the commission entries for a SOLD or RENTED
    /// negotiation. Every guard fails the whole settlement; nothing partial
    /// is written. Re-running appends a second batch, there is no
    /// deduplication.
    pub fn settle_closed_deal(
        &self,
        negotiation_id: &NegotiationId,
    ) -> Result<Vec<Commission>, DealError> {
        self.transactions.run(|tx| {
            let negotiation = NegotiationsRepository::find(tx, negotiation_id)?;
            if !matches!(
                negotiation.status,
                NegotiationStatus::Sold | NegotiationStatus::Rented
            ) {
                return Err(ValidationError::UnsupportedOperation {
                    status: negotiation.status,
                    operation: "settle_closed_deal",
                }
                .into());
            }
            let final_value = negotiation
                .final_value
                .ok_or(ValidationError::FinalValueUnavailable)?;
            if final_value <= Decimal::ZERO {
                return Err(ValidationError::FinalValueNotPositive { value: final_value }.into());
            }
            let selling_broker_id = negotiation
                .selling_broker_id
                .as_ref()
                .ok_or(ValidationError::SellingBrokerRequired)?;
            let rule = CommissionRulesRepository::active_rule(tx)
                .ok_or(ValidationError::NoActiveCommissionRule)?;

            let allocations = commission_breakdown(
                final_value,
                &negotiation.capturing_broker_id,
                selling_broker_id,
                &rule,
            );
            Ok(CommissionsRepository::insert_batch(
                tx,
                negotiation_id,
                allocations,
            ))
        })
    }
}

impl DealClosedSubscriber for CommissionService {
    fn on_deal_closed(&self, event: &DealClosedEvent) {
        match self.settle_closed_deal(&event.negotiation_id) {
            Ok(entries) => info!(
                negotiation_id = %event.negotiation_id,
                entries = entries.len(),
                "commissions settled"
            ),
            Err(err) => warn!(
                negotiation_id = %event.negotiation_id,
                error = %err,
                "commission settlement failed; deal closure stands"
            ),
        }
    }
}
