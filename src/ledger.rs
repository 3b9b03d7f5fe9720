use crate::error::{AllocationError, Result};
use crate::report::AllocationReport;
use chrono::NaiveDate;
use log::debug;
use serde::{Deserialize, Serialize};

/// One member's side of a planned ledger entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerShare {
    pub member_id: i64,
    pub member_name: String,
    pub paid_share: f64,
    pub owed_share: f64,
}

/// How the ledger should split a planned entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum SplitDirective {
    /// Let the ledger divide the amount across the whole group by itself.
    /// Only safe when the acting user is the payer, because the ledger
    /// assumes the acting user fronted the money.
    EqualSplit,
    /// Spell out every member's paid and owed share explicitly.
    ByShares { shares: Vec<LedgerShare> },
}

/// An expense ready to be pushed to the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerExpense {
    pub external_id: Option<String>,
    pub description: String,
    pub date: NaiveDate,
    pub amount: f64,
    pub currency: String,
    pub group_id: i64,
    pub directive: SplitDirective,
}

/// Plans the ledger push for a fully valid report.
///
/// A report with any flagged row is refused outright: partial pushes would
/// leave the group ledger out of sync with the sheet the user reviewed.
pub fn prepare_ledger_push(
    report: &AllocationReport,
    acting_user_id: i64,
) -> Result<Vec<LedgerExpense>> {
    if !report.is_valid {
        return Err(AllocationError::BatchNotCommittable(report.error_count));
    }

    let mut planned = Vec::with_capacity(report.expenses.len());
    for allocation in &report.expenses {
        let row = &allocation.row;
        let amount = row
            .amount
            .ok_or_else(|| AllocationError::InvalidAmount(row.amount_raw.clone()))?;
        let date = row.date.ok_or(AllocationError::MissingDate)?;

        let payer_id = allocation
            .shares
            .iter()
            .find(|share| share.share_paid != 0.0)
            .map(|share| share.member.id);

        let directive = if row.split_all_equal && payer_id == Some(acting_user_id) {
            SplitDirective::EqualSplit
        } else {
            // Members with nothing paid and nothing owed would only add
            // noise to the ledger entry.
            let shares = allocation
                .shares
                .iter()
                .filter(|share| share.share_paid != 0.0 || share.share_owed != 0.0)
                .map(|share| LedgerShare {
                    member_id: share.member.id,
                    member_name: share.member.name.clone(),
                    paid_share: share.share_paid,
                    owed_share: share.share_owed,
                })
                .collect();
            SplitDirective::ByShares { shares }
        };

        planned.push(LedgerExpense {
            external_id: row.external_id.clone(),
            description: row.description.clone(),
            date,
            amount,
            currency: row.currency.clone(),
            group_id: report.group.id,
            directive,
        });
    }

    debug!(
        "Planned {} ledger entries for group {}",
        planned.len(),
        report.group.id
    );

    Ok(planned)
}
