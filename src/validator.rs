use crate::error::{AllocationError, Result};
use crate::utils::round2;
use crate::ExpenseAllocation;
use log::debug;

/// Field-level and sum-level checks over reconciled allocations.
///
/// Runs after the reconciler so that honest rounding residue has already been
/// absorbed; anything still off by the tolerance or more is a data error.
pub fn validate_allocations(
    allocations: Vec<ExpenseAllocation>,
    tolerance: f64,
) -> Vec<ExpenseAllocation> {
    let validated: Vec<ExpenseAllocation> = allocations
        .into_iter()
        .map(|allocation| validate_expense(allocation, tolerance))
        .collect();

    let total: usize = validated.iter().map(|a| a.issues.len()).sum();
    debug!(
        "Validation finished: {} issues across {} rows",
        total,
        validated.len()
    );

    validated
}

fn validate_expense(mut allocation: ExpenseAllocation, tolerance: f64) -> ExpenseAllocation {
    let mut found = Vec::new();
    let row = &allocation.row;

    match row.amount {
        Some(amount) if amount > 0.0 => {}
        _ => found.push(AllocationError::InvalidAmount(row.amount_raw.clone())),
    }
    if row.currency.is_empty() {
        found.push(AllocationError::MissingCurrency);
    }
    if row.date.is_none() {
        found.push(AllocationError::MissingDate);
    }
    if row.description.is_empty() {
        found.push(AllocationError::MissingDescription);
    }

    // The sum check only means something when the shares could actually be
    // computed: a known split policy, a usable amount and a non-empty split.
    let policy_known = row.split_all_equal || row.split_type.is_some();
    let split_empty = allocation
        .issues
        .iter()
        .any(|issue| matches!(issue, AllocationError::EmptySplit));
    if let Some(amount) = row.amount {
        if amount > 0.0 && policy_known && !split_empty {
            let owed = allocation.owed_sum();
            if (owed - amount).abs() >= tolerance {
                found.push(AllocationError::RoundingMismatch {
                    expected: amount,
                    actual: round2(owed),
                });
            }
        }
    }

    allocation.issues.extend(found);
    allocation
}

/// Strict batch-level check: every allocation with an amount and shares must
/// have owed shares covering the amount within `tolerance`. Returns the first
/// violation as an error.
pub fn verify_owed_sums(allocations: &[ExpenseAllocation], tolerance: f64) -> Result<()> {
    for allocation in allocations {
        let amount = match allocation.row.amount {
            Some(amount) => amount,
            None => continue,
        };
        if allocation.shares.is_empty() {
            continue;
        }
        let owed = allocation.owed_sum();
        if (owed - amount).abs() >= tolerance {
            return Err(AllocationError::RoundingMismatch {
                expected: amount,
                actual: round2(owed),
            });
        }
    }
    Ok(())
}
