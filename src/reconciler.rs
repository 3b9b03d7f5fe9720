use crate::utils::{round2, TOLERANCE};
use crate::ExpenseAllocation;
use log::debug;
use rand::Rng;

/// Absorbs sub-tolerance rounding residue so each expense's owed shares sum
/// to its amount exactly.
///
/// Equal and percentage splits round each share to cents independently, which
/// can leave the total a cent or two off. The reconciler folds that residue
/// into one randomly chosen participating share. Larger discrepancies are not
/// touched; those are real data errors and the validator flags them.
pub struct RoundingReconciler {
    tolerance: f64,
}

impl RoundingReconciler {
    pub fn new(tolerance: f64) -> Self {
        RoundingReconciler { tolerance }
    }

    /// Reconciles every allocation in order, drawing correction targets from
    /// `rng`. A seeded generator makes the whole pass reproducible.
    pub fn reconcile<R: Rng>(
        &self,
        allocations: Vec<ExpenseAllocation>,
        rng: &mut R,
    ) -> Vec<ExpenseAllocation> {
        allocations
            .into_iter()
            .map(|allocation| self.reconcile_expense(allocation, rng))
            .collect()
    }

    fn reconcile_expense<R: Rng>(
        &self,
        mut allocation: ExpenseAllocation,
        rng: &mut R,
    ) -> ExpenseAllocation {
        let amount = match allocation.row.amount {
            Some(amount) => amount,
            None => return allocation,
        };
        if allocation.shares.is_empty() {
            return allocation;
        }

        let diff = allocation.owed_sum() - amount;
        let correction = round2(diff);
        if correction == 0.0 || diff.abs() >= self.tolerance {
            return allocation;
        }

        // Only members who actually owe something can absorb the residue; a
        // payer-only entry must keep its zero owed share.
        let candidates: Vec<usize> = allocation
            .shares
            .iter()
            .enumerate()
            .filter(|(_, share)| share.share_owed != 0.0)
            .map(|(index, _)| index)
            .collect();
        if candidates.is_empty() {
            return allocation;
        }

        let target = candidates[rng.gen_range(0..candidates.len())];
        debug!(
            "Row {}: adjusting owed share for '{}' by {:+.2}",
            allocation.row.row_index,
            allocation.shares[target].member.name,
            -correction
        );

        let share = &mut allocation.shares[target];
        share.share_owed = round2(share.share_owed - correction);
        allocation
    }
}

impl Default for RoundingReconciler {
    fn default() -> Self {
        RoundingReconciler::new(TOLERANCE)
    }
}

/// Convenience wrapper over [`RoundingReconciler`].
pub fn reconcile_allocations<R: Rng>(
    allocations: Vec<ExpenseAllocation>,
    tolerance: f64,
    rng: &mut R,
) -> Vec<ExpenseAllocation> {
    RoundingReconciler::new(tolerance).reconcile(allocations, rng)
}
