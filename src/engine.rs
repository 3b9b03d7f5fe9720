use crate::error::AllocationError;
use crate::ingestion::{ExpenseRow, SplitType};
use crate::resolver::{MemberColumn, MemberDirectory, Resolution};
use crate::schema::MemberRecord;
use crate::utils::round2;
use crate::{ExpenseAllocation, MemberShare};
use log::debug;

/// Turns parsed expense rows into per-member paid/owed shares.
///
/// The calculator is deliberately forgiving: a row with identity or policy
/// problems is annotated with issues and carried forward rather than dropped,
/// so the report can show every row in its original position.
pub struct ShareCalculator<'a> {
    directory: &'a MemberDirectory,
    columns: &'a [MemberColumn],
}

impl<'a> ShareCalculator<'a> {
    pub fn new(directory: &'a MemberDirectory, columns: &'a [MemberColumn]) -> Self {
        ShareCalculator { directory, columns }
    }

    /// Computes shares for every row. Output order matches input order.
    pub fn allocate(&self, rows: Vec<ExpenseRow>) -> Vec<ExpenseAllocation> {
        let allocations: Vec<ExpenseAllocation> = rows
            .into_iter()
            .map(|row| self.allocate_row(row))
            .collect();

        let flagged = allocations.iter().filter(|a| !a.issues.is_empty()).count();
        debug!(
            "Computed shares for {} rows ({} with issues)",
            allocations.len(),
            flagged
        );

        allocations
    }

    fn allocate_row(&self, row: ExpenseRow) -> ExpenseAllocation {
        let mut issues = Vec::new();

        for (member, value) in &row.invalid_cells {
            issues.push(AllocationError::InvalidCell {
                member: member.clone(),
                value: value.clone(),
            });
        }

        // Participants are the members whose column holds a numeric cell on
        // this row. A cell under an unresolved column poisons only this row.
        let mut participants: Vec<(MemberRecord, f64)> = Vec::new();
        for column in self.columns {
            let value = match row.cells.get(&column.name) {
                Some(value) => *value,
                None => continue,
            };
            match &column.resolution {
                Resolution::Resolved(member) => participants.push((member.clone(), value)),
                Resolution::Unknown => {
                    issues.push(AllocationError::UnknownMember(column.name.clone()))
                }
                Resolution::Ambiguous => {
                    issues.push(AllocationError::AmbiguousMember(column.name.clone()))
                }
            }
        }

        let payer = match self.directory.lookup(&row.paid_by) {
            Resolution::Resolved(member) => Some(member),
            Resolution::Unknown => {
                issues.push(AllocationError::UnknownPayer(row.paid_by.clone()));
                None
            }
            Resolution::Ambiguous => {
                issues.push(AllocationError::AmbiguousMember(row.paid_by.clone()));
                None
            }
        };

        if !row.split_all_equal {
            if row.split_type.is_none() {
                issues.push(AllocationError::UnknownSplitType(row.split_type_raw.clone()));
            } else if participants.is_empty() {
                issues.push(AllocationError::EmptySplit);
            }
        }

        let mut shares: Vec<MemberShare> = Vec::new();
        if let Some(amount) = row.amount {
            if row.split_all_equal {
                // The flag overrides the member cells entirely: every group
                // member owes an equal cut.
                let owed = round2(amount / self.directory.len() as f64);
                for member in self.directory.members() {
                    shares.push(MemberShare {
                        member: member.clone(),
                        share_paid: 0.0,
                        share_owed: owed,
                    });
                }
            } else if let Some(split) = row.split_type {
                if !participants.is_empty() {
                    let equal_cut = round2(amount / participants.len() as f64);
                    for (member, value) in participants {
                        let owed = match split {
                            SplitType::Share => round2(value / 100.0 * amount),
                            SplitType::Amount => value,
                            SplitType::Equal => equal_cut,
                        };
                        shares.push(MemberShare {
                            member,
                            share_paid: 0.0,
                            share_owed: owed,
                        });
                    }
                }
            }

            if let Some(payer) = payer {
                let existing = shares.iter().position(|s| s.member.id == payer.id);
                match existing {
                    Some(index) => shares[index].share_paid = amount,
                    None => shares.push(MemberShare {
                        member: payer,
                        share_paid: amount,
                        share_owed: 0.0,
                    }),
                }
            }
        }

        ExpenseAllocation {
            row,
            shares,
            issues,
        }
    }
}

/// Convenience wrapper over [`ShareCalculator`].
pub fn allocate_expenses(
    directory: &MemberDirectory,
    columns: &[MemberColumn],
    rows: Vec<ExpenseRow>,
) -> Vec<ExpenseAllocation> {
    ShareCalculator::new(directory, columns).allocate(rows)
}
