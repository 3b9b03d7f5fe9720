use crate::error::Result;
use crate::resolver::{MemberColumn, Resolution};
use crate::schema::GroupRef;
use crate::ExpenseAllocation;
use serde::{Deserialize, Serialize};

/// The final product of a batch run: every row with its shares, plus the
/// positional error bookkeeping a caller needs to show problems next to the
/// offending rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationReport {
    pub group: GroupRef,
    /// Member columns as they were bound, including unresolved ones.
    pub member_columns: Vec<MemberColumn>,
    pub expenses: Vec<ExpenseAllocation>,
    /// One flag per expense row, in row order.
    pub error_flags: Vec<bool>,
    /// Human-readable messages per expense row, in row order.
    pub error_messages: Vec<Vec<String>>,
    /// Total message count across all rows.
    pub error_count: usize,
    /// True when no row carries any issue.
    pub is_valid: bool,
}

impl AllocationReport {
    pub fn new(
        group: GroupRef,
        member_columns: Vec<MemberColumn>,
        expenses: Vec<ExpenseAllocation>,
    ) -> Self {
        let error_flags: Vec<bool> = expenses.iter().map(|e| !e.issues.is_empty()).collect();
        let error_messages: Vec<Vec<String>> = expenses
            .iter()
            .map(|e| e.issues.iter().map(|issue| issue.to_string()).collect())
            .collect();
        let error_count = error_messages.iter().map(Vec::len).sum();

        AllocationReport {
            group,
            member_columns,
            expenses,
            error_flags,
            error_messages,
            error_count,
            is_valid: error_count == 0,
        }
    }

    /// Number of expense rows carrying at least one issue.
    pub fn flagged_rows(&self) -> usize {
        self.error_flags.iter().filter(|flag| **flag).count()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Renders the report as a markdown document for review.
    pub fn to_markdown(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("# Allocation Report: {}\n\n", self.group.name));
        output.push_str(&format!("Group ID: {}\n\n", self.group.id));

        output.push_str("## Member Columns\n\n");
        for column in &self.member_columns {
            match &column.resolution {
                Resolution::Resolved(member) => output.push_str(&format!(
                    "- `{}` -> {} (id {})\n",
                    column.column_key, member.name, member.id
                )),
                Resolution::Unknown => output.push_str(&format!(
                    "- `{}` -> **[UNMATCHED]**\n",
                    column.column_key
                )),
                Resolution::Ambiguous => output.push_str(&format!(
                    "- `{}` -> **[AMBIGUOUS]**\n",
                    column.column_key
                )),
            }
        }
        output.push('\n');

        output.push_str("## Expenses\n\n");
        output.push_str("| Row | Description | Date | Amount | Currency | Paid by | Owed Total | Status |\n");
        output.push_str("|-----|-------------|------|--------|----------|---------|------------|--------|\n");
        for (expense, messages) in self.expenses.iter().zip(&self.error_messages) {
            let date = expense
                .row
                .date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default();
            let amount = expense
                .row
                .amount
                .map(|a| format!("{:.2}", a))
                .unwrap_or_else(|| expense.row.amount_raw.clone());
            let status = if messages.is_empty() {
                "OK".to_string()
            } else {
                format!("{} error(s)", messages.len())
            };
            output.push_str(&format!(
                "| {} | {} | {} | {} | {} | {} | {:.2} | {} |\n",
                expense.row.row_index,
                expense.row.description,
                date,
                amount,
                expense.row.currency,
                expense.row.paid_by,
                expense.owed_sum(),
                status
            ));
        }
        output.push('\n');

        if self.error_count > 0 {
            output.push_str("## Errors\n\n");
            for (expense, messages) in self.expenses.iter().zip(&self.error_messages) {
                for message in messages {
                    output.push_str(&format!("- Row {}: {}\n", expense.row.row_index, message));
                }
            }
            output.push('\n');
            output.push_str(&format!(
                "**Batch status:** {} error(s) across {} row(s)\n",
                self.error_count,
                self.flagged_rows()
            ));
        } else {
            output.push_str(&format!(
                "**Batch status:** READY ({} expense rows)\n",
                self.expenses.len()
            ));
        }

        output
    }
}
