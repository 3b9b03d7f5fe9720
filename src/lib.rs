//! # Expense Split Engine
//!
//! A library for turning spreadsheet batches of shared expenses into exact
//! per-member allocations ready for a group ledger.
//!
//! Users fill an expenses sheet (one row per expense, one `_Name` column per
//! member) and a members sheet mapping display names to ledger ids. The
//! engine resolves names, computes paid and owed shares under each row's
//! split policy, absorbs cent-level rounding residue so every row sums
//! exactly, validates the batch, and plans the ledger push.
//!
//! ## Core Concepts
//!
//! - **Upload Batch**: The raw sheets plus the target group, as uploaded
//! - **Member Directory**: Name-to-member resolution, with duplicate names
//!   held as ambiguous rather than guessed at
//! - **Allocation**: One expense row with per-member paid/owed shares and any
//!   row-scoped issues found along the way
//! - **Reconciliation**: Sub-cent residue from rounding is folded into one
//!   randomly chosen share so owed totals match amounts exactly
//! - **Report**: Every row in order with positional error bookkeeping, valid
//!   only when no row carries an issue
//!
//! ## Example
//!
//! ```rust,ignore
//! use expense_split_engine::*;
//!
//! let batch = UploadBatch {
//!     group: GroupRef { id: 42, name: "Ski Trip".to_string() },
//!     members: members_sheet,
//!     expenses: expenses_sheet,
//! };
//!
//! let report = BatchProcessor::process(batch)?;
//! if report.is_valid {
//!     let planned = prepare_ledger_push(&report, acting_user_id)?;
//!     push_to_ledger(planned);
//! } else {
//!     println!("{}", report.to_markdown());
//! }
//! ```

pub mod engine;
pub mod error;
pub mod ingestion;
pub mod ledger;
pub mod reconciler;
pub mod report;
pub mod resolver;
pub mod schema;
pub mod template;
pub mod utils;
pub mod validator;

pub use engine::{allocate_expenses, ShareCalculator};
pub use error::{AllocationError, Result};
pub use ingestion::*;
pub use ledger::{prepare_ledger_push, LedgerExpense, LedgerShare, SplitDirective};
pub use reconciler::{reconcile_allocations, RoundingReconciler};
pub use report::AllocationReport;
pub use resolver::{bind_member_columns, MemberColumn, MemberDirectory, Resolution};
pub use schema::*;
pub use template::{enumerate_display_names, TemplateLayout};
pub use utils::*;
pub use validator::{validate_allocations, verify_owed_sums};

use log::{debug, info};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// One member's stake in a single expense.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberShare {
    pub member: MemberRecord,
    /// What this member fronted for the expense.
    pub share_paid: f64,
    /// What this member owes of the expense.
    pub share_owed: f64,
}

/// A parsed expense row together with its computed shares.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseAllocation {
    pub row: ExpenseRow,
    pub shares: Vec<MemberShare>,
    /// Row-scoped problems accumulated across the pipeline stages. Not
    /// serialized; the report carries rendered messages instead.
    #[serde(skip)]
    pub issues: Vec<AllocationError>,
}

impl ExpenseAllocation {
    pub fn owed_sum(&self) -> f64 {
        self.shares.iter().map(|s| s.share_owed).sum()
    }

    pub fn paid_sum(&self) -> f64 {
        self.shares.iter().map(|s| s.share_paid).sum()
    }

    /// The member marked as having paid, if any share carries a payment.
    pub fn payer(&self) -> Option<&MemberRecord> {
        self.shares
            .iter()
            .find(|s| s.share_paid != 0.0)
            .map(|s| &s.member)
    }
}

/// Runs the full pipeline: ingestion, share calculation, rounding
/// reconciliation, validation, report assembly.
pub struct BatchProcessor;

impl BatchProcessor {
    pub fn process(batch: UploadBatch) -> Result<AllocationReport> {
        Self::process_with_tolerance(batch, TOLERANCE)
    }

    pub fn process_with_tolerance(batch: UploadBatch, tolerance: f64) -> Result<AllocationReport> {
        let mut rng = rand::thread_rng();
        Self::process_with_rng(batch, tolerance, &mut rng)
    }

    /// Full pipeline with a caller-supplied random source. Seed the generator
    /// to make reconciliation reproducible.
    pub fn process_with_rng<R: Rng>(
        batch: UploadBatch,
        tolerance: f64,
        rng: &mut R,
    ) -> Result<AllocationReport> {
        info!(
            "Processing batch for group '{}' ({} expense rows)",
            batch.group.name,
            batch.expenses.rows.len()
        );

        let parsed = parse_batch(batch)?;
        debug!(
            "Resolved {} of {} member columns",
            parsed
                .columns
                .iter()
                .filter(|c| c.resolution.is_resolved())
                .count(),
            parsed.columns.len()
        );

        let allocations = allocate_expenses(&parsed.directory, &parsed.columns, parsed.rows);
        let allocations = RoundingReconciler::new(tolerance).reconcile(allocations, rng);
        let allocations = validate_allocations(allocations, tolerance);

        let report = AllocationReport::new(parsed.group, parsed.columns, allocations);
        if report.is_valid {
            info!("Batch is clean: {} rows ready to push", report.expenses.len());
        } else {
            info!(
                "Batch has {} issue(s) across {} row(s)",
                report.error_count,
                report.flagged_rows()
            );
        }

        Ok(report)
    }
}

pub fn process_batch(batch: UploadBatch) -> Result<AllocationReport> {
    BatchProcessor::process(batch)
}

pub fn process_batch_with_rng<R: Rng>(
    batch: UploadBatch,
    tolerance: f64,
    rng: &mut R,
) -> Result<AllocationReport> {
    BatchProcessor::process_with_rng(batch, tolerance, rng)
}
