use crate::error::{AllocationError, Result};
use crate::resolver::{bind_member_columns, MemberColumn, MemberDirectory};
use crate::schema::{CellValue, GroupRef, MemberRecord, SheetTable, UploadBatch};
use crate::template::{
    EXPENSE_ALL_EQUAL_COLUMN, EXPENSE_AMOUNT_COLUMN, EXPENSE_CURRENCY_COLUMN,
    EXPENSE_DATE_COLUMN, EXPENSE_DESCRIPTION_COLUMN, EXPENSE_ID_COLUMN, EXPENSE_PAID_BY_COLUMN,
    EXPENSE_SPLIT_TYPE_COLUMN, MEMBER_ID_COLUMN, MEMBER_NAME_COLUMN,
};
use crate::utils::parse_iso_date;
use chrono::NaiveDate;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const EMPTY_CELL: CellValue = CellValue::Empty;

/// How an expense's amount is divided among the members listed on the row.
/// Parsed case-insensitively from the "Split type" cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitType {
    /// Member cells hold percentages of the amount.
    Share,
    /// Member cells hold absolute owed amounts.
    Amount,
    /// The amount is divided equally among the members with a cell entry.
    Equal,
}

impl SplitType {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "share" => Some(SplitType::Share),
            "amount" => Some(SplitType::Amount),
            "equal" => Some(SplitType::Equal),
            _ => None,
        }
    }
}

/// One expenses-sheet row after cell coercion, before any share computation.
///
/// A member absent from `cells` is not party to the expense. Cells that held
/// non-numeric garbage are preserved in `invalid_cells` for error reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseRow {
    /// 1-based position among the sheet's data rows.
    pub row_index: usize,
    /// The user-facing "ID" column, untouched by the engine.
    pub external_id: Option<String>,
    pub description: String,
    pub date: Option<NaiveDate>,
    /// None when the amount cell was empty or not numeric.
    pub amount: Option<f64>,
    /// Display text of the original amount cell, kept for error messages.
    pub amount_raw: String,
    pub currency: String,
    pub paid_by: String,
    /// The "All equal" flag: split across the whole group, cells ignored.
    pub split_all_equal: bool,
    pub split_type: Option<SplitType>,
    /// Original "Split type" text, kept for error messages.
    pub split_type_raw: String,
    /// Member name to contribution value, for every member column with a
    /// numeric cell on this row.
    pub cells: BTreeMap<String, f64>,
    /// (member name, cell text) pairs for member cells that were present but
    /// not numeric.
    pub invalid_cells: Vec<(String, String)>,
}

/// Output of ingestion: everything downstream stages need, with identity
/// resolved exactly once.
#[derive(Debug, Clone)]
pub struct ParsedBatch {
    pub group: GroupRef,
    pub directory: MemberDirectory,
    pub columns: Vec<MemberColumn>,
    pub rows: Vec<ExpenseRow>,
}

/// Normalizes an upload into typed rows and a member directory.
///
/// Only structural failures abort here: a missing required column, a members
/// sheet without usable rows, or a member without an integer id. Identity
/// problems on individual expense rows are left for the per-row stages.
pub fn parse_batch(batch: UploadBatch) -> Result<ParsedBatch> {
    let members = parse_members(&batch.members)?;
    let directory = MemberDirectory::new(members);
    let columns = bind_member_columns(&batch.expenses.headers, &directory);
    let rows = parse_expenses(&batch.expenses, &columns)?;

    debug!(
        "Parsed batch for group '{}': {} members, {} member columns, {} expense rows",
        batch.group.name,
        directory.len(),
        columns.len(),
        rows.len()
    );

    Ok(ParsedBatch {
        group: batch.group,
        directory,
        columns,
        rows,
    })
}

/// Reads the members sheet. The downstream ledger needs an integer id per
/// member, so a named row without one poisons the whole identity universe and
/// fails the batch.
pub fn parse_members(sheet: &SheetTable) -> Result<Vec<MemberRecord>> {
    let name_index = require_column(sheet, MEMBER_NAME_COLUMN)?;
    let id_index = require_column(sheet, MEMBER_ID_COLUMN)?;

    let mut members = Vec::new();
    for (position, row) in sheet.rows.iter().enumerate() {
        if SheetTable::row_is_empty(row) {
            continue;
        }

        let name_cell = cell_at(row, name_index);
        let name = name_cell.as_text();
        if name.is_empty() {
            continue;
        }

        let id_cell = cell_at(row, id_index);
        let id = id_cell
            .as_i64()
            .ok_or_else(|| AllocationError::InvalidMemberId {
                row: position + 1,
                name: name.clone(),
                value: id_cell.as_text(),
            })?;

        members.push(MemberRecord { name, id });
    }

    if members.is_empty() {
        return Err(AllocationError::EmptyMemberSheet);
    }

    Ok(members)
}

/// Reads the expenses sheet into `ExpenseRow`s, coercing each cell once.
/// Blank rows keep their position in the numbering but produce nothing.
pub fn parse_expenses(sheet: &SheetTable, columns: &[MemberColumn]) -> Result<Vec<ExpenseRow>> {
    let amount_index = require_column(sheet, EXPENSE_AMOUNT_COLUMN)?;
    let paid_by_index = require_column(sheet, EXPENSE_PAID_BY_COLUMN)?;
    let all_equal_index = require_column(sheet, EXPENSE_ALL_EQUAL_COLUMN)?;
    let split_type_index = require_column(sheet, EXPENSE_SPLIT_TYPE_COLUMN)?;

    let id_index = sheet.column_index(EXPENSE_ID_COLUMN);
    let description_index = sheet.column_index(EXPENSE_DESCRIPTION_COLUMN);
    let date_index = sheet.column_index(EXPENSE_DATE_COLUMN);
    let currency_index = sheet.column_index(EXPENSE_CURRENCY_COLUMN);

    let mut rows = Vec::new();
    for (position, raw) in sheet.rows.iter().enumerate() {
        if SheetTable::row_is_empty(raw) {
            continue;
        }

        let amount_cell = cell_at(raw, amount_index);
        let split_type_raw = cell_at(raw, split_type_index).as_text();

        let mut cells = BTreeMap::new();
        let mut invalid_cells = Vec::new();
        for column in columns {
            let cell = cell_at(raw, column.column_index);
            if cell.is_empty() {
                continue;
            }
            match cell.as_f64() {
                Some(value) => {
                    cells.insert(column.name.clone(), value);
                }
                None => invalid_cells.push((column.name.clone(), cell.as_text())),
            }
        }

        rows.push(ExpenseRow {
            row_index: position + 1,
            external_id: id_index.map(|i| cell_at(raw, i).as_text()).filter(|t| !t.is_empty()),
            description: description_index
                .map(|i| cell_at(raw, i).as_text())
                .unwrap_or_default(),
            date: date_index.and_then(|i| parse_iso_date(&cell_at(raw, i).as_text())),
            amount: amount_cell.as_f64(),
            amount_raw: amount_cell.as_text(),
            currency: currency_index
                .map(|i| cell_at(raw, i).as_text())
                .unwrap_or_default(),
            paid_by: cell_at(raw, paid_by_index).as_text(),
            split_all_equal: cell_at(raw, all_equal_index).is_truthy(),
            split_type: SplitType::parse(&split_type_raw),
            split_type_raw,
            cells,
            invalid_cells,
        });
    }

    Ok(rows)
}

fn require_column(sheet: &SheetTable, name: &str) -> Result<usize> {
    sheet
        .column_index(name)
        .ok_or_else(|| AllocationError::MissingColumn {
            sheet: sheet.name.clone(),
            column: name.to_string(),
        })
}

fn cell_at<'a>(row: &'a [CellValue], index: usize) -> &'a CellValue {
    row.get(index).unwrap_or(&EMPTY_CELL)
}
