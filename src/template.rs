use crate::schema::{CellValue, MemberRecord, SheetTable, MEMBER_COLUMN_PREFIX};
use std::collections::HashMap;

pub const EXPENSE_SHEET_NAME: &str = "Expenses";
pub const MEMBER_SHEET_NAME: &str = "Members";

/// Column names shared between template generation and ingestion. The parser
/// resolves headers against these exact strings.
pub const EXPENSE_ID_COLUMN: &str = "ID";
pub const EXPENSE_DESCRIPTION_COLUMN: &str = "Description";
pub const EXPENSE_DATE_COLUMN: &str = "Date";
pub const EXPENSE_AMOUNT_COLUMN: &str = "Amount";
pub const EXPENSE_CURRENCY_COLUMN: &str = "Currency";
pub const EXPENSE_PAID_BY_COLUMN: &str = "Paid by";
pub const EXPENSE_ALL_EQUAL_COLUMN: &str = "All equal";
pub const EXPENSE_SPLIT_TYPE_COLUMN: &str = "Split type";

pub const MEMBER_NAME_COLUMN: &str = "Name";
pub const MEMBER_ID_COLUMN: &str = "ID";

/// Fixed columns of the expenses sheet, in order. Member columns follow.
pub const BASE_EXPENSE_HEADERS: [&str; 8] = [
    EXPENSE_ID_COLUMN,
    EXPENSE_DESCRIPTION_COLUMN,
    EXPENSE_DATE_COLUMN,
    EXPENSE_AMOUNT_COLUMN,
    EXPENSE_CURRENCY_COLUMN,
    EXPENSE_PAID_BY_COLUMN,
    EXPENSE_ALL_EQUAL_COLUMN,
    EXPENSE_SPLIT_TYPE_COLUMN,
];

pub const MEMBER_HEADERS: [&str; 2] = [MEMBER_NAME_COLUMN, MEMBER_ID_COLUMN];

/// Disambiguates duplicate names by numbering every occurrence, in first
/// appearance order. Unique names pass through untouched.
///
/// Column headers and "Paid by" cells address members by name, so two
/// members who share one would be unresolvable. `["Alice", "Bob", "Alice"]`
/// becomes `["Alice 1", "Bob", "Alice 2"]`.
pub fn enumerate_display_names(raw_names: &[String]) -> Vec<String> {
    let mut totals: HashMap<&str, usize> = HashMap::new();
    for name in raw_names {
        *totals.entry(name.as_str()).or_insert(0) += 1;
    }

    let mut seen: HashMap<&str, usize> = HashMap::new();
    raw_names
        .iter()
        .map(|name| {
            let count = seen.entry(name.as_str()).or_insert(0);
            *count += 1;
            if totals[name.as_str()] > 1 {
                format!("{} {}", name, count)
            } else {
                name.clone()
            }
        })
        .collect()
}

/// The sheet structure handed to users as an upload template for one group.
#[derive(Debug, Clone)]
pub struct TemplateLayout {
    pub expense_headers: Vec<String>,
    pub members: Vec<MemberRecord>,
}

impl TemplateLayout {
    /// Builds the layout for a group roster of (name, id) pairs.
    pub fn for_members(roster: &[(String, i64)]) -> Self {
        let raw: Vec<String> = roster.iter().map(|(name, _)| name.clone()).collect();
        let members: Vec<MemberRecord> = enumerate_display_names(&raw)
            .into_iter()
            .zip(roster)
            .map(|(name, (_, id))| MemberRecord { name, id: *id })
            .collect();

        let mut expense_headers: Vec<String> =
            BASE_EXPENSE_HEADERS.iter().map(|h| h.to_string()).collect();
        for member in &members {
            expense_headers.push(format!("{}{}", MEMBER_COLUMN_PREFIX, member.name));
        }

        TemplateLayout {
            expense_headers,
            members,
        }
    }

    /// An empty expenses sheet with the headers in place.
    pub fn expense_sheet(&self) -> SheetTable {
        SheetTable {
            name: EXPENSE_SHEET_NAME.to_string(),
            headers: self.expense_headers.clone(),
            rows: Vec::new(),
        }
    }

    /// The members sheet, prefilled with the enumerated roster.
    pub fn member_sheet(&self) -> SheetTable {
        SheetTable {
            name: MEMBER_SHEET_NAME.to_string(),
            headers: MEMBER_HEADERS.iter().map(|h| h.to_string()).collect(),
            rows: self
                .members
                .iter()
                .map(|m| {
                    vec![
                        CellValue::Text(m.name.clone()),
                        CellValue::Number(m.id as f64),
                    ]
                })
                .collect(),
        }
    }
}
