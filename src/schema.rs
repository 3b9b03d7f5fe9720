use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Header prefix marking an expenses-sheet column as a per-member
/// contribution column. The text after the prefix must match a member name
/// from the members sheet exactly.
pub const MEMBER_COLUMN_PREFIX: &str = "_";

/// One parsed spreadsheet cell.
///
/// Serialized untagged, so JSON `null`, booleans, numbers and strings map
/// straight onto the variants. The engine never touches raw workbook files;
/// callers hand it cells in this form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum CellValue {
    #[schemars(description = "An empty cell")]
    Empty,

    #[schemars(description = "A boolean cell, e.g. a checkbox column")]
    Bool(bool),

    #[schemars(description = "A numeric cell")]
    Number(f64),

    #[schemars(description = "A text cell")]
    Text(String),
}

impl Default for CellValue {
    fn default() -> Self {
        Self::Empty
    }
}

impl CellValue {
    /// True when the cell carries no value: `Empty`, blank text, or NaN.
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Bool(_) => false,
            CellValue::Number(n) => n.is_nan(),
            CellValue::Text(t) => t.trim().is_empty(),
        }
    }

    /// Numeric view of the cell. Text is parsed after trimming; booleans and
    /// non-finite numbers are not numeric.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) if n.is_finite() => Some(*n),
            CellValue::Text(t) => t.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
            _ => None,
        }
    }

    /// Integer view of the cell, accepting whole-valued numbers and integer
    /// text. Used for ledger member ids.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            CellValue::Number(n) if n.is_finite() && n.fract() == 0.0 => Some(*n as i64),
            CellValue::Text(t) => {
                let t = t.trim();
                t.parse::<i64>().ok().or_else(|| {
                    t.parse::<f64>()
                        .ok()
                        .filter(|v| v.is_finite() && v.fract() == 0.0)
                        .map(|v| v as i64)
                })
            }
            _ => None,
        }
    }

    /// Display text of the cell, trimmed. Empty cells render as "".
    pub fn as_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Bool(b) => b.to_string(),
            CellValue::Number(n) => n.to_string(),
            CellValue::Text(t) => t.trim().to_string(),
        }
    }

    /// Flag semantics for the "All equal" column: true booleans, the tokens
    /// y/yes/true/1 in any case, and nonzero numbers count as set. Everything
    /// else, including an empty cell, is false.
    pub fn is_truthy(&self) -> bool {
        match self {
            CellValue::Bool(b) => *b,
            CellValue::Number(n) => n.is_finite() && *n != 0.0,
            CellValue::Text(t) => {
                matches!(
                    t.trim().to_ascii_lowercase().as_str(),
                    "y" | "yes" | "true" | "1"
                )
            }
            CellValue::Empty => false,
        }
    }
}

/// One already-parsed sheet: a header row plus data rows. Rows shorter than
/// the header row are treated as padded with empty cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SheetTable {
    #[schemars(description = "Sheet name as it appeared in the workbook")]
    pub name: String,

    #[schemars(description = "Header row. Member contribution columns start with '_'")]
    pub headers: Vec<String>,

    #[schemars(description = "Data rows, one Vec per row, in sheet order")]
    pub rows: Vec<Vec<CellValue>>,
}

impl SheetTable {
    /// Finds a header by name, ignoring surrounding whitespace and case.
    pub fn column_index(&self, header: &str) -> Option<usize> {
        self.headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(header))
    }

    /// True when every cell of the row is empty. Trailing blank rows are
    /// normal in hand-edited workbooks and are skipped during ingestion.
    pub fn row_is_empty(row: &[CellValue]) -> bool {
        row.iter().all(CellValue::is_empty)
    }
}

/// Identity of the group an upload belongs to, supplied by the caller and
/// echoed back in the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GroupRef {
    #[schemars(description = "Ledger-side id of the group")]
    pub id: i64,

    #[schemars(description = "Display name of the group")]
    pub name: String,
}

/// One group member. Identity is the (name, id) pair; names must be unique
/// within an upload for columns and payers to resolve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MemberRecord {
    #[schemars(description = "Display name, matched verbatim against member columns and 'Paid by'")]
    pub name: String,

    #[schemars(description = "Ledger-side id of the member")]
    pub id: i64,
}

/// The pipeline input: a group reference plus the two parsed sheets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct UploadBatch {
    #[schemars(description = "Group this batch of expenses belongs to")]
    pub group: GroupRef,

    #[schemars(description = "Members sheet with 'Name' and 'ID' columns")]
    pub members: SheetTable,

    #[schemars(description = "Expenses sheet with the fixed columns plus one '_<name>' column per member")]
    pub expenses: SheetTable,
}

impl UploadBatch {
    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(UploadBatch)
    }

    /// JSON Schema of the input contract, for collaborators that produce
    /// `UploadBatch` values from workbook files.
    pub fn schema_as_json() -> Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}
