use crate::schema::{MemberRecord, MEMBER_COLUMN_PREFIX};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Outcome of resolving a name against the member directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "PascalCase")]
pub enum Resolution {
    Resolved(MemberRecord),
    Unknown,
    Ambiguous,
}

impl Resolution {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Resolution::Resolved(_))
    }
}

/// Binding of one `_`-prefixed expenses-sheet column to a member identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberColumn {
    /// Header as it appears in the sheet, prefix included.
    pub column_key: String,
    /// Member name with the prefix stripped and trimmed.
    pub name: String,
    /// Position of the column in the expenses sheet.
    pub column_index: usize,
    pub resolution: Resolution,
}

/// Name lookup over the members sheet, built once per batch and reused by
/// every downstream stage so identity never drifts between them.
///
/// Duplicate display names are legal in the member set itself (two people can
/// share a first name) but any lookup of such a name is refused, because a
/// column or payer reference to it cannot be attributed to one person.
#[derive(Debug, Clone)]
pub struct MemberDirectory {
    members: Vec<MemberRecord>,
    by_name: HashMap<String, Vec<usize>>,
}

impl MemberDirectory {
    pub fn new(members: Vec<MemberRecord>) -> Self {
        let mut by_name: HashMap<String, Vec<usize>> = HashMap::new();
        for (index, member) in members.iter().enumerate() {
            by_name.entry(member.name.clone()).or_default().push(index);
        }
        Self { members, by_name }
    }

    /// All members in sheet order.
    pub fn members(&self) -> &[MemberRecord] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Resolves a display name to a member. Never picks silently among
    /// duplicates.
    pub fn lookup(&self, name: &str) -> Resolution {
        match self.by_name.get(name.trim()).map(Vec::as_slice) {
            Some([index]) => Resolution::Resolved(self.members[*index].clone()),
            Some(_) => Resolution::Ambiguous,
            None => Resolution::Unknown,
        }
    }
}

/// Scans the expenses-sheet headers and binds every member column. Columns
/// without the reserved prefix belong to the fixed layout and are ignored
/// here.
pub fn bind_member_columns(headers: &[String], directory: &MemberDirectory) -> Vec<MemberColumn> {
    headers
        .iter()
        .enumerate()
        .filter_map(|(column_index, header)| {
            let stripped = header.trim().strip_prefix(MEMBER_COLUMN_PREFIX)?;
            let name = stripped.trim().to_string();
            Some(MemberColumn {
                column_key: header.trim().to_string(),
                resolution: directory.lookup(&name),
                name,
                column_index,
            })
        })
        .collect()
}
