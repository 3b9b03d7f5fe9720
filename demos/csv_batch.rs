use anyhow::Result;
use csv::ReaderBuilder;
use expense_split_engine::{process_batch, CellValue, GroupRef, SheetTable, UploadBatch};

const MEMBERS_CSV: &str = "\
Name,ID
Alice,1
Bob,2
Carol,3
";

const EXPENSES_CSV: &str = "\
ID,Description,Date,Amount,Currency,Paid by,All equal,Split type,_Alice,_Bob,_Carol
,Rent,2024-06-01,1500,EUR,Alice,true,,,,
,Cleaning supplies,2024-06-03,60,EUR,Bob,false,share,50,50,
,Takeaway,2024-06-05,47.9,EUR,Carol,false,equal,1,,1
";

/// CSV fields arrive as text; the engine's cell coercion handles numbers,
/// booleans and dates from there.
fn sheet_from_csv(name: &str, data: &str) -> Result<SheetTable> {
    let mut reader = ReaderBuilder::new().from_reader(data.as_bytes());
    let headers = reader.headers()?.iter().map(|h| h.to_string()).collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(
            record
                .iter()
                .map(|field| {
                    if field.trim().is_empty() {
                        CellValue::Empty
                    } else {
                        CellValue::Text(field.to_string())
                    }
                })
                .collect(),
        );
    }

    Ok(SheetTable {
        name: name.to_string(),
        headers,
        rows,
    })
}

fn main() -> Result<()> {
    let batch = UploadBatch {
        group: GroupRef {
            id: 88,
            name: "Flat 4B".to_string(),
        },
        members: sheet_from_csv("Members", MEMBERS_CSV)?,
        expenses: sheet_from_csv("Expenses", EXPENSES_CSV)?,
    };

    let report = process_batch(batch)?;
    println!("{}", report.to_markdown());

    Ok(())
}
