use expense_split_engine::{
    prepare_ledger_push, BatchProcessor, CellValue, GroupRef, SheetTable, SplitDirective,
    UploadBatch,
};

fn text(value: &str) -> CellValue {
    CellValue::Text(value.to_string())
}

fn num(value: f64) -> CellValue {
    CellValue::Number(value)
}

fn main() {
    let batch = UploadBatch {
        group: GroupRef {
            id: 3141,
            name: "Weekend in Lisbon".to_string(),
        },
        members: SheetTable {
            name: "Members".to_string(),
            headers: vec!["Name".to_string(), "ID".to_string()],
            rows: vec![
                vec![text("Alice"), num(1.0)],
                vec![text("Bob"), num(2.0)],
                vec![text("Carol"), num(3.0)],
            ],
        },
        expenses: SheetTable {
            name: "Expenses".to_string(),
            headers: vec![
                "ID".to_string(),
                "Description".to_string(),
                "Date".to_string(),
                "Amount".to_string(),
                "Currency".to_string(),
                "Paid by".to_string(),
                "All equal".to_string(),
                "Split type".to_string(),
                "_Alice".to_string(),
                "_Bob".to_string(),
                "_Carol".to_string(),
            ],
            rows: vec![
                vec![
                    CellValue::Empty,
                    text("Museum tickets"),
                    text("2024-05-18"),
                    num(36.0),
                    text("EUR"),
                    text("Alice"),
                    CellValue::Bool(true),
                    CellValue::Empty,
                    CellValue::Empty,
                    CellValue::Empty,
                    CellValue::Empty,
                ],
                vec![
                    CellValue::Empty,
                    text("Dinner at the Time Out Market"),
                    text("2024-05-18"),
                    num(120.0),
                    text("EUR"),
                    text("Bob"),
                    CellValue::Bool(false),
                    text("share"),
                    num(50.0),
                    num(30.0),
                    num(20.0),
                ],
                vec![
                    CellValue::Empty,
                    text("Airport taxi"),
                    text("2024-05-19"),
                    num(25.0),
                    text("EUR"),
                    text("Alice"),
                    CellValue::Bool(false),
                    text("amount"),
                    num(10.0),
                    num(15.0),
                    CellValue::Empty,
                ],
            ],
        },
    };

    let report = BatchProcessor::process(batch).expect("batch should process");

    println!("{}", report.to_markdown());

    if report.is_valid {
        let planned = prepare_ledger_push(&report, 1).expect("valid batch should plan");
        println!("Planned ledger entries (pushing as Alice):");
        for entry in &planned {
            match &entry.directive {
                SplitDirective::EqualSplit => println!(
                    " - {} | {} | {:.2} {} | ledger equal split",
                    entry.date, entry.description, entry.amount, entry.currency
                ),
                SplitDirective::ByShares { shares } => println!(
                    " - {} | {} | {:.2} {} | {} explicit shares",
                    entry.date,
                    entry.description,
                    entry.amount,
                    entry.currency,
                    shares.len()
                ),
            }
        }
    }
}
