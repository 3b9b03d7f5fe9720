use expense_split_engine::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fs;

fn text(value: &str) -> CellValue {
    CellValue::Text(value.to_string())
}

fn num(value: f64) -> CellValue {
    CellValue::Number(value)
}

fn cell_or_empty(value: &str) -> CellValue {
    if value.is_empty() {
        CellValue::Empty
    } else {
        text(value)
    }
}

fn member_sheet(roster: &[(&str, f64)]) -> SheetTable {
    SheetTable {
        name: "Members".to_string(),
        headers: vec!["Name".to_string(), "ID".to_string()],
        rows: roster
            .iter()
            .map(|(name, id)| vec![text(name), num(*id)])
            .collect(),
    }
}

fn expense_headers(member_names: &[&str]) -> Vec<String> {
    let mut headers: Vec<String> = [
        "ID",
        "Description",
        "Date",
        "Amount",
        "Currency",
        "Paid by",
        "All equal",
        "Split type",
    ]
    .iter()
    .map(|h| h.to_string())
    .collect();
    for name in member_names {
        headers.push(format!("_{}", name));
    }
    headers
}

fn expense_row(
    description: &str,
    date: &str,
    amount: CellValue,
    paid_by: &str,
    all_equal: bool,
    split_type: &str,
    member_cells: Vec<CellValue>,
) -> Vec<CellValue> {
    let mut row = vec![
        CellValue::Empty,
        text(description),
        cell_or_empty(date),
        amount,
        text("USD"),
        text(paid_by),
        CellValue::Bool(all_equal),
        cell_or_empty(split_type),
    ];
    row.extend(member_cells);
    row
}

fn ski_trip_batch() -> UploadBatch {
    UploadBatch {
        group: GroupRef {
            id: 1001,
            name: "Ski Trip 2024".to_string(),
        },
        members: member_sheet(&[("Alice", 1.0), ("Bob", 2.0), ("Carol", 3.0)]),
        expenses: SheetTable {
            name: "Expenses".to_string(),
            headers: expense_headers(&["Alice", "Bob", "Carol"]),
            rows: vec![
                expense_row(
                    "Cabin rental",
                    "2024-02-09",
                    num(300.0),
                    "Alice",
                    true,
                    "",
                    vec![CellValue::Empty, CellValue::Empty, CellValue::Empty],
                ),
                expense_row(
                    "Dinner out",
                    "2024-02-10",
                    num(120.0),
                    "Bob",
                    false,
                    "share",
                    vec![num(50.0), num(25.0), num(25.0)],
                ),
                expense_row(
                    "Lift tickets",
                    "2024-02-10",
                    num(45.5),
                    "Carol",
                    false,
                    "amount",
                    vec![num(20.25), CellValue::Empty, num(25.25)],
                ),
                expense_row(
                    "Groceries",
                    "2024-02-11",
                    num(100.0),
                    "Alice",
                    false,
                    "equal",
                    vec![num(1.0), num(1.0), num(1.0)],
                ),
            ],
        },
    }
}

#[test]
fn test_ski_trip_mixed_policies() {
    let mut rng = StdRng::seed_from_u64(2024);
    let report = BatchProcessor::process_with_rng(ski_trip_batch(), TOLERANCE, &mut rng)
        .expect("batch should process");

    assert!(report.is_valid, "unexpected issues: {:?}", report.error_messages);
    assert_eq!(report.expenses.len(), 4);

    // Every row's owed shares must cover its amount exactly, and every row
    // must carry exactly one payment matching the amount.
    for expense in &report.expenses {
        let amount = expense.row.amount.unwrap();
        assert!(
            (expense.owed_sum() - amount).abs() < 1e-6,
            "row {} owed {} vs amount {}",
            expense.row.row_index,
            expense.owed_sum(),
            amount
        );
        assert!((expense.paid_sum() - amount).abs() < 1e-6);
        assert!(expense.payer().is_some());
    }

    let cabin = &report.expenses[0];
    assert_eq!(cabin.shares.len(), 3);
    assert_eq!(cabin.payer().map(|m| m.id), Some(1));

    let dinner = &report.expenses[1];
    let alice = dinner.shares.iter().find(|s| s.member.id == 1).unwrap();
    assert!((alice.share_owed - 60.0).abs() < 0.01);

    let tickets = &report.expenses[2];
    assert_eq!(tickets.shares.len(), 2);
    assert!(tickets.shares.iter().all(|s| s.member.id != 2));

    assert!(verify_owed_sums(&report.expenses, TOLERANCE).is_ok());

    // Alice pushing her own all-equal expense can use the ledger's shortcut;
    // everything else needs explicit shares.
    let as_alice = prepare_ledger_push(&report, 1).expect("valid batch should plan");
    assert_eq!(as_alice.len(), 4);
    assert_eq!(as_alice[0].directive, SplitDirective::EqualSplit);
    assert!(matches!(as_alice[1].directive, SplitDirective::ByShares { .. }));
    assert!(matches!(as_alice[3].directive, SplitDirective::ByShares { .. }));

    let as_bob = prepare_ledger_push(&report, 2).expect("valid batch should plan");
    assert!(matches!(as_bob[0].directive, SplitDirective::ByShares { .. }));

    println!("✓ Ski trip mixed policy test passed");
}

#[test]
fn test_rounding_residue_reconciliation() {
    let batch = UploadBatch {
        group: GroupRef {
            id: 1002,
            name: "Flatmates".to_string(),
        },
        members: member_sheet(&[("Alice", 1.0), ("Bob", 2.0), ("Carol", 3.0)]),
        expenses: SheetTable {
            name: "Expenses".to_string(),
            headers: expense_headers(&["Alice", "Bob", "Carol"]),
            rows: vec![expense_row(
                "Internet bill",
                "2024-05-01",
                num(100.0),
                "Bob",
                true,
                "",
                vec![CellValue::Empty, CellValue::Empty, CellValue::Empty],
            )],
        },
    };

    let mut rng = StdRng::seed_from_u64(9);
    let report = BatchProcessor::process_with_rng(batch, TOLERANCE, &mut rng)
        .expect("batch should process");

    assert!(report.is_valid);
    let bill = &report.expenses[0];
    assert!(
        (bill.owed_sum() - 100.0).abs() < 1e-9,
        "residue should be absorbed, owed sum is {}",
        bill.owed_sum()
    );

    // 100 / 3 rounds to 33.33; exactly one member absorbs the extra cent.
    let mut bumped = 0;
    for share in &bill.shares {
        if (share.share_owed - 33.34).abs() < 1e-9 {
            bumped += 1;
        } else {
            assert!((share.share_owed - 33.33).abs() < 1e-9);
        }
    }
    assert_eq!(bumped, 1);

    println!("✓ Rounding residue reconciliation test passed");
}

#[test]
fn test_error_batch_surfaces_every_problem() {
    let batch = UploadBatch {
        group: GroupRef {
            id: 1003,
            name: "Office Lunch".to_string(),
        },
        members: member_sheet(&[("Alice", 1.0), ("Bob", 2.0), ("Carol", 3.0)]),
        expenses: SheetTable {
            name: "Expenses".to_string(),
            headers: expense_headers(&["Alice", "Bob", "Carol", "Dave"]),
            rows: vec![
                expense_row(
                    "Pizza",
                    "2024-04-01",
                    num(60.0),
                    "Alice",
                    false,
                    "vibes",
                    vec![CellValue::Empty, num(60.0), CellValue::Empty, CellValue::Empty],
                ),
                expense_row(
                    "Coffee",
                    "2024-04-02",
                    num(30.0),
                    "Alice",
                    false,
                    "equal",
                    vec![num(1.0), CellValue::Empty, CellValue::Empty, num(10.0)],
                ),
                expense_row(
                    "Snacks",
                    "2024-04-03",
                    CellValue::Empty,
                    "Alice",
                    false,
                    "equal",
                    vec![num(1.0), CellValue::Empty, CellValue::Empty, CellValue::Empty],
                ),
                expense_row(
                    "Cake",
                    "2024-04-04",
                    num(90.0),
                    "Zoe",
                    true,
                    "",
                    vec![CellValue::Empty, CellValue::Empty, CellValue::Empty, CellValue::Empty],
                ),
            ],
        },
    };

    let mut rng = StdRng::seed_from_u64(3);
    let report = BatchProcessor::process_with_rng(batch, TOLERANCE, &mut rng)
        .expect("batch should process");

    assert!(!report.is_valid);
    assert_eq!(report.error_flags, vec![true, true, true, true]);
    assert_eq!(report.flagged_rows(), 4);
    assert_eq!(report.error_count, 4);

    assert!(report.error_messages[0][0].contains("Unrecognized split type 'vibes'"));
    assert!(report.error_messages[1][0].contains("'Dave' does not match any member"));
    assert!(report.error_messages[2][0].contains("missing or not a positive number"));
    assert!(report.error_messages[3][0].contains("Payer 'Zoe'"));

    // A flagged batch must never reach the ledger.
    match prepare_ledger_push(&report, 1) {
        Err(AllocationError::BatchNotCommittable(count)) => assert_eq!(count, 4),
        other => panic!("expected refusal, got {:?}", other),
    }

    println!("✓ Error batch test passed");
}

#[test]
fn test_duplicate_names_poison_only_referencing_rows() {
    let batch = UploadBatch {
        group: GroupRef {
            id: 1004,
            name: "Book Club".to_string(),
        },
        members: member_sheet(&[("Alice", 1.0), ("Alice", 4.0), ("Bob", 2.0)]),
        expenses: SheetTable {
            name: "Expenses".to_string(),
            headers: expense_headers(&["Alice", "Bob"]),
            rows: vec![
                expense_row(
                    "Books",
                    "2024-03-10",
                    num(90.0),
                    "Bob",
                    true,
                    "",
                    vec![CellValue::Empty, CellValue::Empty],
                ),
                expense_row(
                    "Wine",
                    "2024-03-10",
                    num(40.0),
                    "Bob",
                    false,
                    "equal",
                    vec![num(1.0), CellValue::Empty],
                ),
            ],
        },
    };

    let mut rng = StdRng::seed_from_u64(5);
    let report = BatchProcessor::process_with_rng(batch, TOLERANCE, &mut rng)
        .expect("batch should process");

    // The all-equal row never names "Alice", so both Alices simply get their
    // cut and the row stays clean.
    let books = &report.expenses[0];
    assert!(report.error_messages[0].is_empty());
    assert_eq!(books.shares.len(), 3);
    assert!(books.shares.iter().any(|s| s.member.id == 1));
    assert!(books.shares.iter().any(|s| s.member.id == 4));

    // The row that addresses the duplicated column is the one that fails.
    assert!(report.error_flags[1]);
    assert!(report.error_messages[1]
        .iter()
        .any(|m| m.contains("appears more than once")));

    println!("✓ Duplicate member name test passed");
}

#[test]
fn test_blank_rows_keep_sheet_positions() {
    let blank = vec![CellValue::Empty; 11];
    let batch = UploadBatch {
        group: GroupRef {
            id: 1005,
            name: "Camping".to_string(),
        },
        members: member_sheet(&[("Alice", 1.0), ("Bob", 2.0), ("Carol", 3.0)]),
        expenses: SheetTable {
            name: "Expenses".to_string(),
            headers: expense_headers(&["Alice", "Bob", "Carol"]),
            rows: vec![
                expense_row(
                    "Firewood",
                    "2024-08-01",
                    num(20.0),
                    "Alice",
                    true,
                    "",
                    vec![CellValue::Empty, CellValue::Empty, CellValue::Empty],
                ),
                blank,
                expense_row(
                    "Marshmallows",
                    "2024-08-01",
                    num(10.0),
                    "Bob",
                    true,
                    "",
                    vec![CellValue::Empty, CellValue::Empty, CellValue::Empty],
                ),
            ],
        },
    };

    let mut rng = StdRng::seed_from_u64(5);
    let report = BatchProcessor::process_with_rng(batch, TOLERANCE, &mut rng)
        .expect("batch should process");

    assert_eq!(report.expenses.len(), 2);
    assert_eq!(report.expenses[0].row.row_index, 1);
    assert_eq!(report.expenses[1].row.row_index, 3);
}

#[test]
fn test_seeded_processing_is_reproducible() {
    let mut first_rng = StdRng::seed_from_u64(77);
    let first = BatchProcessor::process_with_rng(ski_trip_batch(), TOLERANCE, &mut first_rng)
        .expect("batch should process");

    let mut second_rng = StdRng::seed_from_u64(77);
    let second = BatchProcessor::process_with_rng(ski_trip_batch(), TOLERANCE, &mut second_rng)
        .expect("batch should process");

    assert_eq!(
        first.to_json().unwrap(),
        second.to_json().unwrap(),
        "same seed must yield an identical report"
    );
}

#[test]
fn test_template_round_trip() {
    let layout = TemplateLayout::for_members(&[
        ("Ana".to_string(), 11),
        ("Ana".to_string(), 12),
        ("Luis".to_string(), 13),
    ]);

    // Duplicate names come back enumerated so columns stay resolvable.
    assert_eq!(
        layout.members.iter().map(|m| m.name.as_str()).collect::<Vec<_>>(),
        vec!["Ana 1", "Ana 2", "Luis"]
    );

    let mut expenses = layout.expense_sheet();
    expenses.rows.push(vec![
        CellValue::Empty,
        text("Beach house"),
        text("2024-07-01"),
        num(75.0),
        text("EUR"),
        text("Ana 2"),
        CellValue::Bool(false),
        text("equal"),
        num(1.0),
        num(1.0),
        CellValue::Empty,
    ]);

    let batch = UploadBatch {
        group: GroupRef {
            id: 1006,
            name: "Verano".to_string(),
        },
        members: layout.member_sheet(),
        expenses,
    };

    let mut rng = StdRng::seed_from_u64(1);
    let report = BatchProcessor::process_with_rng(batch, TOLERANCE, &mut rng)
        .expect("template batch should process");

    assert!(report.is_valid, "issues: {:?}", report.error_messages);
    let house = &report.expenses[0];
    assert_eq!(house.shares.len(), 2);
    assert_eq!(house.payer().map(|m| m.id), Some(12));
    for share in &house.shares {
        assert!((share.share_owed - 37.5).abs() < 0.01);
    }

    println!("✓ Template round trip test passed");
}

#[test]
fn test_report_markdown_export() {
    let mut rng = StdRng::seed_from_u64(2024);
    let report = BatchProcessor::process_with_rng(ski_trip_batch(), TOLERANCE, &mut rng)
        .expect("batch should process");

    let markdown = report.to_markdown();
    assert!(markdown.contains("# Allocation Report: Ski Trip 2024"));
    assert!(markdown.contains("| Row | Description |"));
    assert!(markdown.contains("**Batch status:** READY"));

    fs::write("test_allocation_report.md", &markdown).expect("report file should write");

    println!("✓ Markdown export test passed - output: test_allocation_report.md");
}

#[test]
fn test_schema_generation() {
    let schema_json = UploadBatch::schema_as_json().expect("schema should serialize");

    assert!(schema_json.contains("UploadBatch"));
    assert!(schema_json.contains("members"));
    assert!(schema_json.contains("expenses"));
    assert!(schema_json.contains("headers"));

    fs::write("schema_output.json", &schema_json).expect("schema file should write");

    println!("✓ Schema generation test passed - output: schema_output.json");
}
