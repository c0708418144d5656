//! End-to-end tests of the engine over a small JSON snapshot.

use chrono::NaiveDate;
use ledgerbook_core::{AccountId, GroupId, Snapshot};
use ledgerbook_engine::{
    AggregationMode, HierarchyError, LedgerView, MonthlySeries, NodeId, NodeKind,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashSet;

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

fn ids(names: &[&str]) -> HashSet<AccountId> {
    names.iter().copied().map(AccountId::new).collect()
}

const SNAPSHOT: &str = r#"{
  "version": 7,
  "groups": [
    { "id": "g-assets", "number": "1", "name": "Assets" },
    { "id": "g-bank", "number": "12", "name": "Bank", "parent_id": "g-assets" },
    { "id": "g-liab", "number": "3", "name": "Liabilities" },
    { "id": "g-income", "number": "8", "name": "Income" }
  ],
  "accounts": [
    { "id": "bank", "number": "1200", "name": "Bank", "type": "asset", "group_id": "g-bank" },
    { "id": "cash", "number": "1000", "name": "Cash", "type": "asset", "group_id": "g-assets" },
    { "id": "payables", "number": "3300", "name": "Payables", "type": "liability", "group_id": "g-liab" },
    { "id": "sales", "number": "8400", "name": "Sales", "type": "revenue", "group_id": "g-income" },
    { "id": "rent", "number": "4210", "name": "Rent", "type": "expense" },
    { "id": "capital", "number": "0800", "name": "Capital", "type": "equity" }
  ],
  "transactions": [
    { "id": "t1", "date": "2024-01-02", "amount": "5000", "debit_account_id": "bank", "credit_account_id": "capital" },
    { "id": "t2", "date": "2024-03-15", "amount": "1200.50", "debit_account_id": "bank", "credit_account_id": "sales" },
    { "id": "t3", "date": "2024-03-20", "amount": "100", "debit_account_id": "sales", "credit_account_id": "bank", "description": "credit note" },
    { "id": "t4", "date": "2024-04-01", "amount": "800", "debit_account_id": "rent", "credit_account_id": "payables" },
    { "id": "t5", "date": "2024-05-01", "amount": "800", "debit_account_id": "rent", "credit_account_id": "payables" },
    { "id": "t6", "date": "2024-05-10", "amount": "800", "debit_account_id": "payables", "credit_account_id": "bank" },
    { "id": "t7", "date": "2024-06-01", "amount": "200", "debit_account_id": "cash", "credit_account_id": "bank" },
    { "id": "t8", "date": "2023-12-31", "amount": "999", "debit_account_id": "bank", "credit_account_id": "sales" },
    { "id": "t9", "date": "2024-07-01", "amount": "10", "debit_account_id": "ghost", "credit_account_id": "bank" }
  ]
}"#;

fn snapshot() -> Snapshot {
    serde_json::from_str(SNAPSHOT).unwrap()
}

// ============================================================================
// Balances
// ============================================================================

#[test]
fn test_balances_follow_normal_sides() {
    let snapshot = snapshot();
    let report = LedgerView::new(&snapshot).balance_report();
    let b = &report.balances;

    // 5000 + 1200.50 - 100 - 800 - 200 + 999 - 10
    assert_eq!(b[&AccountId::new("bank")], dec!(6089.50));
    assert_eq!(b[&AccountId::new("cash")], dec!(200));
    assert_eq!(b[&AccountId::new("capital")], dec!(5000));
    assert_eq!(b[&AccountId::new("sales")], dec!(2099.50));
    assert_eq!(b[&AccountId::new("rent")], dec!(1600));
    assert_eq!(b[&AccountId::new("payables")], dec!(800));

    assert_eq!(report.skipped.skipped_debits, 1);
    assert_eq!(report.skipped.skipped_credits, 0);
    assert_eq!(report.skipped.skipped_transactions, 0);
    assert!(report.skipped.unresolved_accounts.contains("ghost"));
}

#[test]
fn test_balance_report_serializes() {
    let snapshot = snapshot();
    let report = LedgerView::new(&snapshot).balance_report();
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["skipped"]["skipped_debits"], 1);
    assert!(json["balances"].get("bank").is_some());
}

// ============================================================================
// Hierarchy
// ============================================================================

#[test]
fn test_hierarchy_display_order() {
    let snapshot = snapshot();
    let tree = LedgerView::new(&snapshot).hierarchy().unwrap();

    let order: Vec<(usize, &str)> = tree
        .walk()
        .into_iter()
        .map(|node| (node.level, node.number.as_str()))
        .collect();
    assert_eq!(
        order,
        vec![
            (0, "0800"),
            (0, "1"),
            (1, "1000"),
            (1, "12"),
            (2, "1200"),
            (0, "3"),
            (1, "3300"),
            (0, "4210"),
            (0, "8"),
            (1, "8400"),
        ]
    );

    let bank = tree.account(&AccountId::new("bank")).unwrap();
    assert_eq!(bank.kind, NodeKind::Account(ledgerbook_core::AccountType::Asset));
    assert_eq!(tree.parent(bank).unwrap().name, "Bank");
}

#[test]
fn test_rollup_sums_descendants() {
    let snapshot = snapshot();
    let view = LedgerView::new(&snapshot);
    let tree = view.hierarchy().unwrap();
    let rolled = tree.rollup(&view.balances());

    assert_eq!(rolled[&NodeId::Group(GroupId::new("g-bank"))], dec!(6089.50));
    assert_eq!(rolled[&NodeId::Group(GroupId::new("g-assets"))], dec!(6289.50));
    assert_eq!(rolled[&NodeId::Account(AccountId::new("rent"))], dec!(1600));
}

#[test]
fn test_hierarchy_cycle_is_an_error() {
    let mut snapshot = snapshot();
    for group in &mut snapshot.groups {
        if group.id.as_str() == "g-assets" {
            group.parent_id = Some(GroupId::new("g-bank"));
        }
    }

    let err = LedgerView::new(&snapshot).hierarchy().unwrap_err();
    match err {
        HierarchyError::Cycle { groups } => {
            assert_eq!(groups.len(), 2);
            assert!(groups.contains(&GroupId::new("g-assets")));
            assert!(groups.contains(&GroupId::new("g-bank")));
        }
        other => panic!("expected cycle, got {other:?}"),
    }
}

// ============================================================================
// Monthly series
// ============================================================================

#[test]
fn test_cash_flow_for_bank_accounts() {
    let snapshot = snapshot();
    let series = LedgerView::new(&snapshot)
        .monthly(2024, &ids(&["bank", "cash"]), AggregationMode::CashFlow)
        .unwrap();

    let MonthlySeries::CashFlow(months) = &series else {
        panic!("expected cash-flow series");
    };
    assert_eq!(months[0].income, dec!(5000));
    assert_eq!(months[2].income, dec!(1200.50));
    assert_eq!(months[2].expenses, dec!(100));
    assert_eq!(months[4].expenses, dec!(800));
    // Transfer between two selected accounts shows up on both sides.
    assert_eq!(months[5].income, dec!(200));
    assert_eq!(months[5].expenses, dec!(200));
    assert_eq!(months[11].start, date(2024, 12, 1));
    // The 2023 booking is outside the year.
    assert_eq!(series.total(), dec!(5000) + dec!(1200.50) - dec!(100) - dec!(800) - dec!(10));
}

#[test]
fn test_revenue_nets_credit_notes() {
    let snapshot = snapshot();
    let series = LedgerView::new(&snapshot)
        .monthly(2024, &ids(&["sales"]), AggregationMode::Revenue)
        .unwrap();

    let MonthlySeries::Revenue(months) = &series else {
        panic!("expected revenue series");
    };
    assert_eq!(months[2].value, dec!(1100.50));
    assert!(months.iter().enumerate().all(|(i, m)| i == 2 || m.value == Decimal::ZERO));

    let previous = LedgerView::new(&snapshot)
        .monthly(2023, &ids(&["sales"]), AggregationMode::Revenue)
        .unwrap();
    assert_eq!(previous.total(), dec!(999));
}

// ============================================================================
// Open items
// ============================================================================

#[test]
fn test_payables_open_items() {
    let snapshot = snapshot();
    let view = LedgerView::new(&snapshot);
    let payables = AccountId::new("payables");

    let mid_april = view.reconcile(&payables, date(2024, 4, 30));
    assert_eq!(mid_april.balance, dec!(800));
    assert_eq!(mid_april.open_item_count, 1);

    let year_end = view.reconcile(&payables, date(2024, 12, 31));
    assert_eq!(year_end.balance, dec!(800));
    assert_eq!(year_end.open_item_count, 1);
    assert_eq!(year_end.open_items[0].transaction_id.as_str(), "t5");
    assert_eq!(year_end.open_items[0].counter_account.as_str(), "rent");
}

// ============================================================================
// Idempotence
// ============================================================================

#[test]
fn test_every_view_is_idempotent() {
    let snapshot = snapshot();
    let view = LedgerView::new(&snapshot);
    let selected = ids(&["bank"]);

    assert_eq!(view.balance_report(), view.balance_report());
    assert_eq!(view.hierarchy(), view.hierarchy());
    assert_eq!(
        view.monthly(2024, &selected, AggregationMode::CashFlow),
        view.monthly(2024, &selected, AggregationMode::CashFlow)
    );
    assert_eq!(
        view.reconcile(&AccountId::new("payables"), date(2024, 12, 31)),
        view.reconcile(&AccountId::new("payables"), date(2024, 12, 31))
    );
    assert_eq!(snapshot.version, 7);
}
