use flow_reconstructor::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn reconstructors() -> Vec<LinkReconstructor> {
    vec![
        LinkReconstructor::with_strategy("continuous").unwrap(),
        LinkReconstructor::with_strategy("exact").unwrap(),
    ]
}

fn tx(splits: &[(&str, AccountType, Decimal)]) -> Transaction {
    splits
        .iter()
        .fold(Transaction::new("t"), |tx, (account, ty, value)| {
            tx.with_split(Split::new(*account, *ty, *value))
        })
}

/// Check a result against a fully determined link list, for both strategies.
fn assert_links(splits: &[(&str, AccountType, Decimal)], expected: &[(&str, &str, Decimal)]) {
    let expected: Vec<Link> = expected
        .iter()
        .map(|(s, t, v)| Link::new(*s, *t, *v))
        .collect();
    for reconstructor in reconstructors() {
        let links = reconstructor.reconstruct(&tx(splits)).unwrap();
        assert_eq!(
            links.links(),
            expected.as_slice(),
            "strategy {}",
            reconstructor.strategy_kind()
        );
    }
}

/// Sum of link values touching income or expense accounts.
fn income_expense_flow(links: &LinkSet, splits: &[(&str, AccountType, Decimal)]) -> Decimal {
    let non_asset: Vec<AccountId> = splits
        .iter()
        .filter(|(_, ty, _)| matches!(ty, AccountType::Income | AccountType::Expense))
        .map(|(a, _, _)| AccountId::new(*a))
        .collect();
    links
        .iter()
        .filter(|l| non_asset.contains(&l.source) || non_asset.contains(&l.target))
        .map(|l| l.value)
        .sum()
}

#[test]
fn one_asset_one_expense() {
    assert_links(
        &[
            ("a300", AccountType::Asset, dec!(-25.42)),
            ("a301", AccountType::Expense, dec!(25.42)),
        ],
        &[("a300", "a301", dec!(25.42))],
    );
}

#[test]
fn two_assets() {
    assert_links(
        &[
            ("a300", AccountType::Asset, dec!(-50.00)),
            ("a301", AccountType::Asset, dec!(50.00)),
        ],
        &[("a300", "a301", dec!(50.00))],
    );
}

#[test]
fn one_asset_two_expenses() {
    assert_links(
        &[
            ("a300", AccountType::Asset, dec!(-10.25)),
            ("a301", AccountType::Expense, dec!(8.66)),
            ("a302", AccountType::Expense, dec!(1.59)),
        ],
        &[("a300", "a301", dec!(8.66)), ("a300", "a302", dec!(1.59))],
    );
}

#[test]
fn two_assets_one_expense() {
    assert_links(
        &[
            ("a300", AccountType::Asset, dec!(-3.53)),
            ("a301", AccountType::Asset, dec!(-4.47)),
            ("a302", AccountType::Expense, dec!(8.00)),
        ],
        &[("a300", "a302", dec!(3.53)), ("a301", "a302", dec!(4.47))],
    );
}

#[test]
fn income_asset_expense_with_shrinking_asset() {
    assert_links(
        &[
            ("a300", AccountType::Income, dec!(-3.4)),
            ("a301", AccountType::Bank, dec!(-8.12)),
            ("a302", AccountType::Expense, dec!(11.52)),
        ],
        &[("a300", "a301", dec!(3.4)), ("a301", "a302", dec!(11.52))],
    );
}

#[test]
fn income_asset_expense_with_growing_asset() {
    assert_links(
        &[
            ("a300", AccountType::Income, dec!(-10.0)),
            ("a301", AccountType::Cash, dec!(2.45)),
            ("a302", AccountType::Expense, dec!(7.55)),
        ],
        &[("a300", "a301", dec!(10.0)), ("a301", "a302", dec!(7.55))],
    );
}

#[test]
fn income_asset_two_expenses() {
    assert_links(
        &[
            ("a300", AccountType::Income, dec!(-13.8)),
            ("a301", AccountType::Bank, dec!(-23.42)),
            ("a302", AccountType::Expense, dec!(27.32)),
            ("a303", AccountType::Expense, dec!(9.9)),
        ],
        &[
            ("a300", "a301", dec!(13.8)),
            ("a301", "a302", dec!(27.32)),
            ("a301", "a303", dec!(9.9)),
        ],
    );
}

#[test]
fn liability_behaves_like_asset() {
    assert_links(
        &[
            ("card", AccountType::Liability, dec!(-42.00)),
            ("fuel", AccountType::Expense, dec!(30.00)),
            ("food", AccountType::Expense, dec!(12.00)),
        ],
        &[("card", "fuel", dec!(30.00)), ("card", "food", dec!(12.00))],
    );
}

/// Which asset paid which expense is unknowable; only the total is fixed.
#[test]
fn two_assets_two_expenses_aggregate_sum() {
    let splits = [
        ("a300", AccountType::Asset, dec!(-20.00)),
        ("a301", AccountType::Bank, dec!(-15.50)),
        ("a302", AccountType::Expense, dec!(25.00)),
        ("a303", AccountType::Expense, dec!(10.50)),
    ];
    for reconstructor in reconstructors() {
        let links = reconstructor.reconstruct(&tx(&splits)).unwrap();
        let total = income_expense_flow(&links, &splits);
        assert!((total - dec!(35.50)).abs() <= dec!(0.02), "total {}", total);
        for (account, _, delta) in &splits {
            let net = links.net_flow(&AccountId::new(*account));
            assert!((net - delta).abs() <= dec!(0.02), "{}: {} vs {}", account, net, delta);
        }
        // nothing routes through the other asset
        assert_eq!(links.value(&"a300".into(), &"a301".into()), Decimal::ZERO);
        assert_eq!(links.value(&"a301".into(), &"a300".into()), Decimal::ZERO);
    }
}

#[test]
fn income_two_assets_expense_aggregate_sum() {
    let splits = [
        ("a300", AccountType::Income, dec!(-20.00)),
        ("a301", AccountType::Bank, dec!(3.00)),
        ("a302", AccountType::Cash, dec!(2.00)),
        ("a303", AccountType::Expense, dec!(15.00)),
    ];
    for reconstructor in reconstructors() {
        let links = reconstructor.reconstruct(&tx(&splits)).unwrap();
        let total = income_expense_flow(&links, &splits);
        assert!((total - dec!(35.00)).abs() <= dec!(0.02), "total {}", total);
        // income never pays an expense directly while an asset is present
        assert_eq!(links.value(&"a300".into(), &"a303".into()), Decimal::ZERO);
    }
}

#[test]
fn income_refund_without_assets() {
    // Without an asset-like account, income and expense may exchange directly.
    assert_links(
        &[
            ("salary", AccountType::Income, dec!(-5.00)),
            ("bonus", AccountType::Income, dec!(-1.00)),
            ("tax", AccountType::Expense, dec!(6.00)),
        ],
        &[("salary", "tax", dec!(5.00)), ("bonus", "tax", dec!(1.00))],
    );
}

#[test]
fn exact_strategy_is_idempotent() {
    let reconstructor = LinkReconstructor::with_strategy("exact").unwrap();
    let t = tx(&[
        ("a300", AccountType::Asset, dec!(-20.00)),
        ("a301", AccountType::Bank, dec!(-15.50)),
        ("a302", AccountType::Expense, dec!(25.00)),
        ("a303", AccountType::Expense, dec!(10.50)),
    ]);
    let first = serde_json::to_string(&reconstructor.reconstruct(&t).unwrap()).unwrap();
    let second = serde_json::to_string(&reconstructor.reconstruct(&t).unwrap()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn errors_are_typed_per_transaction() {
    for reconstructor in reconstructors() {
        let unbalanced = tx(&[
            ("a300", AccountType::Asset, dec!(-10.00)),
            ("a301", AccountType::Expense, dec!(9.00)),
            ("a302", AccountType::Expense, dec!(2.00)),
        ]);
        let err = reconstructor.reconstruct(&unbalanced).unwrap_err();
        assert!(matches!(
            err,
            ReconstructionError::Validation {
                source: ValidationError::Unbalanced { .. },
                ..
            }
        ));

        let equity = tx(&[
            ("a300", AccountType::Asset, dec!(-10.00)),
            ("opening", AccountType::Equity, dec!(10.00)),
        ]);
        assert_eq!(reconstructor.reconstruct(&equity).unwrap_err().kind(), "validation");

        let incomes = tx(&[
            ("i1", AccountType::Income, dec!(-1.00)),
            ("i2", AccountType::Income, dec!(0.50)),
            ("i3", AccountType::Income, dec!(0.50)),
        ]);
        assert_eq!(reconstructor.reconstruct(&incomes).unwrap_err().kind(), "infeasible");
    }
}

#[test]
fn exact_strategy_rounds_to_minor_units() {
    let reconstructor = LinkReconstructor::with_strategy("exact").unwrap();
    let t = tx(&[
        ("a300", AccountType::Asset, dec!(-1.004)),
        ("a301", AccountType::Expense, dec!(0.502)),
        ("a302", AccountType::Expense, dec!(0.502)),
    ]);
    // scaled deltas round to -100, 50, 50 and still balance
    let links = reconstructor.reconstruct(&t).unwrap();
    assert_eq!(links.total_value(), dec!(1.00));
}

#[test]
fn book_to_batch_pipeline() {
    let book = Book::from_json(
        r#"{
        "accounts": [
            { "id": "a300", "type": "BANK", "name": "Checking" },
            { "id": "a301", "type": "EXPENSE", "name": "Groceries" },
            { "id": "a302", "type": "EXPENSE", "name": "Household" },
            { "id": "a303", "type": "INCOME", "name": "Salary" },
            { "id": "a304", "type": "EQUITY", "name": "Opening Balances" }
        ],
        "splits": [
            { "transaction": "t1", "account": "a300", "value": "-10.25" },
            { "transaction": "t1", "account": "a301", "value": "8.66" },
            { "transaction": "t1", "account": "a302", "value": "1.59" },
            { "transaction": "t0", "account": "a300", "value": "1000.00" },
            { "transaction": "t0", "account": "a304", "value": "-1000.00" },
            { "transaction": "t2", "account": "a303", "value": "-2500.00" },
            { "transaction": "t2", "account": "a300", "value": "2500.00" },
            { "transaction": "t3", "account": "a300", "value": "-5.00" },
            { "transaction": "t3", "account": "a301", "value": "4.00" }
        ]
    }"#,
    )
    .unwrap();

    let transactions = book.transactions().unwrap();
    let ids: Vec<&str> = transactions.iter().map(|t| t.id().as_str()).collect();
    assert_eq!(ids, vec!["t1", "t2", "t3"]);

    for workers in [1, 3] {
        let reconstructor = LinkReconstructor::new(ReconstructorConfig {
            workers,
            ..Default::default()
        })
        .unwrap();
        let report = reconstructor.reconstruct_batch(&transactions);

        let summary = report.summary();
        assert_eq!(summary.transactions, 3);
        assert_eq!(summary.reconstructed, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.links, 3);

        let failed: Vec<_> = report.failed().collect();
        assert_eq!(failed[0].transaction().as_str(), "t3");

        let salary: Decimal = report
            .links()
            .filter(|l| l.source.as_str() == "a303")
            .map(|l| l.value)
            .sum();
        assert_eq!(salary, dec!(2500.00));
    }
}

#[test]
fn config_file_roundtrip_into_reconstructor() {
    let config = ReconstructorConfig::from_json(
        r#"{ "strategy": "continuous", "denomination": 1000, "timeout_ms": 5000 }"#,
    )
    .unwrap();
    let reconstructor = LinkReconstructor::new(config).unwrap();
    assert_eq!(reconstructor.strategy_kind(), StrategyKind::Continuous);

    assert!(ReconstructorConfig::from_json(r#"{ "strategy": "magic" }"#).is_err());
    assert!(ReconstructorConfig::from_json(r#"{ "denomination": 0 }"#).is_err());
}
