use riskmatrix_core::change::{basis_point_change, percent_change, percentile_rank};
use riskmatrix_core::regime::{classify, Bucket, Comparison, Severity, ThresholdTable};
use riskmatrix_core::{IndicatorRegistry, ThresholdTableError};

fn vix_table() -> ThresholdTable {
    ThresholdTable::ascending()
        .below(15.0, Bucket::new("低波动制度", Severity::Low))
        .below(25.0, Bucket::new("正常波动制度", Severity::Moderate))
        .below(40.0, Bucket::new("压力波动制度", Severity::Elevated))
        .otherwise(Bucket::new("恐慌波动制度", Severity::Severe))
        .expect("vix table is well formed")
}

fn descending_table() -> ThresholdTable {
    ThresholdTable::descending()
        .above(25.0, Bucket::new("高风险", Severity::Severe))
        .above(15.0, Bucket::new("中风险", Severity::Moderate))
        .otherwise(Bucket::new("低风险", Severity::Low))
        .expect("descending table is well formed")
}

#[test]
fn falling_vix_ends_in_the_low_volatility_regime() {
    // Given: a VIX history that drifts down and closes at 12
    let history = [18.0, 19.0, 20.0, 17.0, 16.0, 14.0, 13.0, 12.0];

    // When: the latest value is classified against the dashboard table
    let current = *history.last().expect("non-empty history");
    let table = vix_table();
    let verdict = classify(current, &table);

    // Then: the low-volatility regime is selected
    assert_eq!(verdict.label, "低波动制度");
    assert_eq!(verdict.severity, Severity::Low);
}

#[test]
fn strict_less_than_puts_boundary_in_the_next_bucket() {
    let table = vix_table();

    assert_eq!(classify(14.99, &table).label, "低波动制度");
    assert_eq!(classify(15.0, &table).label, "正常波动制度");
    assert_eq!(classify(25.0, &table).label, "压力波动制度");
    assert_eq!(classify(40.0, &table).label, "恐慌波动制度");
}

#[test]
fn strict_greater_than_keeps_boundary_in_the_lower_bucket() {
    let table = descending_table();

    assert_eq!(classify(25.01, &table).label, "高风险");
    assert_eq!(classify(25.0, &table).label, "中风险");
    assert_eq!(classify(15.0, &table).label, "低风险");
    assert_eq!(classify(-3.0, &table).label, "低风险");
}

#[test]
fn inclusive_operators_claim_their_boundary() {
    let table = ThresholdTable::ascending()
        .at_most(0.0, Bucket::new("收缩", Severity::Elevated))
        .otherwise(Bucket::new("扩张", Severity::Low))
        .expect("table");

    assert_eq!(classify(0.0, &table).label, "收缩");
    assert_eq!(classify(0.0001, &table).label, "扩张");
}

#[test]
fn every_value_lands_in_exactly_one_bucket() {
    // Given: both orientations of table
    let tables = [vix_table(), descending_table()];
    let probes = [
        f64::MIN, -100.0, -0.5, 0.0, 12.0, 14.999, 15.0, 15.001, 24.999, 25.0, 25.001, 39.9,
        40.0, 40.1, 1e9, f64::MAX,
    ];

    for table in &tables {
        let intervals = table.intervals();
        for value in probes {
            // When: every bucket interval is asked whether it contains the value
            let containing: Vec<usize> = intervals
                .iter()
                .enumerate()
                .filter(|(_, interval)| interval.contains(value))
                .map(|(index, _)| index)
                .collect();

            // Then: exactly one does, and it is the bucket the evaluator picks
            assert_eq!(containing.len(), 1, "value {value} matched {containing:?}");
            let picked = table.buckets().nth(containing[0]).expect("bucket");
            assert_eq!(picked.label(), table.classify(value).label());
        }
    }
}

#[test]
fn malformed_tables_are_rejected() {
    let unordered = ThresholdTable::ascending()
        .below(25.0, Bucket::new("a", Severity::Low))
        .below(15.0, Bucket::new("b", Severity::Moderate))
        .otherwise(Bucket::new("c", Severity::Severe));
    assert!(matches!(unordered, Err(ThresholdTableError::UnorderedBounds { index: 1, .. })));

    let mixed = ThresholdTable::ascending()
        .below(15.0, Bucket::new("a", Severity::Low))
        .rule(Comparison::Above(25.0), Bucket::new("b", Severity::Severe))
        .otherwise(Bucket::new("c", Severity::Moderate));
    assert!(matches!(mixed, Err(ThresholdTableError::OperatorMismatch { index: 1, .. })));

    let empty = ThresholdTable::descending().otherwise(Bucket::new("only", Severity::Low));
    assert!(matches!(empty, Err(ThresholdTableError::NoRules)));

    let nan = ThresholdTable::ascending()
        .below(f64::NAN, Bucket::new("a", Severity::Low))
        .otherwise(Bucket::new("b", Severity::Severe));
    assert!(matches!(nan, Err(ThresholdTableError::NonFiniteBound { .. })));

    let reserved = ThresholdTable::ascending()
        .below(1.0, Bucket::new("a", Severity::Low).narrative("regime", "clash"))
        .otherwise(Bucket::new("b", Severity::Severe));
    assert!(matches!(
        reserved,
        Err(ThresholdTableError::ReservedNarrativeField { .. })
    ));
}

#[test]
fn standard_registry_tables_are_all_well_formed() {
    // Given: the built-in indicator registry
    let registry = IndicatorRegistry::standard().expect("registry builds");

    // Then: each table covers the real line without gaps
    for spec in registry.specs() {
        for value in [-1e6, -1.0, 0.0, 1.0, 50.0, 1e6] {
            let hits = spec
                .table
                .intervals()
                .iter()
                .filter(|interval| interval.contains(value))
                .count();
            assert_eq!(hits, 1, "indicator {} value {value}", spec.key);
        }
    }
}

#[test]
fn changes_are_neutral_without_enough_history() {
    assert_eq!(percent_change(&[10.0, 11.0], -5), 0.0);
    assert_eq!(percent_change(&[], -1), 0.0);
    assert_eq!(basis_point_change(&[4.0], -1), 0.0);
}

#[test]
fn percent_change_from_zero_is_neutral() {
    assert_eq!(percent_change(&[0.0, 3.0], -1), 0.0);
    assert_eq!(percent_change(&[20.0, 25.0], -1), 25.0);
}

#[test]
fn percentile_rank_counts_values_at_or_below_current() {
    let values = [1.0, 2.0, 3.0, 4.0, 2.0];
    assert_eq!(percentile_rank(&values, 5), Some(60.0));
    assert_eq!(percentile_rank(&[], 5), None);
}
