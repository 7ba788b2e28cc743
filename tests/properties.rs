mod common;

use std::collections::{HashMap, HashSet};

use common::keys;
use csv_reconcile::classify::{Classification, ErrorType, classify};
use csv_reconcile::dataset::{DEFAULT_NULL_TOKENS, Dataset, Side};
use csv_reconcile::value_diff::compare_values;
use proptest::prelude::*;

const NAMES: &[&str] = &["ann", "bob", "cy"];

fn build(name: &str, rows: &[(u8, usize)]) -> Dataset {
    let null_tokens = DEFAULT_NULL_TOKENS
        .iter()
        .map(|t| t.to_string())
        .collect::<Vec<_>>();
    Dataset::from_raw(
        name,
        vec!["id".to_string(), "name".to_string()],
        rows.iter()
            .map(|(id, name)| vec![id.to_string(), NAMES[*name].to_string()])
            .collect(),
        &null_tokens,
    )
    .expect("dataset")
}

/// Key text spanning small integers, integers around the `f64` exact limit
/// and integers too wide for `i64`.
fn wide_id_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        (0u64..50).prop_map(|n| n.to_string()),
        (9_007_199_254_740_980u64..9_007_199_254_741_010).prop_map(|n| n.to_string()),
        (99_999_999_999_999_999_980u128..100_000_000_000_000_000_010).prop_map(|n| n.to_string()),
    ]
}

fn build_ids(name: &str, ids: &[String]) -> Dataset {
    let null_tokens = DEFAULT_NULL_TOKENS
        .iter()
        .map(|t| t.to_string())
        .collect::<Vec<_>>();
    Dataset::from_raw(
        name,
        vec!["id".to_string(), "qty".to_string()],
        ids.iter()
            .enumerate()
            .map(|(idx, id)| vec![id.clone(), idx.to_string()])
            .collect(),
        &null_tokens,
    )
    .expect("dataset")
}

fn rows_strategy() -> impl Strategy<Value = Vec<(u8, usize)>> {
    proptest::collection::vec((0u8..6, 0usize..NAMES.len()), 0..12)
}

fn keys_of(classification: &Classification, error_type: ErrorType, side: Side) -> Vec<String> {
    classification
        .of_type(error_type)
        .filter(|r| r.source == side)
        .map(|r| classification.record(r).get("id").unwrap().to_string())
        .collect()
}

fn distinct_ids(rows: &[(u8, usize)]) -> HashSet<String> {
    rows.iter().map(|(id, _)| id.to_string()).collect()
}

fn rows_with_identical_twin(rows: &[(u8, usize)]) -> usize {
    let mut counts: HashMap<(u8, usize), usize> = HashMap::new();
    for row in rows {
        *counts.entry(*row).or_insert(0) += 1;
    }
    rows.iter().filter(|row| counts[*row] > 1).count()
}

proptest! {
    #[test]
    fn full_duplicate_counts_cover_every_duplicated_row(
        source_rows in rows_strategy(),
        target_rows in rows_strategy(),
    ) {
        let source = build("source", &source_rows);
        let target = build("target", &target_rows);
        let result = classify(&source, &target, &keys(&["id"])).unwrap();
        for (side, rows) in [(Side::Source, &source_rows), (Side::Target, &target_rows)] {
            let total: usize = result
                .of_type(ErrorType::FullDuplicate)
                .filter(|r| r.source == side)
                .map(|r| r.num_errors)
                .sum();
            prop_assert_eq!(total, rows_with_identical_twin(rows));
        }
    }

    #[test]
    fn no_key_is_both_full_and_key_duplicate(
        source_rows in rows_strategy(),
        target_rows in rows_strategy(),
    ) {
        let source = build("source", &source_rows);
        let target = build("target", &target_rows);
        let result = classify(&source, &target, &keys(&["id"])).unwrap();
        for side in [Side::Source, Side::Target] {
            let full: HashSet<String> =
                keys_of(&result, ErrorType::FullDuplicate, side).into_iter().collect();
            let keyed = keys_of(&result, ErrorType::KeyDuplicate, side);
            prop_assert!(keyed.iter().all(|k| !full.contains(k)));
        }
    }

    #[test]
    fn missing_and_extra_are_key_set_differences(
        source_rows in rows_strategy(),
        target_rows in rows_strategy(),
    ) {
        let source = build("source", &source_rows);
        let target = build("target", &target_rows);
        let result = classify(&source, &target, &keys(&["id"])).unwrap();

        let source_ids = distinct_ids(&source_rows);
        let target_ids = distinct_ids(&target_rows);
        let missing = keys_of(&result, ErrorType::Missing, Side::Source);
        let extra = keys_of(&result, ErrorType::Extra, Side::Target);

        prop_assert_eq!(missing.len(), missing.iter().collect::<HashSet<_>>().len());
        prop_assert_eq!(
            missing.into_iter().collect::<HashSet<_>>(),
            source_ids.difference(&target_ids).cloned().collect::<HashSet<_>>()
        );
        prop_assert_eq!(
            extra.into_iter().collect::<HashSet<_>>(),
            target_ids.difference(&source_ids).cloned().collect::<HashSet<_>>()
        );
        prop_assert!(result
            .of_type(ErrorType::Missing)
            .chain(result.of_type(ErrorType::Extra))
            .all(|r| r.num_errors == 1));
    }

    #[test]
    fn classified_output_is_sorted(
        source_rows in rows_strategy(),
        target_rows in rows_strategy(),
    ) {
        let source = build("source", &source_rows);
        let target = build("target", &target_rows);
        let result = classify(&source, &target, &keys(&["id"])).unwrap();
        let order = result
            .records
            .iter()
            .map(|r| (r.error_type.code(), r.source.label()))
            .collect::<Vec<_>>();
        let mut sorted = order.clone();
        sorted.sort();
        prop_assert_eq!(order, sorted);
    }

    #[test]
    fn unique_keys_yield_one_entry_per_differing_cell(
        source_names in proptest::collection::vec(0usize..NAMES.len(), 6),
        target_names in proptest::collection::vec(0usize..NAMES.len(), 6),
        source_mask in proptest::collection::vec(any::<bool>(), 6),
        target_mask in proptest::collection::vec(any::<bool>(), 6),
    ) {
        let pick = |names: &[usize], mask: &[bool]| {
            (0u8..6)
                .filter(|id| mask[*id as usize])
                .map(|id| (id, names[id as usize]))
                .collect::<Vec<_>>()
        };
        let source_rows = pick(&source_names[..], &source_mask[..]);
        let target_rows = pick(&target_names[..], &target_mask[..]);
        let source = build("source", &source_rows);
        let target = build("target", &target_rows);

        let expected = (0..6)
            .filter(|id| source_mask[*id] && target_mask[*id])
            .filter(|id| source_names[*id] != target_names[*id])
            .count();
        let diff = compare_values(
            &source,
            &target,
            &["id".to_string(), "name".to_string()],
            &keys(&["id"]),
        )
        .unwrap();
        prop_assert_eq!(diff.mismatch_count(), expected);
        prop_assert_eq!(diff.dropped_duplicate_keys, 0);
    }

    #[test]
    fn mixed_width_keys_compare_on_their_exact_text(
        source_ids in proptest::collection::hash_set(wide_id_strategy(), 0..10),
        target_ids in proptest::collection::hash_set(wide_id_strategy(), 0..10),
    ) {
        let source = build_ids("source", &source_ids.iter().cloned().collect::<Vec<_>>());
        let target = build_ids("target", &target_ids.iter().cloned().collect::<Vec<_>>());
        let result = classify(&source, &target, &keys(&["id"])).unwrap();

        prop_assert_eq!(
            keys_of(&result, ErrorType::Missing, Side::Source)
                .into_iter()
                .collect::<HashSet<_>>(),
            source_ids.difference(&target_ids).cloned().collect::<HashSet<_>>()
        );
        prop_assert_eq!(
            keys_of(&result, ErrorType::Extra, Side::Target)
                .into_iter()
                .collect::<HashSet<_>>(),
            target_ids.difference(&source_ids).cloned().collect::<HashSet<_>>()
        );
        prop_assert_eq!(result.count(ErrorType::KeyDuplicate), 0);

        let diff = compare_values(&source, &target, &["qty".to_string()], &keys(&["id"]))
            .unwrap();
        prop_assert_eq!(diff.matched_pairs, source_ids.intersection(&target_ids).count());
        prop_assert_eq!(diff.dropped_duplicate_keys, 0);
    }
}
