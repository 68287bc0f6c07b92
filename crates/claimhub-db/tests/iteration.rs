//! Iteration-engine semantics against a populated column family.

mod common;

use claimhub_db::rows::{AmountValue, RowKey, RowValue, UtxoKey};
use claimhub_db::{IterOptions, Prefix};
use common::Fixture;

const HASHX_A: [u8; 11] = [0xaa; 11];
const HASHX_B: [u8; 11] = [0xbb; 11];

fn utxo(hashx: [u8; 11], tx_num: u32, nout: u16) -> UtxoKey {
    UtxoKey {
        hashx,
        tx_num,
        nout,
    }
}

/// Six UTXO rows across two addresses.
fn populated() -> Fixture {
    let fixture = Fixture::new();
    for (key, amount) in [
        (utxo(HASHX_A, 1, 0), 100),
        (utxo(HASHX_A, 1, 1), 200),
        (utxo(HASHX_A, 5, 0), 300),
        (utxo(HASHX_B, 2, 0), 400),
        (utxo(HASHX_B, 2, 1), 500),
        (utxo(HASHX_B, 9, 3), 600),
    ] {
        fixture.put(&key, &AmountValue { amount });
    }
    fixture.flush();
    fixture
}

fn collect_keys(iter: impl Iterator<Item = claimhub_db::Result<claimhub_db::RawRow>>) -> Vec<Vec<u8>> {
    iter.map(|row| row.expect("iteration error").key).collect()
}

#[test]
fn cf_prefix_yields_every_row_in_order() {
    let fixture = populated();
    let db = fixture.secondary();

    let keys = collect_keys(db.iter(IterOptions::new(Prefix::Utxo)).unwrap());
    assert_eq!(keys.len(), 6);
    let mut sorted = keys.clone();
    sorted.sort();
    assert_eq!(keys, sorted, "keys must come out in byte order");
}

#[test]
fn partial_pack_prefix_restricts_to_one_address() {
    let fixture = populated();
    let db = fixture.secondary();

    let seek = utxo(HASHX_A, 0, 0).pack_partial(1);
    let opts = IterOptions::new(Prefix::Utxo)
        .with_prefix(seek.clone())
        .with_start(seek);
    let keys = collect_keys(db.iter(opts).unwrap());
    assert_eq!(
        keys,
        vec![
            utxo(HASHX_A, 1, 0).pack(),
            utxo(HASHX_A, 1, 1).pack(),
            utxo(HASHX_A, 5, 0).pack(),
        ]
    );
}

#[test]
fn exclusive_start_skips_the_first_row() {
    let fixture = populated();
    let db = fixture.secondary();

    let seek = utxo(HASHX_A, 1, 0).pack();
    let opts = IterOptions::new(Prefix::Utxo)
        .with_start(seek)
        .with_include_start(false);
    let keys = collect_keys(db.iter(opts).unwrap());
    assert_eq!(keys.first(), Some(&utxo(HASHX_A, 1, 1).pack()));
}

#[test]
fn stop_bound_is_exclusive_by_default() {
    let fixture = populated();
    let db = fixture.secondary();

    let opts = IterOptions::new(Prefix::Utxo).with_stop(utxo(HASHX_B, 2, 1).pack());
    let keys = collect_keys(db.iter(opts).unwrap());
    assert_eq!(keys.len(), 4);
    assert_eq!(keys.last(), Some(&utxo(HASHX_B, 2, 0).pack()));
}

#[test]
fn inclusive_stop_emits_the_boundary_row() {
    let fixture = populated();
    let db = fixture.secondary();

    let opts = IterOptions::new(Prefix::Utxo)
        .with_stop(utxo(HASHX_B, 2, 1).pack())
        .with_include_stop(true);
    let keys = collect_keys(db.iter(opts).unwrap());
    assert_eq!(keys.len(), 5);
    assert_eq!(keys.last(), Some(&utxo(HASHX_B, 2, 1).pack()));
}

#[test]
fn a_whole_address_works_as_stop_prefix() {
    let fixture = populated();
    let db = fixture.secondary();

    // Stopping at the partial pack of address B cuts the sequence exactly
    // where B's rows begin.
    let stop = utxo(HASHX_B, 0, 0).pack_partial(1);
    let opts = IterOptions::new(Prefix::Utxo).with_stop(stop);
    let keys = collect_keys(db.iter(opts).unwrap());
    assert_eq!(keys.len(), 3);
    assert!(keys.iter().all(|k| k[1..12] == HASHX_A));
}

#[test]
fn include_flags_select_copied_buffers() {
    let fixture = populated();
    let db = fixture.secondary();

    let opts = IterOptions::new(Prefix::Utxo)
        .with_include_key(false)
        .with_include_value(true);
    let rows: Vec<_> = db
        .iter(opts)
        .unwrap()
        .map(|row| row.expect("iteration error"))
        .collect();
    assert_eq!(rows.len(), 6);
    assert!(rows.iter().all(|row| row.key.is_empty()));
    assert!(rows.iter().all(|row| row.value.len() == 8));
}

#[test]
fn emitted_rows_outlive_the_advance() {
    let fixture = populated();
    let db = fixture.secondary();

    // Collect everything first, then inspect: every row owns its bytes, so
    // nothing here can be invalidated by the iterator having advanced.
    let opts = IterOptions::new(Prefix::Utxo).with_include_value(true);
    let rows: Vec<_> = db
        .iter(opts)
        .unwrap()
        .map(|row| row.expect("iteration error"))
        .collect();
    assert_eq!(
        AmountValue { amount: 100 },
        AmountValue::unpack(Prefix::Utxo, &rows[0].value).unwrap()
    );
    assert_eq!(UtxoKey::unpack(&rows[5].key).unwrap(), utxo(HASHX_B, 9, 3));
}

#[test]
fn dropping_a_sequence_midway_releases_it() {
    let fixture = populated();
    let db = fixture.secondary();

    let mut iter = db.iter(IterOptions::new(Prefix::Utxo)).unwrap();
    let _ = iter.next();
    drop(iter);

    // A second full pass still sees every row.
    let keys = collect_keys(db.iter(IterOptions::new(Prefix::Utxo)).unwrap());
    assert_eq!(keys.len(), 6);
}

#[test]
fn bounds_grid_matches_reference_model() {
    let fixture = populated();
    let db = fixture.secondary();

    let all_keys: Vec<Vec<u8>> = collect_keys(db.iter(IterOptions::new(Prefix::Utxo)).unwrap());

    let mut bounds: Vec<Option<Vec<u8>>> = vec![None];
    bounds.extend(all_keys.iter().cloned().map(Some));
    bounds.push(Some(utxo(HASHX_A, 0, 0).pack_partial(1)));
    bounds.push(Some(utxo(HASHX_B, 0, 0).pack_partial(1)));

    for start in &bounds {
        for stop in &bounds {
            for include_start in [true, false] {
                for include_stop in [true, false] {
                    let mut opts = IterOptions::new(Prefix::Utxo)
                        .with_include_start(include_start)
                        .with_include_stop(include_stop);
                    if let Some(start) = start {
                        opts = opts.with_start(start.clone());
                    }
                    if let Some(stop) = stop {
                        opts = opts.with_stop(stop.clone());
                    }
                    let got = collect_keys(db.iter(opts).unwrap());
                    let expected = reference_model(
                        &all_keys,
                        start.as_deref(),
                        stop.as_deref(),
                        include_start,
                        include_stop,
                    );
                    assert_eq!(
                        got, expected,
                        "start={start:?} stop={stop:?} include_start={include_start} include_stop={include_stop}"
                    );
                }
            }
        }
    }
}

/// What a sequence over the sorted `keys` must yield for the given bounds:
/// seek to `start`, optionally skip one row when the start is exclusive,
/// then emit until a row falls past the bounds. The bounds test runs against
/// the previously emitted row, so an inclusive stop emits the boundary row
/// (and exactly one row when the bounds never admit anything).
fn reference_model(
    keys: &[Vec<u8>],
    start: Option<&[u8]>,
    stop: Option<&[u8]>,
    include_start: bool,
    include_stop: bool,
) -> Vec<Vec<u8>> {
    let past_bounds = |key: &[u8]| -> bool {
        if let Some(stop) = stop {
            let head = &key[..stop.len().min(key.len())];
            if key.starts_with(stop) || stop < head {
                return true;
            }
        }
        if let Some(start) = start {
            let head = &key[..start.len().min(key.len())];
            if start > head {
                return true;
            }
        }
        false
    };

    let mut idx = match start {
        Some(start) => keys
            .iter()
            .position(|k| k.as_slice() >= start)
            .unwrap_or(keys.len()),
        None => 0,
    };
    if !include_start {
        idx += 1;
    }

    let mut prev: Option<&Vec<u8>> = None;
    let mut out = Vec::new();
    while idx < keys.len() {
        if prev.is_some_and(|p| past_bounds(p)) {
            break;
        }
        let key = &keys[idx];
        if !include_stop && past_bounds(key) {
            break;
        }
        out.push(key.clone());
        prev = Some(key);
        idx += 1;
    }
    out
}
