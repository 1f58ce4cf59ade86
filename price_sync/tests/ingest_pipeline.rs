use chrono::NaiveDate;
use price_sync::archive::ArchiveKind;
use price_sync::error::StoreError;
use price_sync::ingest::{IngestError, PayloadSource, apply_batch, ingest, ingest_with_report};
use price_sync::models::{IngestionStats, PriceRecord};
use proptest::prelude::*;

mod common;
use common::{count, csv, gzip, setup_db, tar_of, zip_of};

fn record(id: i64, name: &str, category: &str, price: f64, day: u32) -> PriceRecord {
    PriceRecord {
        id,
        name: name.to_string(),
        category: category.to_string(),
        price,
        create_date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
    }
}

#[test]
fn duplicate_row_in_one_batch_is_folded() {
    let (_db, mut conn) = setup_db();

    let payload = csv(&[
        "1,Widget,Tools,9.99,2024-03-01",
        "1,Widget,Tools,9.99,2024-03-01",
    ]);
    let stats = ingest(&mut conn, &payload, ArchiveKind::Zip).expect("ingest");

    assert_eq!(
        stats,
        IngestionStats {
            total_count: 1,
            duplicates_count: 1,
            total_items: 1,
            total_categories: 1,
            total_price: 9.99,
        }
    );
}

#[test]
fn malformed_row_is_skipped_without_error() {
    let (_db, mut conn) = setup_db();

    let payload = csv(&[
        "abc,Widget,Tools,9.99,2024-03-01",
        "2,Gadget,Toys,5.00,2024-03-02",
    ]);
    let report = ingest_with_report(&mut conn, &payload, ArchiveKind::Zip).expect("ingest");

    assert_eq!(report.stats.total_items, 1);
    assert_eq!(report.stats.duplicates_count, 0);
    assert_eq!(report.rows_read, 2);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].line, 2);
    assert_eq!(report.source, PayloadSource::RawCsv);
}

#[test]
fn reingesting_the_same_batch_inserts_nothing() {
    let (_db, mut conn) = setup_db();

    let payload = csv(&[
        "1,Widget,Tools,9.99,2024-03-01",
        "2,Gadget,Toys,5.00,2024-03-02",
        "3,Gizmo,Toys,1.01,2024-03-03",
    ]);
    let first = ingest(&mut conn, &payload, ArchiveKind::Zip).unwrap();
    assert_eq!(first.total_items, 3);
    assert_eq!(first.duplicates_count, 0);

    let second = ingest(&mut conn, &payload, ArchiveKind::Zip).unwrap();
    assert_eq!(second.total_items, 0);
    assert_eq!(second.duplicates_count, 3);
    assert_eq!(second.total_count, 3);
    assert_eq!(second.total_categories, 2);
    assert_eq!(second.total_price, 16.0);
}

#[test]
fn totals_are_store_wide_and_cumulative() {
    let (_db, mut conn) = setup_db();

    let a = ingest(
        &mut conn,
        &csv(&["1,Widget,Tools,1.10,2024-03-01", "2,Gadget,Toys,2.20,2024-03-01"]),
        ArchiveKind::Zip,
    )
    .unwrap();
    assert_eq!(a.total_count, 2);

    // id 1 again on the same day collides with the store; on a new day it is new
    let b = ingest(
        &mut conn,
        &csv(&[
            "1,Widget v2,Tools,9.00,2024-03-01",
            "1,Widget,Tools,1.10,2024-03-02",
            "4,Thing,Misc,0.70,2024-03-02",
        ]),
        ArchiveKind::Zip,
    )
    .unwrap();

    assert_eq!(b.total_items, 2);
    assert_eq!(b.duplicates_count, 1);
    assert_eq!(b.total_count, 4);
    assert_eq!(b.total_categories, 3);
    assert_eq!(b.total_price, 5.10);
    assert_eq!(count(&mut conn, "prices"), 4);
}

#[test]
fn zip_and_tar_payloads_are_extracted() {
    let (_db, mut conn) = setup_db();

    let first = csv(&["1,Widget,Tools,9.99,2024-03-01"]);
    let zipped = zip_of(&[
        ("README.md", b"prices inside".as_slice()),
        ("export/prices.csv", first.as_slice()),
    ]);
    let report = ingest_with_report(&mut conn, &zipped, ArchiveKind::Zip).unwrap();
    assert_eq!(report.source, PayloadSource::Archive(ArchiveKind::Zip));
    assert_eq!(report.stats.total_items, 1);

    let second = csv(&["2,Gadget,Toys,5.00,2024-03-02"]);
    let tarred = tar_of(&[("prices.csv", second.as_slice())]);
    let report = ingest_with_report(&mut conn, &tarred, ArchiveKind::Tar).unwrap();
    assert_eq!(report.source, PayloadSource::Archive(ArchiveKind::Tar));
    assert_eq!(report.stats.total_count, 2);

    let third = csv(&["3,Gizmo,Toys,1.00,2024-03-03"]);
    let tgz = gzip(&tar_of(&[("p.CSV", third.as_slice())]));
    let report = ingest_with_report(&mut conn, &tgz, ArchiveKind::Tar).unwrap();
    assert_eq!(report.source, PayloadSource::Archive(ArchiveKind::Tar));
    assert_eq!(report.stats.total_count, 3);
}

#[test]
fn archive_without_csv_falls_back_and_reports_both_errors() {
    let (_db, mut conn) = setup_db();

    let zipped = zip_of(&[("notes.txt", b"nothing to see".as_slice())]);
    let err = ingest(&mut conn, &zipped, ArchiveKind::Zip).unwrap_err();

    assert!(matches!(err, IngestError::Unreadable { .. }));
    assert!(err.is_client_error());
    assert_eq!(count(&mut conn, "prices"), 0);
}

#[test]
fn header_only_batch_reports_current_totals() {
    let (_db, mut conn) = setup_db();
    ingest(
        &mut conn,
        &csv(&["1,Widget,Tools,9.99,2024-03-01"]),
        ArchiveKind::Zip,
    )
    .unwrap();

    let stats = ingest(&mut conn, &csv(&[]), ArchiveKind::Tar).unwrap();
    assert_eq!(stats.total_items, 0);
    assert_eq!(stats.duplicates_count, 0);
    assert_eq!(stats.total_count, 1);
    assert_eq!(stats.total_price, 9.99);
}

#[test]
fn failure_mid_batch_rolls_everything_back() {
    let (_db, mut conn) = setup_db();

    // The decoder never emits a negative price, so this bypasses it to trip the
    // table's CHECK constraint after two good inserts.
    let batch = vec![
        record(1, "Widget", "Tools", 9.99, 1),
        record(2, "Gadget", "Toys", 5.0, 2),
        record(3, "Broken", "Toys", -1.0, 3),
    ];
    let err = apply_batch(&mut conn, &batch).unwrap_err();

    assert!(matches!(err, StoreError::Transaction(_)));
    assert_eq!(count(&mut conn, "prices"), 0);

    // The connection is usable again afterwards.
    let stats = apply_batch(&mut conn, &batch[..2]).unwrap();
    assert_eq!(stats.total_items, 2);
}

#[test]
fn store_failure_is_not_a_client_error() {
    let (_db, mut conn) = setup_db();
    diesel::RunQueryDsl::execute(diesel::sql_query("DROP TABLE prices"), &mut conn).unwrap();

    let err = ingest(
        &mut conn,
        &csv(&["1,Widget,Tools,9.99,2024-03-01"]),
        ArchiveKind::Zip,
    )
    .unwrap_err();
    assert!(matches!(err, IngestError::Store(StoreError::Transaction(_))));
    assert!(!err.is_client_error());
}

#[test]
fn concurrent_ingestions_insert_each_key_once() {
    let (db, _conn) = setup_db();

    let rows: Vec<String> = (1..=50)
        .map(|i| format!("{i},Item {i},Cat {},{}.25,2024-03-01", i % 5, i))
        .collect();
    let rows: Vec<&str> = rows.iter().map(String::as_str).collect();
    let payload = csv(&rows);

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let path = db.path.clone();
            let payload = payload.clone();
            std::thread::spawn(move || {
                let mut conn = price_sync::db::connection::connect_sqlite(&path).unwrap();
                ingest(&mut conn, &payload, ArchiveKind::Zip).unwrap()
            })
        })
        .collect();

    let results: Vec<IngestionStats> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let inserted: i64 = results.iter().map(|s| s.total_items).sum();
    assert_eq!(inserted, 50);
    for stats in &results {
        assert_eq!(stats.total_items + stats.duplicates_count, 50);
    }
    assert_eq!(results.iter().map(|s| s.total_count).max(), Some(50));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn duplicates_plus_inserted_equals_batch_len_on_empty_store(
        keys in proptest::collection::vec((0i64..8, 1u32..4), 0..30)
    ) {
        let (_db, mut conn) = setup_db();
        let batch: Vec<PriceRecord> = keys
            .iter()
            .map(|(id, day)| record(*id, "Item", "Cat", 1.0, *day))
            .collect();

        let stats = apply_batch(&mut conn, &batch).unwrap();
        let distinct: std::collections::HashSet<_> = keys.iter().collect();

        prop_assert_eq!(stats.duplicates_count + stats.total_items, batch.len() as i64);
        prop_assert_eq!(stats.total_items, distinct.len() as i64);
        prop_assert_eq!(stats.total_count, distinct.len() as i64);
    }
}
