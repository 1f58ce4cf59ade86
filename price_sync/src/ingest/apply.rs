use std::collections::HashSet;

use diesel::dsl::{count_distinct, exists, sum};
use diesel::prelude::*;

use crate::error::{StoreError, StoreResult};
use crate::models::{IdentityKey, IngestionStats, PriceRecord, round_cents};
use crate::schema::prices;

/// Apply a decoded batch inside a single immediate transaction.
///
/// For each record, in order: a key already seen in this batch is a duplicate; a key
/// already in the store is a duplicate; otherwise the row is inserted. The insert uses
/// `ON CONFLICT DO NOTHING` and an insert that touches no row also counts as a duplicate.
/// Aggregates are read before commit, in the same transaction.
pub fn apply_batch(
    conn: &mut SqliteConnection,
    records: &[PriceRecord],
) -> StoreResult<IngestionStats> {
    conn.immediate_transaction::<_, diesel::result::Error, _>(|conn| {
        let mut seen: HashSet<IdentityKey> = HashSet::with_capacity(records.len());
        let mut duplicates = 0i64;
        let mut inserted = 0i64;

        for record in records {
            let key = record.identity();
            if !seen.insert(key) {
                duplicates += 1;
                continue;
            }

            if identity_exists(conn, key)? {
                duplicates += 1;
                continue;
            }

            let written = diesel::insert_into(prices::table)
                .values(record)
                .on_conflict_do_nothing()
                .execute(conn)?;
            if written == 0 {
                duplicates += 1;
            } else {
                inserted += 1;
            }
        }

        read_aggregates(conn, duplicates, inserted)
    })
    .map_err(StoreError::Transaction)
}

fn identity_exists(conn: &mut SqliteConnection, (id, date): IdentityKey) -> QueryResult<bool> {
    diesel::select(exists(
        prices::table
            .filter(prices::id.eq(id))
            .filter(prices::create_date.eq(date)),
    ))
    .get_result(conn)
}

fn read_aggregates(
    conn: &mut SqliteConnection,
    duplicates: i64,
    inserted: i64,
) -> QueryResult<IngestionStats> {
    let total_count: i64 = prices::table.count().get_result(conn)?;
    let total_categories: i64 = prices::table
        .select(count_distinct(prices::category))
        .get_result(conn)?;
    let total_price: Option<f64> = prices::table.select(sum(prices::price)).get_result(conn)?;

    Ok(IngestionStats {
        total_count,
        duplicates_count: duplicates,
        total_items: inserted,
        total_categories,
        total_price: round_cents(total_price.unwrap_or(0.0)),
    })
}
