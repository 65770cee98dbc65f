//! Reading persisted sale records.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use tracing::{debug, warn};

use super::SaleRecord;
use crate::storage::{self, Storage, StorageError, keys};

/// Every persisted sale record across all users, most recent first.
///
/// Users are found through the sales index. Entries that do not parse are
/// logged and skipped. Records with the same timestamp are ordered by id
/// (descending) and then by owner, so the result does not depend on the
/// order users appear in the index.
///
/// # Errors
///
/// Returns `StorageError` only if the backing store itself fails.
pub fn get_all_sales(storage: &dyn Storage) -> Result<Vec<SaleRecord>, StorageError> {
    let owners: BTreeSet<String> = storage::read_json::<Vec<String>>(storage, keys::SALES_INDEX)?
        .unwrap_or_default()
        .into_iter()
        .collect();

    let mut records = Vec::new();
    for owner in &owners {
        records.extend(owner_records(storage, owner)?);
    }
    records.sort_by(most_recent_first);

    debug!(owners = owners.len(), records = records.len(), "Loaded all sales");
    Ok(records)
}

/// One user's sale records, most recent first.
///
/// # Errors
///
/// Returns `StorageError` only if the backing store itself fails.
pub fn purchases_for(
    storage: &dyn Storage,
    owner_user_id: &str,
) -> Result<Vec<SaleRecord>, StorageError> {
    let mut records = owner_records(storage, owner_user_id)?;
    records.sort_by(most_recent_first);
    Ok(records)
}

fn owner_records(storage: &dyn Storage, owner_user_id: &str) -> Result<Vec<SaleRecord>, StorageError> {
    let key = keys::sales_for(owner_user_id);
    let Some(entries) = storage::read_json::<Vec<serde_json::Value>>(storage, &key)? else {
        return Ok(Vec::new());
    };

    let records = entries
        .into_iter()
        .enumerate()
        .filter_map(|(position, entry)| match serde_json::from_value(entry) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(key = %key, position, error = %e, "Skipping corrupt sale record");
                None
            }
        })
        .collect();
    Ok(records)
}

fn most_recent_first(a: &SaleRecord, b: &SaleRecord) -> Ordering {
    b.timestamp
        .cmp(&a.timestamp)
        .then_with(|| b.id.cmp(&a.id))
        .then_with(|| a.owner_user_id.cmp(&b.owner_user_id))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{DateTime, Duration, Utc};

    use pokestore_core::{ProductId, SaleId};

    use super::*;
    use crate::sales::SaleItem;
    use crate::storage::MemoryStorage;
    use crate::test_support::product;

    fn record(owner: &str, id: i64, at: DateTime<Utc>) -> SaleRecord {
        let item = product(25, "Pikachu", 75_000);
        SaleRecord {
            id: SaleId::new(id),
            timestamp: at,
            owner_user_id: owner.to_string(),
            items: vec![SaleItem {
                catalog_id: item.catalog_id,
                name: item.name,
                image_ref: item.image_ref,
                category: item.primary_category,
                quantity: 1,
                unit_price: item.unit_price,
            }],
        }
    }

    fn persist(storage: &MemoryStorage, owners: &[&str], records: &[SaleRecord]) {
        storage::write_json(storage, keys::SALES_INDEX, owners).unwrap();
        for owner in owners {
            let mine: Vec<&SaleRecord> = records
                .iter()
                .filter(|r| r.owner_user_id == *owner)
                .collect();
            storage::write_json(storage, &keys::sales_for(owner), &mine).unwrap();
        }
    }

    #[test]
    fn test_two_users_three_records_most_recent_first() {
        let storage = MemoryStorage::new();
        let t0 = Utc::now();
        let records = vec![
            record("1", 1, t0),
            record("1", 3, t0 + Duration::minutes(2)),
            record("2", 2, t0 + Duration::minutes(1)),
        ];
        persist(&storage, &["1", "2"], &records);

        let all = get_all_sales(&storage).unwrap();

        assert_eq!(all.len(), 3);
        let ids: Vec<i64> = all.iter().map(|r| r.id.get()).collect();
        assert_eq!(ids, vec![3, 2, 1]);
        assert!(all.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
    }

    #[test]
    fn test_order_ignores_index_order() {
        let t0 = Utc::now();
        let records = vec![record("1", 10, t0), record("2", 11, t0), record("3", 10, t0)];

        let forward = MemoryStorage::new();
        persist(&forward, &["1", "2", "3"], &records);
        let backward = MemoryStorage::new();
        persist(&backward, &["3", "2", "1"], &records);

        let a = get_all_sales(&forward).unwrap();
        let b = get_all_sales(&backward).unwrap();
        assert_eq!(a, b);
        assert_eq!(a[0].id, SaleId::new(11));
        assert_eq!(a[1].owner_user_id, "1");
        assert_eq!(a[2].owner_user_id, "3");
    }

    #[test]
    fn test_corrupt_entries_are_skipped() {
        let storage = MemoryStorage::new();
        let good = record("5", 1, Utc::now());
        storage::write_json(&storage, keys::SALES_INDEX, &["5", "6"]).unwrap();
        storage
            .set(
                &keys::sales_for("5"),
                &format!("[{}, {{\"id\": \"nope\"}}]", serde_json::to_string(&good).unwrap()),
            )
            .unwrap();
        storage.set(&keys::sales_for("6"), "not json at all").unwrap();

        let all = get_all_sales(&storage).unwrap();
        assert_eq!(all, vec![good]);
    }

    #[test]
    fn test_no_index_means_no_sales() {
        let storage = MemoryStorage::new();
        storage
            .set(&keys::sales_for("1"), "[]")
            .unwrap();
        assert!(get_all_sales(&storage).unwrap().is_empty());
    }

    #[test]
    fn test_purchases_for_one_owner() {
        let storage = MemoryStorage::new();
        let t0 = Utc::now();
        let records = vec![
            record("1", 1, t0),
            record("2", 2, t0),
            record("1", 3, t0 + Duration::seconds(5)),
        ];
        persist(&storage, &["1", "2"], &records);

        let mine = purchases_for(&storage, "1").unwrap();
        assert_eq!(mine.len(), 2);
        assert_eq!(mine[0].id, SaleId::new(3));
        assert!(mine.iter().all(|r| r.items[0].catalog_id == ProductId::new(25)));
        assert!(purchases_for(&storage, "404").unwrap().is_empty());
    }
}
