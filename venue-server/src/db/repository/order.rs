//! Order Repository
//!
//! Orders are never deleted. The order-number index is the only lookup the
//! public tracking page has.

use redb::ReadableTable;
use shared::order::Order;

use crate::db::{
    ORDER_NUMBERS_TABLE, ORDERS_TABLE, Storage, StorageError, StorageResult, VENUE_COUNTERS_TABLE,
    VENUE_ORDERS_TABLE, decode, encode,
};

#[derive(Clone)]
pub struct OrderRepository {
    storage: Storage,
}

impl OrderRepository {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// Insert a new order under the next sequence number of its venue
    ///
    /// `build` receives the allocated sequence and returns the order to
    /// store. Counter increment, index writes and the insert commit together.
    pub fn insert_new<F>(&self, venue_id: &str, build: F) -> StorageResult<Order>
    where
        F: FnOnce(u64) -> Order,
    {
        let txn = self.storage.begin_write()?;
        let order = {
            let mut counters = txn.open_table(VENUE_COUNTERS_TABLE)?;
            let seq = counters.get(venue_id)?.map(|guard| guard.value()).unwrap_or(0) + 1;
            counters.insert(venue_id, seq)?;

            let order = build(seq);

            let mut numbers = txn.open_table(ORDER_NUMBERS_TABLE)?;
            if numbers.get(order.order_number.as_str())?.is_some() {
                return Err(StorageError::Conflict(format!(
                    "order number {} already issued",
                    order.order_number
                )));
            }
            numbers.insert(order.order_number.as_str(), order.id.as_str())?;

            let mut by_venue = txn.open_table(VENUE_ORDERS_TABLE)?;
            by_venue.insert((venue_id, seq), order.id.as_str())?;

            let mut orders = txn.open_table(ORDERS_TABLE)?;
            let bytes = encode(&order)?;
            orders.insert(order.id.as_str(), bytes.as_slice())?;

            order
        };
        txn.commit()?;
        Ok(order)
    }

    pub fn get(&self, order_id: &str) -> StorageResult<Option<Order>> {
        let txn = self.storage.begin_read()?;
        let orders = txn.open_table(ORDERS_TABLE)?;
        let order = match orders.get(order_id)? {
            Some(guard) => Some(decode(guard.value())?),
            None => None,
        };
        Ok(order)
    }

    /// Look up through the unique order-number index
    pub fn find_by_number(&self, order_number: &str) -> StorageResult<Option<Order>> {
        let txn = self.storage.begin_read()?;
        let numbers = txn.open_table(ORDER_NUMBERS_TABLE)?;
        let Some(order_id) = numbers
            .get(order_number)?
            .map(|guard| guard.value().to_string())
        else {
            return Ok(None);
        };

        let orders = txn.open_table(ORDERS_TABLE)?;
        let order = match orders.get(order_id.as_str())? {
            Some(guard) => Some(decode(guard.value())?),
            None => None,
        };
        Ok(order)
    }

    /// Read-check-write of one order inside a single write transaction
    ///
    /// `f` mutates the order and returns whether anything changed; only
    /// changed orders are written back. An error from `f` aborts the
    /// transaction. Returns `Ok(None)` when the order does not exist.
    pub fn update<F, E>(&self, order_id: &str, f: F) -> Result<Option<Order>, E>
    where
        F: FnOnce(&mut Order) -> Result<bool, E>,
        E: From<StorageError>,
    {
        let txn = self.storage.begin_write()?;
        let updated = {
            let mut orders = txn.open_table(ORDERS_TABLE).map_err(StorageError::from)?;
            let current: Option<Order> = match orders.get(order_id).map_err(StorageError::from)? {
                Some(guard) => Some(decode(guard.value())?),
                None => None,
            };
            let Some(mut order) = current else {
                return Ok(None);
            };

            if f(&mut order)? {
                let bytes = encode(&order)?;
                orders
                    .insert(order_id, bytes.as_slice())
                    .map_err(StorageError::from)?;
            }
            order
        };
        txn.commit().map_err(StorageError::from)?;
        Ok(Some(updated))
    }

    /// All orders of a venue, newest first
    pub fn list_by_venue(&self, venue_id: &str) -> StorageResult<Vec<Order>> {
        let txn = self.storage.begin_read()?;
        let by_venue = txn.open_table(VENUE_ORDERS_TABLE)?;
        let orders = txn.open_table(ORDERS_TABLE)?;

        let mut result = Vec::new();
        for entry in by_venue.range((venue_id, 0u64)..=(venue_id, u64::MAX))?.rev() {
            let (_, order_id) = entry?;
            if let Some(guard) = orders.get(order_id.value())? {
                result.push(decode(guard.value())?);
            }
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use shared::order::OrderStatus;

    fn build(venue_id: &str, seq: u64) -> Order {
        Order {
            id: format!("{venue_id}-id-{seq}"),
            venue_id: venue_id.to_string(),
            table_number: "T1".to_string(),
            order_number: format!("{venue_id}-{seq:04}"),
            items: Vec::new(),
            total_amount: Decimal::ZERO,
            customer_name: None,
            special_instructions: None,
            status: OrderStatus::New,
            payment_method: None,
            payment_status: None,
            created_at: seq as i64,
            prepared_at: None,
            ready_at: None,
            served_at: None,
            updated_at: seq as i64,
        }
    }

    #[test]
    fn test_sequences_are_per_venue() {
        let repo = OrderRepository::new(Storage::open_in_memory().unwrap());

        let a1 = repo.insert_new("a", |seq| build("a", seq)).unwrap();
        let a2 = repo.insert_new("a", |seq| build("a", seq)).unwrap();
        let b1 = repo.insert_new("b", |seq| build("b", seq)).unwrap();

        assert_eq!(a1.order_number, "a-0001");
        assert_eq!(a2.order_number, "a-0002");
        assert_eq!(b1.order_number, "b-0001");
    }

    #[test]
    fn test_find_by_number_and_id() {
        let repo = OrderRepository::new(Storage::open_in_memory().unwrap());
        let order = repo.insert_new("a", |seq| build("a", seq)).unwrap();

        assert_eq!(repo.get(&order.id).unwrap(), Some(order.clone()));
        assert_eq!(repo.find_by_number("a-0001").unwrap(), Some(order));
        assert!(repo.find_by_number("b-0001").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_number_rolls_back_counter() {
        let repo = OrderRepository::new(Storage::open_in_memory().unwrap());
        repo.insert_new("a", |seq| build("a", seq)).unwrap();

        // Builder ignoring the sequence collides with the existing number
        let err = repo
            .insert_new("a", |_| build("a", 1))
            .unwrap_err();
        assert!(matches!(err, StorageError::Conflict(_)));

        // Aborted transaction did not consume sequence 2
        let next = repo.insert_new("a", |seq| build("a", seq)).unwrap();
        assert_eq!(next.order_number, "a-0002");
    }

    #[test]
    fn test_update_writes_only_on_change() {
        let repo = OrderRepository::new(Storage::open_in_memory().unwrap());
        let order = repo.insert_new("a", |seq| build("a", seq)).unwrap();

        let updated: Option<Order> = repo
            .update::<_, StorageError>(&order.id, |o| {
                o.status = OrderStatus::Ready;
                Ok(true)
            })
            .unwrap();
        assert_eq!(updated.unwrap().status, OrderStatus::Ready);

        let unchanged = repo
            .update::<_, StorageError>(&order.id, |o| {
                o.status = OrderStatus::Served;
                Ok(false)
            })
            .unwrap()
            .unwrap();
        // Returned value reflects the closure, storage does not
        assert_eq!(unchanged.status, OrderStatus::Served);
        assert_eq!(repo.get(&order.id).unwrap().unwrap().status, OrderStatus::Ready);

        let missing = repo
            .update::<_, StorageError>("nope", |_| Ok(true))
            .unwrap();
        assert!(missing.is_none());
    }

    #[test]
    fn test_list_by_venue_newest_first() {
        let repo = OrderRepository::new(Storage::open_in_memory().unwrap());
        for _ in 0..3 {
            repo.insert_new("a", |seq| build("a", seq)).unwrap();
        }
        repo.insert_new("ab", |seq| build("ab", seq)).unwrap();

        let numbers: Vec<String> = repo
            .list_by_venue("a")
            .unwrap()
            .into_iter()
            .map(|o| o.order_number)
            .collect();
        assert_eq!(numbers, vec!["a-0003", "a-0002", "a-0001"]);
    }
}
