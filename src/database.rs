use crate::api::{Dish, Order, SeedData};
use crate::errors::{Error, Result};
use crate::ids;

pub mod sqlite;

/// Trait hiding the storage behind the dish and order collections
///
/// Handlers only ever talk to this trait, so the in-memory vectors can be swapped for SQLite (or
/// anything else) without touching validation. Both collections keep insertion order.
///
/// Implementations don't lock anything themselves: the server serializes access to the whole
/// database, one request at a time.
pub trait Database: Send {
    /// Create a new empty database
    fn new() -> Result<Self>
    where
        Self: Sized;

    /// All dishes, in insertion order
    fn list_dishes(&self) -> Result<Vec<Dish>>;

    /// The dish with the given id, if any
    fn find_dish(&self, id: &str) -> Result<Option<Dish>>;

    /// Append a new dish. The id must not be in use.
    fn insert_dish(&mut self, dish: Dish) -> Result<Dish>;

    /// Overwrite the stored dish that has the same id, keeping its position
    ///
    /// Returns NotFound if there is no such dish
    fn update_dish(&mut self, dish: Dish) -> Result<Dish>;

    /// All orders, in insertion order
    fn list_orders(&self) -> Result<Vec<Order>>;

    /// The order with the given id, if any
    fn find_order(&self, id: &str) -> Result<Option<Order>>;

    /// Append a new order. The id must not be in use.
    fn insert_order(&mut self, order: Order) -> Result<Order>;

    /// Overwrite the order stored under `id`, keeping its position. The new record may carry a
    /// different id.
    ///
    /// Returns NotFound if there is no such order
    fn update_order(&mut self, id: &str, order: Order) -> Result<Order>;

    /// Remove the order with the given id and return it, or None if it didn't exist
    fn remove_order(&mut self, id: &str) -> Result<Option<Order>>;

    /// Whether any record, dish or order, already uses this id
    fn contains_id(&self, id: &str) -> Result<bool> {
        Ok(self.find_dish(id)?.is_some() || self.find_order(id)?.is_some())
    }

    /// A new id, unused by any dish or order
    fn fresh_id(&self) -> Result<String> {
        let mut lookup_error = None;
        let id = ids::next_id(|candidate| match self.contains_id(candidate) {
            Ok(taken) => taken,
            Err(err) => {
                lookup_error.get_or_insert(err);
                false
            }
        });
        match lookup_error {
            Some(err) => Err(err),
            None => Ok(id),
        }
    }

    /// Insert seed records, refusing duplicated ids
    fn load(&mut self, seed: SeedData) -> Result<()> {
        for dish in seed.dishes {
            if self.contains_id(&dish.id)? {
                return Err(Error::Config(format!("Duplicated id in seed data: {}", dish.id)));
            }
            self.insert_dish(dish)?;
        }
        for order in seed.orders {
            if self.contains_id(&order.id)? {
                return Err(Error::Config(format!("Duplicated id in seed data: {}", order.id)));
            }
            self.insert_order(order)?;
        }
        Ok(())
    }
}

fn missing(kind: &str, id: &str) -> Error {
    Error::NotFound(format!("No {} with id {}", kind, id))
}

pub mod memory {

    use super::*;

    /// Plain vectors, scanned linearly
    #[derive(Default)]
    pub struct InMemoryDB {
        dishes: Vec<Dish>,
        orders: Vec<Order>,
    }

    impl Database for InMemoryDB {
        fn new() -> Result<Self> {
            Ok(InMemoryDB::default())
        }

        fn list_dishes(&self) -> Result<Vec<Dish>> {
            Ok(self.dishes.clone())
        }

        fn find_dish(&self, id: &str) -> Result<Option<Dish>> {
            Ok(self.dishes.iter().find(|dish| dish.id == id).cloned())
        }

        fn insert_dish(&mut self, dish: Dish) -> Result<Dish> {
            self.dishes.push(dish.clone());
            Ok(dish)
        }

        fn update_dish(&mut self, dish: Dish) -> Result<Dish> {
            let slot = self
                .dishes
                .iter_mut()
                .find(|stored| stored.id == dish.id)
                .ok_or_else(|| missing("dish", &dish.id))?;
            *slot = dish.clone();
            Ok(dish)
        }

        fn list_orders(&self) -> Result<Vec<Order>> {
            Ok(self.orders.clone())
        }

        fn find_order(&self, id: &str) -> Result<Option<Order>> {
            Ok(self.orders.iter().find(|order| order.id == id).cloned())
        }

        fn insert_order(&mut self, order: Order) -> Result<Order> {
            self.orders.push(order.clone());
            Ok(order)
        }

        fn update_order(&mut self, id: &str, order: Order) -> Result<Order> {
            let slot = self
                .orders
                .iter_mut()
                .find(|stored| stored.id == id)
                .ok_or_else(|| missing("order", id))?;
            *slot = order.clone();
            Ok(order)
        }

        fn remove_order(&mut self, id: &str) -> Result<Option<Order>> {
            Ok(self
                .orders
                .iter()
                .position(|order| order.id == id)
                .map(|index| self.orders.remove(index)))
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::database::test_support::*;

        #[test]
        fn test_in_memory_dishes() {
            check_dishes(InMemoryDB::new().unwrap());
        }

        #[test]
        fn test_in_memory_orders() {
            check_orders(InMemoryDB::new().unwrap());
        }

        #[test]
        fn test_in_memory_seed() {
            check_seed(InMemoryDB::new().unwrap());
        }
    }
}
