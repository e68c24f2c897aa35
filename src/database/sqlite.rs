use crate::api::{Dish, Order};
use crate::database::Database;
use crate::errors::{Error, Result};
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;

/// Contains the SQL queries used to interact with the database
///
/// Records are stored as JSON documents. Orders carry caller-defined dish references, so a
/// column per field wouldn't fit them anyway. The sequence column keeps insertion order.
pub mod sql_queries {
    pub const CREATE_DISHES: &str =
        "CREATE TABLE IF NOT EXISTS dishes (seq INTEGER PRIMARY KEY AUTOINCREMENT, id TEXT NOT NULL UNIQUE, body TEXT NOT NULL)";
    pub const CREATE_ORDERS: &str =
        "CREATE TABLE IF NOT EXISTS orders (seq INTEGER PRIMARY KEY AUTOINCREMENT, id TEXT NOT NULL UNIQUE, body TEXT NOT NULL)";

    pub const SELECT_DISHES: &str = "SELECT body FROM dishes ORDER BY seq";
    pub const SELECT_DISH: &str = "SELECT body FROM dishes WHERE id = ?1";
    pub const INSERT_DISH: &str = "INSERT INTO dishes (id, body) VALUES (?1, ?2)";
    pub const UPDATE_DISH: &str = "UPDATE dishes SET body = ?2 WHERE id = ?1";

    pub const SELECT_ORDERS: &str = "SELECT body FROM orders ORDER BY seq";
    pub const SELECT_ORDER: &str = "SELECT body FROM orders WHERE id = ?1";
    pub const INSERT_ORDER: &str = "INSERT INTO orders (id, body) VALUES (?1, ?2)";
    pub const UPDATE_ORDER: &str = "UPDATE orders SET id = ?2, body = ?3 WHERE id = ?1";
    pub const DELETE_ORDER: &str = "DELETE FROM orders WHERE id = ?1";
}

/// SQLite-backed store, living in memory for the lifetime of the process
pub struct SqliteDB {
    conn: Connection,
}

impl SqliteDB {
    fn select_all<T: DeserializeOwned>(&self, query: &str) -> Result<Vec<T>> {
        let mut stmt = self.conn.prepare_cached(query)?;
        let bodies = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        bodies
            .iter()
            .map(|body| serde_json::from_str(body).map_err(Error::from))
            .collect()
    }

    fn select_one<T: DeserializeOwned>(&self, query: &str, id: &str) -> Result<Option<T>> {
        let body: Option<String> = self
            .conn
            .prepare_cached(query)?
            .query_row(params![id], |row| row.get(0))
            .optional()?;
        body.map(|body| serde_json::from_str(&body).map_err(Error::from))
            .transpose()
    }
}

impl Database for SqliteDB {
    fn new() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute(sql_queries::CREATE_DISHES, [])?;
        conn.execute(sql_queries::CREATE_ORDERS, [])?;
        Ok(SqliteDB { conn })
    }

    fn list_dishes(&self) -> Result<Vec<Dish>> {
        self.select_all(sql_queries::SELECT_DISHES)
    }

    fn find_dish(&self, id: &str) -> Result<Option<Dish>> {
        self.select_one(sql_queries::SELECT_DISH, id)
    }

    fn insert_dish(&mut self, dish: Dish) -> Result<Dish> {
        let body = serde_json::to_string(&dish)?;
        self.conn
            .prepare_cached(sql_queries::INSERT_DISH)?
            .execute(params![dish.id, body])?;
        Ok(dish)
    }

    fn update_dish(&mut self, dish: Dish) -> Result<Dish> {
        let body = serde_json::to_string(&dish)?;
        let changed = self
            .conn
            .prepare_cached(sql_queries::UPDATE_DISH)?
            .execute(params![dish.id, body])?;
        if changed == 0 {
            return Err(Error::NotFound(format!("No dish with id {}", dish.id)));
        }
        Ok(dish)
    }

    fn list_orders(&self) -> Result<Vec<Order>> {
        self.select_all(sql_queries::SELECT_ORDERS)
    }

    fn find_order(&self, id: &str) -> Result<Option<Order>> {
        self.select_one(sql_queries::SELECT_ORDER, id)
    }

    fn insert_order(&mut self, order: Order) -> Result<Order> {
        let body = serde_json::to_string(&order)?;
        self.conn
            .prepare_cached(sql_queries::INSERT_ORDER)?
            .execute(params![order.id, body])?;
        Ok(order)
    }

    fn update_order(&mut self, id: &str, order: Order) -> Result<Order> {
        let body = serde_json::to_string(&order)?;
        let changed = self
            .conn
            .prepare_cached(sql_queries::UPDATE_ORDER)?
            .execute(params![id, order.id, body])?;
        if changed == 0 {
            return Err(Error::NotFound(format!("No order with id {}", id)));
        }
        Ok(order)
    }

    fn remove_order(&mut self, id: &str) -> Result<Option<Order>> {
        let tx = self.conn.transaction()?;
        let body: Option<String> = tx
            .query_row(sql_queries::SELECT_ORDER, params![id], |row| row.get(0))
            .optional()?;
        let Some(body) = body else {
            return Ok(None);
        };
        tx.execute(sql_queries::DELETE_ORDER, params![id])?;
        tx.commit()?;
        Ok(Some(serde_json::from_str(&body)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_support::*;

    #[test]
    fn test_sqlite_dishes() {
        check_dishes(SqliteDB::new().unwrap());
    }

    #[test]
    fn test_sqlite_orders() {
        check_orders(SqliteDB::new().unwrap());
    }

    #[test]
    fn test_sqlite_seed() {
        check_seed(SqliteDB::new().unwrap());
    }

    #[test]
    fn test_order_lines_survive_storage() {
        let mut db = SqliteDB::new().unwrap();
        db.insert_order(order("o1", "pending")).unwrap();
        let stored = db.find_order("o1").unwrap().unwrap();
        assert_eq!(stored, order("o1", "pending"));
    }
}
