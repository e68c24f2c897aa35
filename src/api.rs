// This file contains the basic types used to communicate through the API
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Every request and successful response body wraps its payload in `data`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Envelope<T> {
    pub data: T,
}

impl<T> Envelope<T> {
    pub fn new(data: T) -> Self {
        Envelope { data }
    }
}

/// Body of error responses
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ErrorBody {
    pub error: String,
}

/// A dish, as stored and returned by the API
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Dish {
    /// Unique ID, given by the server on creation
    pub id: String,
    pub name: String,
    pub description: String,
    /// Price in the smallest currency unit
    pub price: u64,
    pub image_url: String,
}

/// Lifecycle of an order. `Delivered` is terminal.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum OrderStatus {
    Pending,
    Preparing,
    OutForDelivery,
    Delivered,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 4] = [
        OrderStatus::Pending,
        OrderStatus::Preparing,
        OrderStatus::OutForDelivery,
        OrderStatus::Delivered,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Preparing => "preparing",
            OrderStatus::OutForDelivery => "out-for-delivery",
            OrderStatus::Delivered => "delivered",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or(())
    }
}

/// One line of an order.
///
/// The dish reference is whatever the caller sent (a `dishId`, a whole dish...), it is kept
/// untouched next to the quantity. The quantity stays a raw JSON value because the
/// fall-through validation mode can store lines whose quantity failed validation.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct OrderLine {
    #[serde(default)]
    pub quantity: Value,
    #[serde(flatten)]
    pub dish: Map<String, Value>,
}

/// A full order, as stored and returned by the API
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Unique ID, given by the server on creation
    pub id: String,
    #[serde(default)]
    pub deliver_to: String,
    #[serde(default)]
    pub mobile_number: String,
    /// Free-form at creation, only constrained on update
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default)]
    pub dishes: Vec<OrderLine>,
}

impl Order {
    /// The status, if it is one of the known lifecycle values
    pub fn lifecycle(&self) -> Option<OrderStatus> {
        self.status.as_deref().and_then(|s| s.parse().ok())
    }

    pub fn is_pending(&self) -> bool {
        self.lifecycle() == Some(OrderStatus::Pending)
    }

    pub fn is_delivered(&self) -> bool {
        self.lifecycle() == Some(OrderStatus::Delivered)
    }
}

/// Contents of a seed file, loaded into the store at startup
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct SeedData {
    #[serde(default)]
    pub dishes: Vec<Dish>,
    #[serde(default)]
    pub orders: Vec<Order>,
}
