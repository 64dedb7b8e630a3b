//! Domain records shared by the storefront, the admin panel and the CLI.
//!
//! These are the application's view of each backend table. The backend crate
//! maps them to and from stored documents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cart::ProductSnapshot;
use crate::checkout::OrderNumber;
use crate::pricing::{TierPrice, WeightTier, price_table};
use crate::types::{
    AdminRole, AdminUserId, CustomerId, FileId, OrderId, OrderItemId, OrderStatus, PaymentMethod,
    PhoneNumber, Price, ProductId, VisitorId, VisitorSessionId,
};

/// A catalog product, priced per kilogram.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub category: String,
    pub image_file_id: Option<FileId>,
    pub image_url: Option<String>,
    pub base_price: Price,
    pub stock_quantity: u32,
    pub is_active: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Product {
    /// What a cart line keeps about this product.
    #[must_use]
    pub fn snapshot(&self) -> ProductSnapshot {
        ProductSnapshot {
            id: self.id.clone(),
            name: self.name.clone(),
            category: self.category.clone(),
            image_url: self.image_url.clone(),
        }
    }

    #[must_use]
    pub fn price_table(&self) -> [TierPrice; 4] {
        price_table(self.base_price)
    }

    /// Case-insensitive match on name, description and category.
    #[must_use]
    pub fn matches_query(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        query.is_empty()
            || self.name.to_lowercase().contains(&query)
            || self.description.to_lowercase().contains(&query)
            || self.category.to_lowercase().contains(&query)
    }
}

/// Fields for creating or replacing a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub category: String,
    pub image_file_id: Option<FileId>,
    pub image_url: Option<String>,
    pub base_price: Price,
    pub stock_quantity: u32,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    pub phone: PhoneNumber,
    pub email: Option<String>,
    pub address: String,
    pub area: String,
    pub city: String,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCustomer {
    pub name: String,
    pub phone: PhoneNumber,
    pub email: Option<String>,
    pub address: String,
    pub area: String,
    pub city: String,
}

/// An order with the customer's details copied in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub order_number: Option<OrderNumber>,
    pub customer_id: CustomerId,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_address: String,
    pub customer_area: String,
    pub subtotal: Price,
    pub delivery_fee: Price,
    pub total_amount: Price,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Case-insensitive match on customer name, phone and order id.
    #[must_use]
    pub fn matches_query(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        query.is_empty()
            || self.customer_name.to_lowercase().contains(&query)
            || self.customer_phone.contains(&query)
            || self.id.as_str().to_lowercase().contains(&query)
            || self
                .order_number
                .as_ref()
                .is_some_and(|n| n.as_str().to_lowercase().contains(&query))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub order_number: OrderNumber,
    pub customer_id: CustomerId,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_address: String,
    pub customer_area: String,
    pub subtotal: Price,
    pub delivery_fee: Price,
    pub total_amount: Price,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub product_name: String,
    pub weight_tier: Option<WeightTier>,
    pub quantity: u32,
    pub unit_price: Price,
    pub total_price: Price,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderItem {
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub product_name: String,
    pub weight_tier: WeightTier,
    pub quantity: u32,
    pub unit_price: Price,
    pub total_price: Price,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminUser {
    pub id: AdminUserId,
    pub username: String,
    pub email: String,
    pub role: AdminRole,
    pub is_active: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub last_login: Option<DateTime<Utc>>,
}

/// One visitor's browsing session as recorded by the tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitorSession {
    pub id: VisitorSessionId,
    pub visitor_id: VisitorId,
    pub user_agent: Option<String>,
    pub first_visit: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub page_count: u32,
    pub is_active: bool,
}
