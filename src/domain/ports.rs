use uuid::Uuid;

use super::errors::DomainError;
use super::order::{NewOrder, OrderStatus, OrderView, SalesStats};
use super::product::{InventoryStats, Product, ProductChanges, ProductDraft};
use super::user::{NewUser, User};

pub trait ProductRepository: Send + Sync + 'static {
    fn list(&self, category: Option<&str>) -> Result<Vec<Product>, DomainError>;
    fn find_by_id(&self, id: Uuid) -> Result<Option<Product>, DomainError>;
    fn create(&self, draft: ProductDraft) -> Result<Product, DomainError>;
    fn update(&self, id: Uuid, changes: ProductChanges) -> Result<Option<Product>, DomainError>;
    fn delete(&self, id: Uuid) -> Result<bool, DomainError>;
    fn inventory_stats(&self, low_stock_threshold: i32) -> Result<InventoryStats, DomainError>;
}

pub trait OrderRepository: Send + Sync + 'static {
    /// Reserves stock for every line and records the order as one unit:
    /// either all lines are reserved and the order exists, or nothing changed.
    fn place(&self, order: NewOrder) -> Result<OrderView, DomainError>;
    fn list_for_user(&self, user_id: Uuid) -> Result<Vec<OrderView>, DomainError>;
    fn list_all(&self) -> Result<Vec<OrderView>, DomainError>;
    fn update_status(&self, id: Uuid, status: OrderStatus)
        -> Result<Option<OrderView>, DomainError>;
    fn sales_stats(&self) -> Result<SalesStats, DomainError>;
}

pub trait UserRepository: Send + Sync + 'static {
    /// Fails with `DomainError::Conflict` when the email is taken.
    fn create(&self, user: NewUser) -> Result<User, DomainError>;
    fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError>;
    fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DomainError>;
}
