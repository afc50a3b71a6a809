//! In-memory repositories for service tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::order::{
    order_total, CustomerSummary, NewOrder, OrderLineView, OrderStatus, OrderView,
    ProductSummary, SalesStats,
};
use crate::domain::ports::{OrderRepository, ProductRepository, UserRepository};
use crate::domain::product::{InventoryStats, Product, ProductChanges, ProductDraft};
use crate::domain::user::{NewUser, User};

#[derive(Default)]
struct State {
    products: HashMap<Uuid, Product>,
    orders: Vec<OrderView>,
    users: Vec<User>,
}

/// One shared store backing all three repository ports.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<State>>,
}

impl InMemoryStore {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().expect("in-memory store poisoned")
    }
}

impl ProductRepository for InMemoryStore {
    fn list(&self, category: Option<&str>) -> Result<Vec<Product>, DomainError> {
        let state = self.lock();
        let mut products: Vec<Product> = state
            .products
            .values()
            .filter(|p| category.map_or(true, |c| p.category == c))
            .cloned()
            .collect();
        products.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(products)
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<Product>, DomainError> {
        Ok(self.lock().products.get(&id).cloned())
    }

    fn create(&self, draft: ProductDraft) -> Result<Product, DomainError> {
        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4(),
            name: draft.name,
            description: draft.description,
            price: draft.price,
            category: draft.category,
            image_url: draft.image_url,
            stock: draft.stock,
            created_at: now,
            updated_at: now,
        };
        self.lock().products.insert(product.id, product.clone());
        Ok(product)
    }

    fn update(&self, id: Uuid, changes: ProductChanges) -> Result<Option<Product>, DomainError> {
        let mut state = self.lock();
        let Some(product) = state.products.get_mut(&id) else {
            return Ok(None);
        };
        changes.apply(product);
        product.updated_at = Utc::now();
        Ok(Some(product.clone()))
    }

    fn delete(&self, id: Uuid) -> Result<bool, DomainError> {
        Ok(self.lock().products.remove(&id).is_some())
    }

    fn inventory_stats(&self, low_stock_threshold: i32) -> Result<InventoryStats, DomainError> {
        let state = self.lock();
        Ok(InventoryStats {
            total_products: state.products.len() as i64,
            low_stock: state
                .products
                .values()
                .filter(|p| p.stock < low_stock_threshold)
                .count() as i64,
        })
    }
}

impl OrderRepository for InMemoryStore {
    fn place(&self, order: NewOrder) -> Result<OrderView, DomainError> {
        let mut state = self.lock();

        // Work on a copy of the stock levels and only commit if every line fits.
        let mut remaining: HashMap<Uuid, i32> =
            state.products.iter().map(|(id, p)| (*id, p.stock)).collect();
        let mut lines = Vec::with_capacity(order.lines.len());
        for line in &order.lines {
            let product = state.products.get(&line.product_id).ok_or_else(|| {
                DomainError::NotFound(format!("Product with ID {} not found", line.product_id))
            })?;
            let left = remaining.entry(line.product_id).or_insert(product.stock);
            if *left < line.quantity {
                return Err(DomainError::InsufficientStock(product.name.clone()));
            }
            *left -= line.quantity;
            lines.push(OrderLineView {
                id: Uuid::new_v4(),
                product_id: line.product_id,
                quantity: line.quantity,
                price: product.price.clone(),
                product: ProductSummary {
                    id: Some(product.id),
                    name: product.name.clone(),
                    price: product.price.clone(),
                    image_url: product.image_url.clone(),
                },
            });
        }

        for (id, stock) in remaining {
            if let Some(product) = state.products.get_mut(&id) {
                product.stock = stock;
            }
        }

        let now = Utc::now();
        let view = OrderView {
            id: Uuid::new_v4(),
            user_id: order.user_id,
            customer: None,
            total_amount: order_total(lines.iter().map(|l| (&l.price, l.quantity))),
            lines,
            shipping_address: order.shipping_address,
            payment_method: order.payment_method,
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        state.orders.push(view.clone());
        Ok(view)
    }

    fn list_for_user(&self, user_id: Uuid) -> Result<Vec<OrderView>, DomainError> {
        Ok(self
            .lock()
            .orders
            .iter()
            .rev()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect())
    }

    fn list_all(&self) -> Result<Vec<OrderView>, DomainError> {
        let state = self.lock();
        Ok(state
            .orders
            .iter()
            .rev()
            .map(|o| {
                let customer = state
                    .users
                    .iter()
                    .find(|u| u.id == o.user_id)
                    .map(|u| CustomerSummary {
                        name: u.name.clone(),
                        email: u.email.clone(),
                    })
                    .unwrap_or_else(CustomerSummary::unknown);
                OrderView {
                    customer: Some(customer),
                    ..o.clone()
                }
            })
            .collect())
    }

    fn update_status(
        &self,
        id: Uuid,
        status: OrderStatus,
    ) -> Result<Option<OrderView>, DomainError> {
        let mut state = self.lock();
        let Some(order) = state.orders.iter_mut().find(|o| o.id == id) else {
            return Ok(None);
        };
        order.status = status;
        order.updated_at = Utc::now();
        Ok(Some(order.clone()))
    }

    fn sales_stats(&self) -> Result<SalesStats, DomainError> {
        let state = self.lock();
        Ok(SalesStats {
            total_orders: state.orders.len() as i64,
            revenue: state.orders.iter().map(|o| o.total_amount.clone()).sum(),
        })
    }
}

impl UserRepository for InMemoryStore {
    fn create(&self, user: NewUser) -> Result<User, DomainError> {
        let mut state = self.lock();
        if state.users.iter().any(|u| u.email == user.email) {
            return Err(DomainError::Conflict("User already exists".into()));
        }
        let user = User {
            id: Uuid::new_v4(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            created_at: Utc::now(),
        };
        state.users.push(user.clone());
        Ok(user)
    }

    fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        Ok(self.lock().users.iter().find(|u| u.email == email).cloned())
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DomainError> {
        Ok(self.lock().users.iter().find(|u| u.id == id).cloned())
    }
}
