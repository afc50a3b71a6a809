use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::order::{OrderDraft, OrderStatus, OrderView, SalesStats};
use crate::domain::ports::OrderRepository;

pub struct OrderService<R> {
    repo: R,
}

impl<R: OrderRepository> OrderService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Validates the checkout draft, then reserves stock and records the
    /// order in one step. Line prices and the total come from the catalogue
    /// at reservation time, not from the client.
    pub fn place_order(&self, user_id: Uuid, draft: OrderDraft) -> Result<OrderView, DomainError> {
        let order = draft.validate(user_id)?;
        match self.repo.place(order) {
            Ok(view) => {
                log::info!(
                    "Order {} placed by {} ({} lines, total {})",
                    view.id,
                    user_id,
                    view.lines.len(),
                    view.total_amount
                );
                Ok(view)
            }
            Err(e) => {
                log::warn!("Order rejected for {}: {}", user_id, e);
                Err(e)
            }
        }
    }

    pub fn orders_for_user(&self, user_id: Uuid) -> Result<Vec<OrderView>, DomainError> {
        self.repo.list_for_user(user_id)
    }

    pub fn all_orders(&self) -> Result<Vec<OrderView>, DomainError> {
        self.repo.list_all()
    }

    pub fn update_status(&self, id: Uuid, status: &str) -> Result<OrderView, DomainError> {
        let status: OrderStatus = status.trim().parse()?;
        let view = self
            .repo
            .update_status(id, status)?
            .ok_or_else(|| DomainError::NotFound("Order not found".into()))?;
        log::info!("Order {} moved to {}", id, status);
        Ok(view)
    }

    pub fn sales_stats(&self) -> Result<SalesStats, DomainError> {
        self.repo.sales_stats()
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use bigdecimal::BigDecimal;

    use super::*;
    use crate::domain::order::{OrderLineDraft, ShippingAddress};
    use crate::domain::ports::ProductRepository;
    use crate::domain::product::{ProductChanges, ProductDraft};
    use crate::testing::InMemoryStore;

    fn add_product(store: &InMemoryStore, name: &str, price: &str, stock: i32) -> Uuid {
        store
            .create(ProductDraft {
                name: name.into(),
                description: String::new(),
                price: BigDecimal::from_str(price).unwrap(),
                category: "Painting".into(),
                image_url: String::new(),
                stock,
            })
            .unwrap()
            .id
    }

    fn stock_of(store: &InMemoryStore, id: Uuid) -> i32 {
        ProductRepository::find_by_id(store, id).unwrap().unwrap().stock
    }

    fn draft(lines: &[(Uuid, i64)]) -> OrderDraft {
        OrderDraft {
            items: lines
                .iter()
                .map(|(id, qty)| OrderLineDraft {
                    product: Some(id.to_string()),
                    quantity: Some(*qty),
                    price: Some(1.0),
                })
                .collect(),
            shipping_address: Some(ShippingAddress {
                street: "12 Easel Street".into(),
                city: "Mumbai".into(),
                state: "MH".into(),
                zip_code: "400001".into(),
            }),
            total_amount: Some(1.0),
            payment_method: None,
        }
    }

    #[test]
    fn placing_an_order_decrements_stock_and_prices_from_catalogue() {
        let store = InMemoryStore::default();
        let paint = add_product(&store, "Acrylic Paint Set", "24.99", 50);
        let book = add_product(&store, "Sketch Book", "9.99", 100);
        let service = OrderService::new(store.clone());

        let order = service
            .place_order(Uuid::new_v4(), draft(&[(paint, 2), (book, 3)]))
            .expect("order should be placed");

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.total_amount, BigDecimal::from_str("79.95").unwrap());
        assert_eq!(order.lines[0].price, BigDecimal::from_str("24.99").unwrap());
        assert_eq!(stock_of(&store, paint), 48);
        assert_eq!(stock_of(&store, book), 97);
    }

    #[test]
    fn later_price_changes_do_not_touch_placed_orders() {
        let store = InMemoryStore::default();
        let clay = add_product(&store, "Clay Set", "29.99", 10);
        let service = OrderService::new(store.clone());
        let user = Uuid::new_v4();

        service.place_order(user, draft(&[(clay, 1)])).unwrap();
        store
            .update(
                clay,
                ProductChanges {
                    price: Some(BigDecimal::from_str("99.00").unwrap()),
                    ..Default::default()
                },
            )
            .unwrap();

        let orders = service.orders_for_user(user).unwrap();
        assert_eq!(orders[0].total_amount, BigDecimal::from_str("29.99").unwrap());
        assert_eq!(orders[0].lines[0].price, BigDecimal::from_str("29.99").unwrap());
    }

    #[test]
    fn insufficient_stock_rejects_the_whole_order() {
        let store = InMemoryStore::default();
        let plenty = add_product(&store, "Glitter Pack", "8.50", 75);
        let scarce = add_product(&store, "DIY Candle Kit", "27.99", 1);
        let service = OrderService::new(store.clone());

        let result = service.place_order(Uuid::new_v4(), draft(&[(plenty, 5), (scarce, 2)]));

        match result {
            Err(DomainError::InsufficientStock(name)) => assert_eq!(name, "DIY Candle Kit"),
            other => panic!("expected insufficient stock, got {:?}", other),
        }
        assert_eq!(stock_of(&store, plenty), 75);
        assert_eq!(stock_of(&store, scarce), 1);
        assert!(service.all_orders().unwrap().is_empty());
    }

    #[test]
    fn repeated_lines_for_one_product_are_checked_together() {
        let store = InMemoryStore::default();
        let kit = add_product(&store, "DIY Jewelry Kit", "22.99", 3);
        let service = OrderService::new(store.clone());

        let result = service.place_order(Uuid::new_v4(), draft(&[(kit, 2), (kit, 2)]));

        assert!(matches!(result, Err(DomainError::InsufficientStock(_))));
        assert_eq!(stock_of(&store, kit), 3);
    }

    #[test]
    fn unknown_product_is_not_found() {
        let store = InMemoryStore::default();
        let service = OrderService::new(store);

        let result = service.place_order(Uuid::new_v4(), draft(&[(Uuid::new_v4(), 1)]));
        assert!(matches!(result, Err(DomainError::NotFound(_))));
    }

    #[test]
    fn invalid_draft_never_reaches_the_store() {
        let store = InMemoryStore::default();
        let pencils = add_product(&store, "Colored Pencils", "19.99", 45);
        let service = OrderService::new(store.clone());

        let result = service.place_order(Uuid::new_v4(), draft(&[(pencils, 0)]));
        assert!(matches!(result, Err(DomainError::InvalidInput(_))));
        assert_eq!(stock_of(&store, pencils), 45);
    }

    #[test]
    fn same_cart_twice_creates_two_orders() {
        let store = InMemoryStore::default();
        let tape = add_product(&store, "Washi Tape Set", "13.99", 42);
        let service = OrderService::new(store.clone());
        let user = Uuid::new_v4();

        let first = service.place_order(user, draft(&[(tape, 1)])).unwrap();
        let second = service.place_order(user, draft(&[(tape, 1)])).unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(service.orders_for_user(user).unwrap().len(), 2);
        assert_eq!(stock_of(&store, tape), 40);
    }

    #[test]
    fn users_only_see_their_own_orders() {
        let store = InMemoryStore::default();
        let mat = add_product(&store, "Cutting Mat", "17.99", 28);
        let service = OrderService::new(store.clone());
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        service.place_order(alice, draft(&[(mat, 1)])).unwrap();
        service.place_order(bob, draft(&[(mat, 2)])).unwrap();

        let mine = service.orders_for_user(alice).unwrap();
        assert_eq!(mine.len(), 1);
        assert!(mine.iter().all(|o| o.user_id == alice));
        assert_eq!(service.all_orders().unwrap().len(), 2);
    }

    #[test]
    fn update_status_validates_and_persists() {
        let store = InMemoryStore::default();
        let liners = add_product(&store, "Fine Liners", "12.99", 55);
        let service = OrderService::new(store.clone());
        let order = service
            .place_order(Uuid::new_v4(), draft(&[(liners, 1)]))
            .unwrap();

        let updated = service.update_status(order.id, "shipped").unwrap();
        assert_eq!(updated.status, OrderStatus::Shipped);

        assert!(matches!(
            service.update_status(order.id, "lost"),
            Err(DomainError::InvalidInput(_))
        ));
        assert!(matches!(
            service.update_status(Uuid::new_v4(), "delivered"),
            Err(DomainError::NotFound(_))
        ));
    }

    #[test]
    fn sales_stats_sum_order_totals() {
        let store = InMemoryStore::default();
        let scissors = add_product(&store, "Craft Scissors", "7.99", 60);
        let service = OrderService::new(store.clone());

        service.place_order(Uuid::new_v4(), draft(&[(scissors, 2)])).unwrap();
        service.place_order(Uuid::new_v4(), draft(&[(scissors, 1)])).unwrap();

        let stats = service.sales_stats().unwrap();
        assert_eq!(stats.total_orders, 2);
        assert_eq!(stats.revenue, BigDecimal::from_str("23.97").unwrap());
    }
}
