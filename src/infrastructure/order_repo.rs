use std::collections::HashMap;

use bigdecimal::{BigDecimal, Zero};
use chrono::Utc;
use diesel::dsl::sum;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::order::{
    order_total, CustomerSummary, NewOrder, OrderLineInput, OrderLineView, OrderStatus,
    OrderView, ProductSummary, SalesStats, ShippingAddress,
};
use crate::domain::ports::OrderRepository;
use crate::schema::{order_items, orders, products, users};

use super::models::{NewOrderItemRow, NewOrderRow, OrderItemRow, OrderRow};

pub struct DieselOrderRepository {
    pool: DbPool,
}

impl DieselOrderRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

struct ReservedLine {
    position: i32,
    product_id: Uuid,
    quantity: i32,
    price: BigDecimal,
}

/// Collapse repeated products into one line each, in order of first
/// appearance.
fn merge_lines(lines: &[OrderLineInput]) -> Result<Vec<(Uuid, i32)>, DomainError> {
    let mut merged: Vec<(Uuid, i32)> = Vec::with_capacity(lines.len());
    for line in lines {
        match merged.iter_mut().find(|(id, _)| *id == line.product_id) {
            Some((_, quantity)) => {
                *quantity = quantity.checked_add(line.quantity).ok_or_else(|| {
                    DomainError::InvalidInput(format!(
                        "Quantity too large for product {}",
                        line.product_id
                    ))
                })?;
            }
            None => merged.push((line.product_id, line.quantity)),
        }
    }
    Ok(merged)
}

/// Take `quantity` units of a product if that many are on hand.
///
/// The stock test and the decrement are one statement, so two checkouts
/// racing for the last units cannot both succeed.
fn reserve(
    conn: &mut PgConnection,
    position: i32,
    product_id: Uuid,
    quantity: i32,
) -> Result<ReservedLine, DomainError> {
    let reserved: Option<BigDecimal> = diesel::update(
        products::table
            .filter(products::id.eq(product_id))
            .filter(products::stock.ge(quantity)),
    )
    .set((
        products::stock.eq(products::stock - quantity),
        products::updated_at.eq(Utc::now()),
    ))
    .returning(products::price)
    .get_result(conn)
    .optional()?;

    if let Some(price) = reserved {
        return Ok(ReservedLine {
            position,
            product_id,
            quantity,
            price,
        });
    }

    let name: Option<String> = products::table
        .find(product_id)
        .select(products::name)
        .first(conn)
        .optional()?;
    Err(match name {
        Some(name) => DomainError::InsufficientStock(name),
        None => DomainError::NotFound(format!("Product with ID {} not found", product_id)),
    })
}

/// Attach line items, product summaries and (optionally) customer summaries.
fn assemble(
    conn: &mut PgConnection,
    rows: Vec<OrderRow>,
    with_customers: bool,
) -> Result<Vec<OrderView>, DomainError> {
    let items: Vec<OrderItemRow> = OrderItemRow::belonging_to(&rows)
        .select(OrderItemRow::as_select())
        .order(order_items::position.asc())
        .load(conn)?;

    let product_ids: Vec<Uuid> = items.iter().map(|i| i.product_id).collect();
    let summaries: HashMap<Uuid, ProductSummary> = products::table
        .filter(products::id.eq_any(&product_ids))
        .select((
            products::id,
            products::name,
            products::price,
            products::image_url,
        ))
        .load::<(Uuid, String, BigDecimal, String)>(conn)?
        .into_iter()
        .map(|(id, name, price, image_url)| {
            (
                id,
                ProductSummary {
                    id: Some(id),
                    name,
                    price,
                    image_url,
                },
            )
        })
        .collect();

    let customers: HashMap<Uuid, CustomerSummary> = if with_customers {
        let user_ids: Vec<Uuid> = rows.iter().map(|o| o.user_id).collect();
        users::table
            .filter(users::id.eq_any(&user_ids))
            .select((users::id, users::name, users::email))
            .load::<(Uuid, String, String)>(conn)?
            .into_iter()
            .map(|(id, name, email)| (id, CustomerSummary { name, email }))
            .collect()
    } else {
        HashMap::new()
    };

    let grouped = items.grouped_by(&rows);
    rows.into_iter()
        .zip(grouped)
        .map(|(order, items)| -> Result<OrderView, DomainError> {
            let lines = items
                .into_iter()
                .map(|item| OrderLineView {
                    id: item.id,
                    product_id: item.product_id,
                    quantity: item.quantity,
                    product: summaries
                        .get(&item.product_id)
                        .cloned()
                        .unwrap_or_else(|| ProductSummary::unavailable(item.price.clone())),
                    price: item.price,
                })
                .collect();
            let customer = with_customers.then(|| {
                customers
                    .get(&order.user_id)
                    .cloned()
                    .unwrap_or_else(CustomerSummary::unknown)
            });
            Ok(OrderView {
                id: order.id,
                user_id: order.user_id,
                customer,
                lines,
                shipping_address: ShippingAddress {
                    street: order.street,
                    city: order.city,
                    state: order.state,
                    zip_code: order.zip_code,
                },
                payment_method: order.payment_method,
                total_amount: order.total_amount,
                status: order.status.parse::<OrderStatus>().map_err(|_| {
                    DomainError::Internal(format!("order {} has unknown status", order.id))
                })?,
                created_at: order.created_at,
                updated_at: order.updated_at,
            })
        })
        .collect()
}

impl OrderRepository for DieselOrderRepository {
    fn place(&self, order: NewOrder) -> Result<OrderView, DomainError> {
        let mut conn = self.pool.get()?;

        let mut lines: Vec<(i32, Uuid, i32)> = merge_lines(&order.lines)?
            .into_iter()
            .zip(0..)
            .map(|((product_id, quantity), position)| (position, product_id, quantity))
            .collect();
        // Row locks are always taken in product id order, so two carts holding
        // the same products in opposite order cannot deadlock.
        lines.sort_by_key(|&(_, product_id, _)| product_id);

        conn.transaction::<_, DomainError, _>(|conn| {
            // 1. Reserve stock line by line; any failure rolls back earlier lines.
            let mut reserved = lines
                .iter()
                .map(|&(position, product_id, quantity)| {
                    reserve(conn, position, product_id, quantity)
                })
                .collect::<Result<Vec<_>, _>>()?;
            reserved.sort_by_key(|l| l.position);

            // 2. Insert the order with the total computed from reserved prices.
            let order_id = Uuid::new_v4();
            let total_amount = order_total(reserved.iter().map(|l| (&l.price, l.quantity)));
            let row: OrderRow = diesel::insert_into(orders::table)
                .values(&NewOrderRow {
                    id: order_id,
                    user_id: order.user_id,
                    street: order.shipping_address.street,
                    city: order.shipping_address.city,
                    state: order.shipping_address.state,
                    zip_code: order.shipping_address.zip_code,
                    payment_method: order.payment_method,
                    total_amount,
                    status: OrderStatus::Pending.as_str().to_string(),
                })
                .returning(OrderRow::as_returning())
                .get_result(conn)?;

            // 3. Insert the line items.
            let new_items: Vec<NewOrderItemRow> = reserved
                .into_iter()
                .map(|l| NewOrderItemRow {
                    id: Uuid::new_v4(),
                    order_id,
                    product_id: l.product_id,
                    quantity: l.quantity,
                    price: l.price,
                    position: l.position,
                })
                .collect();
            diesel::insert_into(order_items::table)
                .values(&new_items)
                .execute(conn)?;

            assemble(conn, vec![row], false)?
                .pop()
                .ok_or_else(|| DomainError::Internal("order vanished after insert".into()))
        })
    }

    fn list_for_user(&self, user_id: Uuid) -> Result<Vec<OrderView>, DomainError> {
        let mut conn = self.pool.get()?;

        let rows: Vec<OrderRow> = orders::table
            .filter(orders::user_id.eq(user_id))
            .select(OrderRow::as_select())
            .order(orders::created_at.desc())
            .load(&mut conn)?;
        assemble(&mut conn, rows, false)
    }

    fn list_all(&self) -> Result<Vec<OrderView>, DomainError> {
        let mut conn = self.pool.get()?;

        let rows: Vec<OrderRow> = orders::table
            .select(OrderRow::as_select())
            .order(orders::created_at.desc())
            .load(&mut conn)?;
        assemble(&mut conn, rows, true)
    }

    fn update_status(
        &self,
        id: Uuid,
        status: OrderStatus,
    ) -> Result<Option<OrderView>, DomainError> {
        let mut conn = self.pool.get()?;

        let row: Option<OrderRow> = diesel::update(orders::table.find(id))
            .set((
                orders::status.eq(status.as_str()),
                orders::updated_at.eq(Utc::now()),
            ))
            .returning(OrderRow::as_returning())
            .get_result(&mut conn)
            .optional()?;

        let Some(row) = row else {
            return Ok(None);
        };
        Ok(assemble(&mut conn, vec![row], false)?.pop())
    }

    fn sales_stats(&self) -> Result<SalesStats, DomainError> {
        let mut conn = self.pool.get()?;

        let total_orders: i64 = orders::table.count().get_result(&mut conn)?;
        let revenue: Option<BigDecimal> = orders::table
            .select(sum(orders::total_amount))
            .first(&mut conn)?;

        Ok(SalesStats {
            total_orders,
            revenue: revenue.unwrap_or_else(BigDecimal::zero),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;
    use std::sync::Arc;
    use std::thread;

    use bigdecimal::BigDecimal;
    use uuid::Uuid;

    use super::DieselOrderRepository;
    use crate::domain::errors::DomainError;
    use crate::domain::order::{NewOrder, OrderLineInput, OrderStatus, ShippingAddress};
    use crate::domain::ports::{OrderRepository, ProductRepository};
    use crate::domain::product::{ProductChanges, ProductDraft};
    use crate::infrastructure::product_repo::DieselProductRepository;
    use crate::infrastructure::test_support::setup_db;

    fn add_product(repo: &DieselProductRepository, name: &str, price: &str, stock: i32) -> Uuid {
        repo.create(ProductDraft {
            name: name.into(),
            description: String::new(),
            price: BigDecimal::from_str(price).expect("valid decimal"),
            category: "Painting".into(),
            image_url: String::new(),
            stock,
        })
        .expect("create product failed")
        .id
    }

    fn stock_of(repo: &DieselProductRepository, id: Uuid) -> i32 {
        repo.find_by_id(id)
            .expect("find failed")
            .expect("product should exist")
            .stock
    }

    fn new_order(user_id: Uuid, lines: &[(Uuid, i32)]) -> NewOrder {
        NewOrder {
            user_id,
            lines: lines
                .iter()
                .map(|(product_id, quantity)| OrderLineInput {
                    product_id: *product_id,
                    quantity: *quantity,
                })
                .collect(),
            shipping_address: ShippingAddress {
                street: "7 Palette Lane".into(),
                city: "Delhi".into(),
                state: "DL".into(),
                zip_code: "110001".into(),
            },
            payment_method: "cod".into(),
        }
    }

    #[tokio::test]
    async fn place_reserves_stock_and_records_prices() {
        let (_container, pool) = setup_db().await;
        let products = DieselProductRepository::new(pool.clone());
        let orders = DieselOrderRepository::new(pool);
        let paint = add_product(&products, "Acrylic Paint Set", "24.99", 50);
        let book = add_product(&products, "Sketch Book", "9.99", 100);

        let order = orders
            .place(new_order(Uuid::new_v4(), &[(paint, 2), (book, 1)]))
            .expect("place failed");

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.lines.len(), 2);
        assert_eq!(order.total_amount, BigDecimal::from_str("59.97").unwrap());
        assert_eq!(stock_of(&products, paint), 48);
        assert_eq!(stock_of(&products, book), 99);
    }

    #[tokio::test]
    async fn insufficient_stock_rolls_back_every_line() {
        let (_container, pool) = setup_db().await;
        let products = DieselProductRepository::new(pool.clone());
        let orders = DieselOrderRepository::new(pool);
        let plenty = add_product(&products, "Glitter Pack", "8.50", 75);
        let scarce = add_product(&products, "DIY Candle Kit", "27.99", 1);

        let result = orders.place(new_order(Uuid::new_v4(), &[(plenty, 10), (scarce, 2)]));

        assert!(matches!(result, Err(DomainError::InsufficientStock(ref n)) if n == "DIY Candle Kit"));
        assert_eq!(stock_of(&products, plenty), 75);
        assert_eq!(stock_of(&products, scarce), 1);
        assert!(orders.list_all().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_product_is_not_found() {
        let (_container, pool) = setup_db().await;
        let orders = DieselOrderRepository::new(pool);

        let result = orders.place(new_order(Uuid::new_v4(), &[(Uuid::new_v4(), 1)]));
        assert!(matches!(result, Err(DomainError::NotFound(_))));
    }

    #[tokio::test]
    async fn concurrent_checkouts_never_oversell() {
        let (_container, pool) = setup_db().await;
        let products = DieselProductRepository::new(pool.clone());
        let kit = add_product(&products, "DIY Scrapbook Kit", "19.50", 5);
        let orders = Arc::new(DieselOrderRepository::new(pool));

        let handles: Vec<_> = (0..10)
            .map(|_| {
                let orders = Arc::clone(&orders);
                thread::spawn(move || orders.place(new_order(Uuid::new_v4(), &[(kit, 1)])).is_ok())
            })
            .collect();
        let placed = handles
            .into_iter()
            .map(|h| h.join().expect("thread panicked"))
            .filter(|ok| *ok)
            .count();

        assert_eq!(placed, 5);
        assert_eq!(stock_of(&products, kit), 0);
    }

    #[tokio::test]
    async fn opposite_order_carts_do_not_deadlock() {
        let (_container, pool) = setup_db().await;
        let products = DieselProductRepository::new(pool.clone());
        let brushes = add_product(&products, "Brush Set", "15.99", 1000);
        let canvas = add_product(&products, "Canvas Pack", "34.99", 1000);
        let orders = Arc::new(DieselOrderRepository::new(pool));

        let handles: Vec<_> = (0..8)
            .map(|n| {
                let orders = Arc::clone(&orders);
                let cart = if n % 2 == 0 {
                    [(brushes, 1), (canvas, 1)]
                } else {
                    [(canvas, 1), (brushes, 1)]
                };
                thread::spawn(move || {
                    (0..5)
                        .map(|_| orders.place(new_order(Uuid::new_v4(), &cart)))
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        let results: Vec<_> = handles
            .into_iter()
            .flat_map(|h| h.join().expect("thread panicked"))
            .collect();

        assert_eq!(results.len(), 40);
        assert!(results.iter().all(|r| r.is_ok()), "{:?}", results.iter().find(|r| r.is_err()));
        assert_eq!(stock_of(&products, brushes), 960);
        assert_eq!(stock_of(&products, canvas), 960);
    }

    #[tokio::test]
    async fn repeated_products_are_merged_into_one_line() {
        let (_container, pool) = setup_db().await;
        let products = DieselProductRepository::new(pool.clone());
        let orders = DieselOrderRepository::new(pool);
        let glue = add_product(&products, "Glue Gun", "14.99", 10);
        let tape = add_product(&products, "Washi Tape", "6.99", 10);

        let order = orders
            .place(new_order(Uuid::new_v4(), &[(glue, 2), (tape, 1), (glue, 3)]))
            .expect("place failed");

        let lines: Vec<_> = order.lines.iter().map(|l| (l.product_id, l.quantity)).collect();
        assert_eq!(lines, vec![(glue, 5), (tape, 1)]);
        assert_eq!(stock_of(&products, glue), 5);

        let result = orders.place(new_order(Uuid::new_v4(), &[(glue, 3), (glue, 3)]));
        assert!(matches!(result, Err(DomainError::InsufficientStock(ref n)) if n == "Glue Gun"));
        assert_eq!(stock_of(&products, glue), 5);
    }

    #[tokio::test]
    async fn lines_come_back_in_the_order_they_were_placed() {
        let (_container, pool) = setup_db().await;
        let products = DieselProductRepository::new(pool.clone());
        let orders = DieselOrderRepository::new(pool);
        let ids: Vec<Uuid> = ["Easel", "Palette", "Charcoal", "Fixative", "Smudger"]
            .iter()
            .map(|name| add_product(&products, name, "5.00", 20))
            .collect();
        let placed = [ids[3], ids[0], ids[4], ids[2], ids[1]];
        let cart: Vec<(Uuid, i32)> = placed.iter().map(|id| (*id, 1)).collect();
        let user = Uuid::new_v4();

        let order = orders.place(new_order(user, &cart)).expect("place failed");
        let returned: Vec<Uuid> = order.lines.iter().map(|l| l.product_id).collect();
        assert_eq!(returned, placed);

        let mine = orders.list_for_user(user).unwrap();
        let listed: Vec<Uuid> = mine[0].lines.iter().map(|l| l.product_id).collect();
        assert_eq!(listed, placed);
    }

    #[tokio::test]
    async fn orders_keep_their_price_and_survive_product_deletion() {
        let (_container, pool) = setup_db().await;
        let products = DieselProductRepository::new(pool.clone());
        let orders = DieselOrderRepository::new(pool);
        let clay = add_product(&products, "Clay Set", "29.99", 25);
        let user = Uuid::new_v4();

        orders.place(new_order(user, &[(clay, 1)])).unwrap();
        products
            .update(
                clay,
                ProductChanges {
                    price: Some(BigDecimal::from_str("49.99").unwrap()),
                    ..Default::default()
                },
            )
            .unwrap();
        let mine = orders.list_for_user(user).unwrap();
        assert_eq!(mine[0].lines[0].price, BigDecimal::from_str("29.99").unwrap());
        assert_eq!(mine[0].lines[0].product.name, "Clay Set");

        products.delete(clay).unwrap();
        let mine = orders.list_for_user(user).unwrap();
        assert_eq!(mine[0].lines[0].product.id, None);
        assert_eq!(mine[0].lines[0].product.name, "Product No Longer Available");
        assert_eq!(mine[0].total_amount, BigDecimal::from_str("29.99").unwrap());
    }

    #[tokio::test]
    async fn list_for_user_is_scoped_and_list_all_names_customers() {
        let (_container, pool) = setup_db().await;
        let products = DieselProductRepository::new(pool.clone());
        let orders = DieselOrderRepository::new(pool);
        let mat = add_product(&products, "Cutting Mat", "17.99", 28);
        let alice = Uuid::new_v4();

        orders.place(new_order(alice, &[(mat, 1)])).unwrap();
        orders.place(new_order(Uuid::new_v4(), &[(mat, 1)])).unwrap();

        let mine = orders.list_for_user(alice).unwrap();
        assert_eq!(mine.len(), 1);
        assert!(mine[0].customer.is_none());

        let all = orders.list_all().unwrap();
        assert_eq!(all.len(), 2);
        // Neither buyer exists in `users`, so both get the placeholder.
        assert!(all
            .iter()
            .all(|o| o.customer.as_ref().map(|c| c.name.as_str()) == Some("Unknown User")));
    }

    #[tokio::test]
    async fn update_status_and_sales_stats() {
        let (_container, pool) = setup_db().await;
        let products = DieselProductRepository::new(pool.clone());
        let orders = DieselOrderRepository::new(pool);
        let liners = add_product(&products, "Fine Liners", "12.99", 55);

        let stats = orders.sales_stats().unwrap();
        assert_eq!(stats.total_orders, 0);

        let order = orders.place(new_order(Uuid::new_v4(), &[(liners, 2)])).unwrap();
        let updated = orders
            .update_status(order.id, OrderStatus::Delivered)
            .unwrap()
            .expect("order should exist");
        assert_eq!(updated.status, OrderStatus::Delivered);
        assert!(orders
            .update_status(Uuid::new_v4(), OrderStatus::Shipped)
            .unwrap()
            .is_none());

        let stats = orders.sales_stats().unwrap();
        assert_eq!(stats.total_orders, 1);
        assert_eq!(stats.revenue, BigDecimal::from_str("25.98").unwrap());
    }
}
