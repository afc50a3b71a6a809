use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::auth::{AdminUser, AuthUser};
use super::money;
use crate::domain::order::{
    CustomerSummary, OrderDraft, OrderLineDraft, OrderLineView, OrderView, ProductSummary,
    ShippingAddress,
};
use crate::errors::AppError;
use crate::Orders;

/// Product id shown for order lines whose product has been deleted.
const REMOVED_PRODUCT_ID: &str = "removed";

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddressDto {
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub zip_code: String,
}

impl From<ShippingAddressDto> for ShippingAddress {
    fn from(dto: ShippingAddressDto) -> Self {
        Self {
            street: dto.street,
            city: dto.city,
            state: dto.state,
            zip_code: dto.zip_code,
        }
    }
}

impl From<ShippingAddress> for ShippingAddressDto {
    fn from(address: ShippingAddress) -> Self {
        Self {
            street: address.street,
            city: address.city,
            state: address.state,
            zip_code: address.zip_code,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct OrderItemRequest {
    /// Product UUID
    pub product: Option<String>,
    pub quantity: Option<i64>,
    /// Price the shopper saw. Must be positive; the stored price is the
    /// catalogue price at checkout.
    pub price: Option<f64>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderRequest {
    #[serde(default)]
    pub items: Vec<OrderItemRequest>,
    pub shipping_address: Option<ShippingAddressDto>,
    /// Informational; the stored total is computed server-side.
    pub total_amount: Option<f64>,
    pub payment_method: Option<String>,
}

impl From<PlaceOrderRequest> for OrderDraft {
    fn from(req: PlaceOrderRequest) -> Self {
        OrderDraft {
            items: req
                .items
                .into_iter()
                .map(|i| OrderLineDraft {
                    product: i.product,
                    quantity: i.quantity,
                    price: i.price,
                })
                .collect(),
            shipping_address: req.shipping_address.map(Into::into),
            total_amount: req.total_amount,
            payment_method: req.payment_method,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    /// One of `pending`, `processing`, `shipped`, `delivered`
    pub status: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderProductResponse {
    /// Product UUID, or `removed` once the product is gone
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub price: f64,
    pub image_url: String,
}

impl From<ProductSummary> for OrderProductResponse {
    fn from(p: ProductSummary) -> Self {
        Self {
            id: p
                .id
                .map(|id| id.to_string())
                .unwrap_or_else(|| REMOVED_PRODUCT_ID.to_string()),
            name: p.name,
            price: money(&p.price),
            image_url: p.image_url,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderItemResponse {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub product: OrderProductResponse,
    pub quantity: i32,
    /// Unit price charged
    pub price: f64,
}

impl From<OrderLineView> for OrderItemResponse {
    fn from(line: OrderLineView) -> Self {
        Self {
            id: line.id,
            product: line.product.into(),
            quantity: line.quantity,
            price: money(&line.price),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CustomerResponse {
    pub name: String,
    pub email: String,
}

/// The ordering user: just the id for a shopper's own orders, name and
/// email in the admin listing.
#[derive(Debug, Serialize, ToSchema)]
#[serde(untagged)]
pub enum OrderUser {
    Id(Uuid),
    Customer(CustomerResponse),
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub user: OrderUser,
    pub items: Vec<OrderItemResponse>,
    pub shipping_address: ShippingAddressDto,
    pub payment_method: String,
    pub total_amount: f64,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<OrderView> for OrderResponse {
    fn from(o: OrderView) -> Self {
        let user = match o.customer {
            Some(CustomerSummary { name, email }) => {
                OrderUser::Customer(CustomerResponse { name, email })
            }
            None => OrderUser::Id(o.user_id),
        };
        Self {
            id: o.id,
            user,
            items: o.lines.into_iter().map(Into::into).collect(),
            shipping_address: o.shipping_address.into(),
            payment_method: o.payment_method,
            total_amount: money(&o.total_amount),
            status: o.status.to_string(),
            created_at: o.created_at.to_rfc3339(),
            updated_at: o.updated_at.to_rfc3339(),
        }
    }
}

fn to_responses(orders: Vec<OrderView>) -> Vec<OrderResponse> {
    orders.into_iter().map(Into::into).collect()
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /api/orders
///
/// Reserves stock for every line and records the order in one database
/// transaction. Either all lines are reserved or nothing changes.
#[utoipa::path(
    post,
    path = "/api/orders",
    request_body = PlaceOrderRequest,
    responses(
        (status = 201, description = "Order placed", body = OrderResponse),
        (status = 400, description = "Invalid order or insufficient stock"),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "A product does not exist"),
    ),
    security(("bearer_auth" = [])),
    tag = "orders"
)]
pub async fn place_order(
    caller: AuthUser,
    orders: web::Data<Orders>,
    body: web::Json<PlaceOrderRequest>,
) -> Result<HttpResponse, AppError> {
    let draft = OrderDraft::from(body.into_inner());

    let order = web::block(move || orders.place_order(caller.id, draft))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Created().json(OrderResponse::from(order)))
}

/// GET /api/orders/my-orders
#[utoipa::path(
    get,
    path = "/api/orders/my-orders",
    responses(
        (status = 200, description = "Caller's orders, newest first", body = [OrderResponse]),
        (status = 401, description = "Missing or invalid token"),
    ),
    security(("bearer_auth" = [])),
    tag = "orders"
)]
pub async fn my_orders(
    caller: AuthUser,
    orders: web::Data<Orders>,
) -> Result<HttpResponse, AppError> {
    let result = web::block(move || orders.orders_for_user(caller.id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(to_responses(result)))
}

/// GET /api/orders
#[utoipa::path(
    get,
    path = "/api/orders",
    responses(
        (status = 200, description = "All orders with customer details", body = [OrderResponse]),
        (status = 403, description = "Caller is not an admin"),
    ),
    security(("bearer_auth" = [])),
    tag = "orders"
)]
pub async fn list_orders(
    _admin: AdminUser,
    orders: web::Data<Orders>,
) -> Result<HttpResponse, AppError> {
    let result = web::block(move || orders.all_orders())
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(to_responses(result)))
}

/// PUT /api/orders/{id}/status
#[utoipa::path(
    put,
    path = "/api/orders/{id}/status",
    params(("id" = Uuid, Path, description = "Order UUID")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = OrderResponse),
        (status = 400, description = "Unknown status"),
        (status = 403, description = "Caller is not an admin"),
        (status = 404, description = "Order not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "orders"
)]
pub async fn update_status(
    _admin: AdminUser,
    orders: web::Data<Orders>,
    path: web::Path<Uuid>,
    body: web::Json<UpdateStatusRequest>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let status = body.into_inner().status;

    let order = web::block(move || orders.update_status(id, &status))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}
