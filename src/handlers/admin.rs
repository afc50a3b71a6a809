use actix_web::{web, HttpResponse};
use serde::Serialize;
use utoipa::ToSchema;

use super::auth::AdminUser;
use super::money;
use crate::errors::AppError;
use crate::{Catalog, Orders};

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub total_products: i64,
    /// Products with fewer than five units left
    pub low_stock_products: i64,
    pub total_orders: i64,
    /// Sum of all order totals
    pub total_revenue: f64,
}

/// GET /api/admin/stats
#[utoipa::path(
    get,
    path = "/api/admin/stats",
    responses(
        (status = 200, description = "Dashboard totals", body = StatsResponse),
        (status = 403, description = "Caller is not an admin"),
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn stats(
    _admin: AdminUser,
    catalog: web::Data<Catalog>,
    orders: web::Data<Orders>,
) -> Result<HttpResponse, AppError> {
    let (inventory, sales) = web::block(move || {
        Ok::<_, AppError>((catalog.inventory_stats()?, orders.sales_stats()?))
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(StatsResponse {
        total_products: inventory.total_products,
        low_stock_products: inventory.low_stock,
        total_orders: sales.total_orders,
        total_revenue: money(&sales.revenue),
    }))
}
