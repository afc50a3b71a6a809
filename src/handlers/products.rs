use std::path::Path;

use actix_multipart::form::tempfile::TempFile;
use actix_multipart::form::text::Text;
use actix_multipart::form::MultipartForm;
use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use serde_json::json;
use serde_with::{serde_as, DisplayFromStr, PickFirst};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::auth::AdminUser;
use super::money;
use crate::application::catalog_service::CatalogService;
use crate::domain::errors::DomainError;
use crate::domain::ports::ProductRepository;
use crate::domain::product::{parse_price, parse_stock, Product, ProductChanges, ProductDraft};
use crate::errors::AppError;
use crate::infrastructure::image_store::ImageStore;
use crate::Catalog;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub category: String,
    pub image_url: String,
    pub stock: i32,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Product> for ProductResponse {
    fn from(p: Product) -> Self {
        Self {
            id: p.id,
            name: p.name,
            description: p.description,
            price: money(&p.price),
            category: p.category,
            image_url: p.image_url,
            stock: p.stock,
            created_at: p.created_at.to_rfc3339(),
            updated_at: p.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListProductsParams {
    /// Only return products in this category.
    pub category: Option<String>,
}

#[derive(Debug, MultipartForm)]
pub struct CreateProductForm {
    pub name: Text<String>,
    pub description: Option<Text<String>>,
    pub price: Text<String>,
    pub category: Text<String>,
    pub stock: Text<String>,
    #[multipart(limit = "5MB")]
    pub image: Option<TempFile>,
}

/// Multipart body of `POST /api/products`, for the API docs only.
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct CreateProductDoc {
    name: String,
    description: Option<String>,
    /// Decimal price, e.g. "24.99"
    price: String,
    category: String,
    stock: String,
    #[schema(value_type = Option<String>, format = Binary)]
    image: Option<Vec<u8>>,
}

/// Partial update. `price` and `stock` may arrive as numbers or as strings,
/// since the admin form posts its fields as text.
#[serde_as]
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub price: Option<f64>,
    pub category: Option<String>,
    pub image_url: Option<String>,
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub stock: Option<i32>,
}

impl TryFrom<UpdateProductRequest> for ProductChanges {
    type Error = AppError;

    fn try_from(req: UpdateProductRequest) -> Result<Self, Self::Error> {
        Ok(ProductChanges {
            name: req.name,
            description: req.description,
            price: req.price.map(|p| parse_price(&p.to_string())).transpose()?,
            category: req.category,
            image_url: req.image_url,
            stock: req.stock,
        })
    }
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// GET /api/products
#[utoipa::path(
    get,
    path = "/api/products",
    params(ListProductsParams),
    responses(
        (status = 200, description = "Products, newest first", body = [ProductResponse]),
    ),
    tag = "products"
)]
pub async fn list_products(
    catalog: web::Data<Catalog>,
    query: web::Query<ListProductsParams>,
) -> Result<HttpResponse, AppError> {
    let category = query.into_inner().category;

    let products = web::block(move || catalog.list_products(category.as_deref()))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    let body: Vec<ProductResponse> = products.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(body))
}

/// GET /api/products/{id}
#[utoipa::path(
    get,
    path = "/api/products/{id}",
    params(("id" = Uuid, Path, description = "Product UUID")),
    responses(
        (status = 200, description = "Product found", body = ProductResponse),
        (status = 404, description = "Product not found"),
    ),
    tag = "products"
)]
pub async fn get_product(
    catalog: web::Data<Catalog>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();

    let product = web::block(move || catalog.get_product(id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(ProductResponse::from(product)))
}

/// POST /api/products
///
/// Multipart create. The optional `image` part is copied into the upload
/// directory and the product's `imageUrl` points at it.
#[utoipa::path(
    post,
    path = "/api/products",
    request_body(content = CreateProductDoc, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Product created", body = ProductResponse),
        (status = 400, description = "Invalid product data"),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Caller is not an admin"),
    ),
    security(("bearer_auth" = [])),
    tag = "products"
)]
pub async fn create_product(
    _admin: AdminUser,
    catalog: web::Data<Catalog>,
    images: web::Data<ImageStore>,
    MultipartForm(form): MultipartForm<CreateProductForm>,
) -> Result<HttpResponse, AppError> {
    let product = web::block(move || {
        let draft = ProductDraft {
            name: form.name.into_inner().trim().to_string(),
            description: form
                .description
                .map(Text::into_inner)
                .unwrap_or_default(),
            price: parse_price(&form.price)?,
            category: form.category.into_inner().trim().to_string(),
            image_url: String::new(),
            stock: parse_stock(&form.stock)?,
        };
        let image = form
            .image
            .as_ref()
            .map(|file| (file.file_name.as_deref(), file.file.path()));
        create_with_image(catalog.get_ref(), images.get_ref(), draft, image)
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Created().json(ProductResponse::from(product)))
}

/// Validates the draft before touching the upload directory, so a rejected
/// product never leaves an image behind.
fn create_with_image<R: ProductRepository>(
    catalog: &CatalogService<R>,
    images: &ImageStore,
    mut draft: ProductDraft,
    image: Option<(Option<&str>, &Path)>,
) -> Result<Product, DomainError> {
    draft.validate()?;
    if let Some((original_name, source)) = image {
        draft.image_url = images.save(original_name, source)?;
    }
    let image_url = draft.image_url.clone();
    catalog.create_product(draft).map_err(|e| {
        images.remove(&image_url);
        e
    })
}

/// PUT /api/products/{id}
#[utoipa::path(
    put,
    path = "/api/products/{id}",
    params(("id" = Uuid, Path, description = "Product UUID")),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Product updated", body = ProductResponse),
        (status = 400, description = "Invalid product data"),
        (status = 403, description = "Caller is not an admin"),
        (status = 404, description = "Product not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "products"
)]
pub async fn update_product(
    _admin: AdminUser,
    catalog: web::Data<Catalog>,
    path: web::Path<Uuid>,
    body: web::Json<UpdateProductRequest>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let changes = ProductChanges::try_from(body.into_inner())?;

    let product = web::block(move || catalog.update_product(id, changes))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(ProductResponse::from(product)))
}

/// DELETE /api/products/{id}
///
/// Past orders keep their lines; they show a placeholder product afterwards.
#[utoipa::path(
    delete,
    path = "/api/products/{id}",
    params(("id" = Uuid, Path, description = "Product UUID")),
    responses(
        (status = 200, description = "Product deleted"),
        (status = 403, description = "Caller is not an admin"),
        (status = 404, description = "Product not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "products"
)]
pub async fn delete_product(
    _admin: AdminUser,
    catalog: web::Data<Catalog>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();

    web::block(move || catalog.delete_product(id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(json!({ "message": "Product deleted" })))
}
