use chrono::Utc;
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::ports::ProductRepository;
use crate::domain::product::{InventoryStats, Product, ProductChanges, ProductDraft};
use crate::schema::products;

use super::models::{NewProductRow, ProductChangeset, ProductRow};

pub struct DieselProductRepository {
    pool: DbPool,
}

impl DieselProductRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl ProductRepository for DieselProductRepository {
    fn list(&self, category: Option<&str>) -> Result<Vec<Product>, DomainError> {
        let mut conn = self.pool.get()?;

        let mut query = products::table
            .select(ProductRow::as_select())
            .order(products::created_at.desc())
            .into_boxed();
        if let Some(category) = category {
            query = query.filter(products::category.eq(category));
        }

        Ok(query
            .load::<ProductRow>(&mut conn)?
            .into_iter()
            .map(Product::from)
            .collect())
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<Product>, DomainError> {
        let mut conn = self.pool.get()?;

        let row = products::table
            .find(id)
            .select(ProductRow::as_select())
            .first::<ProductRow>(&mut conn)
            .optional()?;
        Ok(row.map(Product::from))
    }

    fn create(&self, draft: ProductDraft) -> Result<Product, DomainError> {
        let mut conn = self.pool.get()?;

        let row = diesel::insert_into(products::table)
            .values(&NewProductRow {
                id: Uuid::new_v4(),
                name: draft.name,
                description: draft.description,
                price: draft.price,
                category: draft.category,
                image_url: draft.image_url,
                stock: draft.stock,
            })
            .returning(ProductRow::as_returning())
            .get_result::<ProductRow>(&mut conn)?;
        Ok(row.into())
    }

    fn update(&self, id: Uuid, changes: ProductChanges) -> Result<Option<Product>, DomainError> {
        let mut conn = self.pool.get()?;

        let row = diesel::update(products::table.find(id))
            .set(&ProductChangeset {
                name: changes.name,
                description: changes.description,
                price: changes.price,
                category: changes.category,
                image_url: changes.image_url,
                stock: changes.stock,
                updated_at: Utc::now(),
            })
            .returning(ProductRow::as_returning())
            .get_result::<ProductRow>(&mut conn)
            .optional()?;
        Ok(row.map(Product::from))
    }

    fn delete(&self, id: Uuid) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;

        let deleted = diesel::delete(products::table.find(id)).execute(&mut conn)?;
        Ok(deleted > 0)
    }

    fn inventory_stats(&self, low_stock_threshold: i32) -> Result<InventoryStats, DomainError> {
        let mut conn = self.pool.get()?;

        let total_products: i64 = products::table.count().get_result(&mut conn)?;
        let low_stock: i64 = products::table
            .filter(products::stock.lt(low_stock_threshold))
            .count()
            .get_result(&mut conn)?;

        Ok(InventoryStats {
            total_products,
            low_stock,
        })
    }
}
