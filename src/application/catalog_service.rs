use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::ports::ProductRepository;
use crate::domain::product::{
    InventoryStats, Product, ProductChanges, ProductDraft, LOW_STOCK_THRESHOLD,
};

pub struct CatalogService<R> {
    repo: R,
}

impl<R: ProductRepository> CatalogService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn list_products(&self, category: Option<&str>) -> Result<Vec<Product>, DomainError> {
        let category = category.map(str::trim).filter(|c| !c.is_empty());
        self.repo.list(category)
    }

    pub fn get_product(&self, id: Uuid) -> Result<Product, DomainError> {
        self.repo
            .find_by_id(id)?
            .ok_or_else(|| DomainError::NotFound("Product not found".into()))
    }

    pub fn create_product(&self, draft: ProductDraft) -> Result<Product, DomainError> {
        draft.validate()?;
        let product = self.repo.create(draft)?;
        log::info!("Created product {} ({})", product.id, product.name);
        Ok(product)
    }

    pub fn update_product(&self, id: Uuid, changes: ProductChanges) -> Result<Product, DomainError> {
        changes.validate()?;
        self.repo
            .update(id, changes)?
            .ok_or_else(|| DomainError::NotFound("Product not found".into()))
    }

    pub fn delete_product(&self, id: Uuid) -> Result<(), DomainError> {
        if !self.repo.delete(id)? {
            return Err(DomainError::NotFound("Product not found".into()));
        }
        log::info!("Deleted product {}", id);
        Ok(())
    }

    pub fn inventory_stats(&self) -> Result<InventoryStats, DomainError> {
        self.repo.inventory_stats(LOW_STOCK_THRESHOLD)
    }
}
