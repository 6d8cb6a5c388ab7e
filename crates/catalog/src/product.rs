use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use souk_core::{BrandId, DomainError, DomainResult, Entity, Price, ProductId};

/// Fields supplied when a brand owner lists a new product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Price,
    /// Ordered image references; the first one is the cover.
    pub images: Vec<String>,
}

/// Partial product update. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Price>,
    pub images: Option<Vec<String>>,
}

/// A product listed under a brand.
///
/// Public visibility depends on the owning brand's status and is decided at read
/// time; the product record itself carries no publication flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Product {
    id: ProductId,
    brand_id: BrandId,
    name: String,
    description: Option<String>,
    price: Price,
    images: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn validate_name(name: &str) -> DomainResult<()> {
    if name.trim().is_empty() {
        return Err(DomainError::validation("product name cannot be empty"));
    }
    Ok(())
}

fn validate_images(images: &[String]) -> DomainResult<()> {
    if images.is_empty() {
        return Err(DomainError::validation("a product needs at least one image"));
    }
    if images.iter().any(|i| i.trim().is_empty()) {
        return Err(DomainError::validation("image references cannot be blank"));
    }
    Ok(())
}

impl Product {
    pub fn create(
        id: ProductId,
        brand_id: BrandId,
        input: NewProduct,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        validate_name(&input.name)?;
        validate_images(&input.images)?;

        Ok(Self {
            id,
            brand_id,
            name: input.name.trim().to_string(),
            description: input.description,
            price: input.price,
            images: input.images,
            created_at: now,
            updated_at: now,
        })
    }

    /// Rehydrate a product from storage. No validation is performed.
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        id: ProductId,
        brand_id: BrandId,
        name: String,
        description: Option<String>,
        price: Price,
        images: Vec<String>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            brand_id,
            name,
            description,
            price,
            images,
            created_at,
            updated_at,
        }
    }

    pub fn id_typed(&self) -> ProductId {
        self.id
    }

    pub fn brand_id(&self) -> BrandId {
        self.brand_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn price(&self) -> Price {
        self.price
    }

    pub fn images(&self) -> &[String] {
        &self.images
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Apply an update, validating the result. On error nothing changes.
    pub fn apply_update(&mut self, update: ProductUpdate, now: DateTime<Utc>) -> DomainResult<()> {
        if let Some(name) = &update.name {
            validate_name(name)?;
        }
        if let Some(images) = &update.images {
            validate_images(images)?;
        }

        if let Some(name) = update.name {
            self.name = name.trim().to_string();
        }
        if let Some(description) = update.description {
            self.description = Some(description);
        }
        if let Some(price) = update.price {
            self.price = price;
        }
        if let Some(images) = update.images {
            self.images = images;
        }
        self.updated_at = now;
        Ok(())
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_time() -> DateTime<Utc> {
        Utc::now()
    }

    fn linen_shirt() -> NewProduct {
        NewProduct {
            name: "Linen shirt".to_string(),
            description: None,
            price: Price::from_minor_units(89_000),
            images: vec!["img/shirt-front.jpg".to_string(), "img/shirt-back.jpg".to_string()],
        }
    }

    #[test]
    fn create_keeps_image_order() {
        let p = Product::create(ProductId::new(), BrandId::new(), linen_shirt(), test_time()).unwrap();
        assert_eq!(p.images()[0], "img/shirt-front.jpg");
        assert_eq!(p.images().len(), 2);
    }

    #[test]
    fn create_requires_at_least_one_image() {
        let mut input = linen_shirt();
        input.images.clear();
        let err = Product::create(ProductId::new(), BrandId::new(), input, test_time()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn create_rejects_blank_name() {
        let mut input = linen_shirt();
        input.name = "  ".to_string();
        assert!(Product::create(ProductId::new(), BrandId::new(), input, test_time()).is_err());
    }

    #[test]
    fn update_cannot_empty_the_gallery() {
        let mut p = Product::create(ProductId::new(), BrandId::new(), linen_shirt(), test_time()).unwrap();
        let before = p.clone();
        let err = p
            .apply_update(
                ProductUpdate {
                    price: Some(Price::from_minor_units(1)),
                    images: Some(vec![]),
                    ..Default::default()
                },
                test_time(),
            )
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(p, before);
    }

    #[test]
    fn update_changes_only_given_fields() {
        let mut p = Product::create(ProductId::new(), BrandId::new(), linen_shirt(), test_time()).unwrap();
        p.apply_update(
            ProductUpdate {
                price: Some(Price::from_minor_units(79_000)),
                ..Default::default()
            },
            test_time(),
        )
        .unwrap();
        assert_eq!(p.price().minor_units(), 79_000);
        assert_eq!(p.name(), "Linen shirt");
    }
}
