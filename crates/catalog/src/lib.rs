//! `souk-catalog` — brands and the products they list.
//!
//! Pure domain types: validation, the brand status edge table, and the public
//! visibility rule. Persistence lives in `souk-infra`.

pub mod brand;
pub mod product;

pub use brand::{
    Brand, BrandProfile, BrandProfileUpdate, BrandStatus, ParseBrandStatusError, SocialLinks,
};
pub use product::{NewProduct, Product, ProductUpdate};
