//! Seed the catalog from a YAML file.
//!
//! # File Format
//!
//! ```yaml
//! products:
//!   - name: Hanwoo 1++ sirloin 300g
//!     description: Dry-aged 21 days
//!     price: 89000
//!     imageUrl: https://cdn.gogi.kr/sirloin.jpg
//!   - name: Pork belly 500g
//!     price: 15900
//! ```
//!
//! Seeded products have no owner, so only administrators can edit them.

use std::path::Path;

use serde::Deserialize;
use tracing::{error, info};

use gogi_storefront::db::ProductRepository;
use gogi_storefront::models::product::NewProduct;

/// Top-level structure of the seed file.
#[derive(Debug, Deserialize)]
pub struct ProductSeed {
    pub products: Vec<NewProduct>,
}

/// Check every entry, returning one message per problem.
#[must_use]
pub fn validate(seed: &ProductSeed) -> Vec<String> {
    let mut errors = Vec::new();
    for (index, product) in seed.products.iter().enumerate() {
        if product.name.trim().is_empty() {
            errors.push(format!("product #{}: name is required", index + 1));
        }
        if !product.price.is_positive() {
            errors.push(format!(
                "product #{} ({}): price must be greater than zero",
                index + 1,
                product.name
            ));
        }
    }
    errors
}

/// Insert the products listed in `file_path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, any entry is
/// invalid, or the database is unreachable.
pub async fn products(file_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    info!(path = %file_path, "Loading products from file");

    // Validate before connecting to the database
    let content = tokio::fs::read_to_string(path).await?;
    let seed: ProductSeed = serde_yaml::from_str(&content)?;

    let errors = validate(&seed);
    if !errors.is_empty() {
        error!("Seed file validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(format!("{} validation errors found", errors.len()).into());
    }

    let pool = super::connect().await?;
    let repo = ProductRepository::new(&pool);

    for product in &seed.products {
        let created = repo.create(None, product).await?;
        info!(product_id = %created.id, name = %created.name, "Product seeded");
    }

    info!(count = seed.products.len(), "Seeding complete");
    Ok(())
}
