//! Seed the product catalog from a YAML file.
//!
//! The whole file is parsed and validated before the backend is contacted.
//! Products whose name already exists are skipped, so the command can be
//! re-run after adding entries.
//!
//! ```yaml
//! products:
//!   - name: Super Kernel Basmati
//!     description: Aged extra long grain basmati.
//!     category: Basmati
//!     base_price: "380"
//!     stock_quantity: 500
//!     is_active: true   # optional, default true
//! ```

use std::collections::HashSet;
use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{error, info};
use yousuf_rice_backend::{Backend, BackendConfig, ProductRepository};
use yousuf_rice_core::models::NewProduct;
use yousuf_rice_core::pricing::BasePrice;

#[derive(Debug, Deserialize)]
pub struct SeedCatalog {
    pub products: Vec<SeedProduct>,
}

#[derive(Debug, Deserialize)]
pub struct SeedProduct {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category: String,
    pub base_price: Decimal,
    #[serde(default)]
    pub stock_quantity: u32,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

const fn default_active() -> bool {
    true
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedResult {
    pub inserted: usize,
    pub skipped: usize,
    pub errors: Vec<(String, String)>,
}

/// Turn every entry into a [`NewProduct`], or list what is wrong.
pub fn validate(catalog: &SeedCatalog) -> Result<Vec<NewProduct>, Vec<String>> {
    let mut errors = Vec::new();
    let mut names = HashSet::new();
    let mut products = Vec::with_capacity(catalog.products.len());

    for (index, entry) in catalog.products.iter().enumerate() {
        let label = format!("#{} ({})", index + 1, entry.name.trim());
        let name = entry.name.trim();
        if name.is_empty() {
            errors.push(format!("{label}: name is required"));
        } else if !names.insert(name.to_lowercase()) {
            errors.push(format!("{label}: duplicate name"));
        }
        if entry.category.trim().is_empty() {
            errors.push(format!("{label}: category is required"));
        }
        match BasePrice::new(entry.base_price) {
            Ok(price) => products.push(NewProduct {
                name: name.to_owned(),
                description: entry.description.trim().to_owned(),
                category: entry.category.trim().to_owned(),
                image_file_id: None,
                image_url: None,
                base_price: price.price(),
                stock_quantity: entry.stock_quantity,
                is_active: entry.is_active,
            }),
            Err(e) => errors.push(format!("{label}: {e}")),
        }
    }

    if errors.is_empty() {
        Ok(products)
    } else {
        Err(errors)
    }
}

/// Create the products that do not exist yet.
///
/// # Errors
///
/// Returns an error if the existing products cannot be listed. Individual
/// create failures are collected in [`SeedResult::errors`].
pub async fn seed(
    repo: &ProductRepository,
    products: &[NewProduct],
) -> Result<SeedResult, yousuf_rice_backend::BackendError> {
    let existing: HashSet<String> = repo
        .list_all()
        .await?
        .into_iter()
        .map(|p| p.name.to_lowercase())
        .collect();

    let mut result = SeedResult::default();
    for product in products {
        if existing.contains(&product.name.to_lowercase()) {
            result.skipped += 1;
            continue;
        }
        match repo.create(product).await {
            Ok(_) => result.inserted += 1,
            Err(e) => result.errors.push((product.name.clone(), e.to_string())),
        }
    }
    Ok(result)
}

/// Seed products from `file_path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, validation fails,
/// or the backend is unreachable.
pub async fn products(file_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    info!(path = %file_path, "Loading products from file");
    let content = tokio::fs::read_to_string(path).await?;
    let catalog: SeedCatalog = serde_yaml::from_str(&content)?;
    info!(products = catalog.products.len(), "Parsed catalog");

    let products = match validate(&catalog) {
        Ok(products) => products,
        Err(errors) => {
            error!("Catalog validation failed:");
            for err in &errors {
                error!("  - {err}");
            }
            return Err(format!("{} validation errors found", errors.len()).into());
        }
    };

    let backend = Backend::appwrite(BackendConfig::from_env()?)?;
    let result = seed(&backend.products(), &products).await?;

    info!("Seeding complete!");
    info!("  Products inserted: {}", result.inserted);
    info!("  Products skipped (already exist): {}", result.skipped);
    if !result.errors.is_empty() {
        error!("  Errors: {}", result.errors.len());
        for (name, err) in &result.errors {
            error!("    - {name}: {err}");
        }
        return Err(format!("{} products failed", result.errors.len()).into());
    }

    Ok(())
}
