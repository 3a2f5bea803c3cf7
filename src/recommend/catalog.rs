use std::{collections::HashMap, path::Path};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Product row of the catalog artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub product_id: String,
    pub product_name: String,
    #[serde(alias = "img_link")]
    pub image: String,
    pub discounted_price: f64,
}

/// Read-only product catalog, deduplicated by product id (first row wins).
#[derive(Debug, Default)]
pub struct Catalog {
    products: Vec<Product>,
    index: HashMap<String, usize>,
}

impl Catalog {
    pub fn new(rows: Vec<Product>) -> Self {
        let mut products = Vec::with_capacity(rows.len());
        let mut index = HashMap::with_capacity(rows.len());
        for row in rows {
            if index.contains_key(&row.product_id) {
                continue;
            }
            index.insert(row.product_id.clone(), products.len());
            products.push(row);
        }
        Self { products, index }
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read catalog {}", path.display()))?;
        let rows: Vec<Product> = serde_json::from_str(&raw)
            .with_context(|| format!("parse catalog {}", path.display()))?;
        let total = rows.len();
        let catalog = Self::new(rows);
        if catalog.is_empty() {
            warn!(path = %path.display(), "catalog is empty");
        }
        info!(
            products = catalog.len(),
            duplicates = total - catalog.len(),
            "catalog loaded"
        );
        Ok(catalog)
    }

    /// Distinct products in artifact order.
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn get(&self, product_id: &str) -> Option<&Product> {
        self.index.get(product_id).and_then(|&i| self.products.get(i))
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}
