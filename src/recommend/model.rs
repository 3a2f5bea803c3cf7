use std::{collections::HashMap, path::Path};

use anyhow::Context;
use serde::Deserialize;
use tracing::info;

use crate::auth::repo_types::UserId;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PredictionError {
    #[error("unknown user {0}")]
    UnknownUser(UserId),
    #[error("unknown item {0}")]
    UnknownItem(String),
    #[error("non-finite estimate")]
    NonFinite,
}

/// Estimates how a user would rate a product.
pub trait RatingModel: Send + Sync {
    fn predict(&self, user_id: UserId, product_id: &str) -> Result<f64, PredictionError>;
}

#[derive(Debug, Clone, Deserialize)]
pub struct Latent {
    pub bias: f64,
    pub factors: Vec<f64>,
}

/// Biased matrix factorisation: `mu + b_u + b_i + q_i . p_u`, clipped to the
/// rating scale.
#[derive(Debug, Clone, Deserialize)]
pub struct SvdModel {
    pub global_mean: f64,
    pub rating_scale: (f64, f64),
    pub n_factors: usize,
    pub users: HashMap<UserId, Latent>,
    pub items: HashMap<String, Latent>,
}

impl SvdModel {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read model {}", path.display()))?;
        let model: Self = serde_json::from_str(&raw)
            .with_context(|| format!("parse model {}", path.display()))?;
        model.validate()?;
        info!(
            users = model.users.len(),
            items = model.items.len(),
            n_factors = model.n_factors,
            "model loaded"
        );
        Ok(model)
    }

    fn validate(&self) -> anyhow::Result<()> {
        let (lo, hi) = self.rating_scale;
        anyhow::ensure!(lo <= hi, "rating scale [{lo}, {hi}] is inverted");
        if let Some((id, _)) = self
            .users
            .iter()
            .find(|(_, l)| l.factors.len() != self.n_factors)
        {
            anyhow::bail!("user {id} has wrong factor count, expected {}", self.n_factors);
        }
        if let Some((id, _)) = self
            .items
            .iter()
            .find(|(_, l)| l.factors.len() != self.n_factors)
        {
            anyhow::bail!("item {id} has wrong factor count, expected {}", self.n_factors);
        }
        Ok(())
    }
}

impl RatingModel for SvdModel {
    fn predict(&self, user_id: UserId, product_id: &str) -> Result<f64, PredictionError> {
        let user = self
            .users
            .get(&user_id)
            .ok_or(PredictionError::UnknownUser(user_id))?;
        let item = self
            .items
            .get(product_id)
            .ok_or_else(|| PredictionError::UnknownItem(product_id.to_string()))?;

        let dot: f64 = item
            .factors
            .iter()
            .zip(&user.factors)
            .map(|(q, p)| q * p)
            .sum();
        let est = self.global_mean + user.bias + item.bias + dot;
        if !est.is_finite() {
            return Err(PredictionError::NonFinite);
        }
        let (lo, hi) = self.rating_scale;
        Ok(est.clamp(lo, hi))
    }
}
