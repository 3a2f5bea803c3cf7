use std::{cmp::Ordering, sync::Arc};

use tracing::{debug, info};

use super::{catalog::Catalog, dto::RecommendationItem, model::RatingModel};
use crate::auth::repo_types::UserId;

/// Rating used whenever the model cannot score a (user, product) pair.
pub const FALLBACK_SCORE: f64 = 3.5;
pub const TOP_N: usize = 5;

#[derive(Clone)]
pub struct Recommender {
    catalog: Arc<Catalog>,
    model: Arc<dyn RatingModel>,
}

impl Recommender {
    pub fn new(catalog: Arc<Catalog>, model: Arc<dyn RatingModel>) -> Self {
        Self { catalog, model }
    }

    /// Scores every catalog product for `user_id` and returns the best
    /// [`TOP_N`], highest rating first. Equal scores order by ascending
    /// product id.
    pub fn recommend(&self, user_id: UserId) -> Vec<RecommendationItem> {
        let mut fallbacks = 0usize;
        let mut scored: Vec<(&str, f64)> = self
            .catalog
            .products()
            .iter()
            .map(|p| {
                let score = match self.model.predict(user_id, &p.product_id) {
                    Ok(s) => s,
                    Err(e) => {
                        debug!(user_id, product_id = %p.product_id, error = %e, "prediction failed, using fallback");
                        fallbacks += 1;
                        FALLBACK_SCORE
                    }
                };
                (p.product_id.as_str(), score)
            })
            .collect();

        scored.sort_by(|a, b| by_score_desc(a, b));
        scored.truncate(TOP_N);

        let items: Vec<RecommendationItem> = scored
            .into_iter()
            .filter_map(|(id, score)| {
                self.catalog.get(id).map(|p| RecommendationItem {
                    product_name: p.product_name.clone(),
                    image: p.image.clone(),
                    price: p.discounted_price,
                    rating: round2(score),
                })
            })
            .collect();

        info!(
            user_id,
            scored = self.catalog.len(),
            fallbacks,
            returned = items.len(),
            "recommendations computed"
        );
        items
    }
}

fn by_score_desc(a: &(&str, f64), b: &(&str, f64)) -> Ordering {
    b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0))
}

/// Two-decimal rounding with ties to even, judged on the exact binary value
/// of `x` (4.125 -> 4.12, 2.675 -> 2.67).
fn round2(x: f64) -> f64 {
    let scaled = x * 100.0;
    // Exact residue of the multiplication: x * 100 == scaled + err.
    let err = x.mul_add(100.0, -scaled);
    let rounded = if (scaled - scaled.trunc()).abs() == 0.5 && err != 0.0 {
        if err > 0.0 {
            scaled.ceil()
        } else {
            scaled.floor()
        }
    } else {
        scaled.round_ties_even()
    };
    rounded / 100.0
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::collections::HashMap;

    use super::*;
    use crate::recommend::{catalog::Product, model::PredictionError};

    pub fn product(id: &str) -> Product {
        Product {
            product_id: id.into(),
            product_name: format!("Product {id}"),
            image: format!("https://img.example/{id}.jpg"),
            discounted_price: 199.0,
        }
    }

    /// Fixed scores per product id; anything else fails.
    pub struct TableModel(pub HashMap<String, f64>);

    impl TableModel {
        pub fn new(scores: &[(&str, f64)]) -> Self {
            Self(scores.iter().map(|(k, v)| (k.to_string(), *v)).collect())
        }
    }

    impl RatingModel for TableModel {
        fn predict(&self, _user_id: UserId, product_id: &str) -> Result<f64, PredictionError> {
            self.0
                .get(product_id)
                .copied()
                .ok_or_else(|| PredictionError::UnknownItem(product_id.to_string()))
        }
    }

    pub struct FailingModel;

    impl RatingModel for FailingModel {
        fn predict(&self, user_id: UserId, _product_id: &str) -> Result<f64, PredictionError> {
            Err(PredictionError::UnknownUser(user_id))
        }
    }

    pub fn recommender(ids: &[&str], model: impl RatingModel + 'static) -> Recommender {
        let catalog = Catalog::new(ids.iter().map(|id| product(id)).collect());
        Recommender::new(Arc::new(catalog), Arc::new(model))
    }
}
