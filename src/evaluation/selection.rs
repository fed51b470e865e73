//! Aggregation of fold scores and model selection.

use std::cmp::Ordering;

use serde::Serialize;

use crate::error::{ForecastError, Result};
use crate::evaluation::rolling::ScoreRecord;
use crate::models::ModelKind;
use crate::utils::metrics::nan_mean;

/// Mean scores of one model over all folds.
///
/// NaN fold scores are skipped; a mean is NaN only when every fold score of
/// the model was NaN.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateScore {
    pub model: ModelKind,
    pub mean_smape: f64,
    pub mean_mase: f64,
    pub folds: usize,
    /// Folds in which the model fell back to repeating the last value.
    pub fallbacks: usize,
}

impl AggregateScore {
    /// Whether the model can take part in the ranking.
    pub fn is_rankable(&self) -> bool {
        self.mean_smape.is_finite()
    }
}

/// Average the records per model, in order of first appearance.
///
/// Evaluation emits records in candidate order, so this order is also the
/// tie-break of [`select`].
pub fn aggregate(records: &[ScoreRecord]) -> Vec<AggregateScore> {
    let mut models: Vec<ModelKind> = Vec::new();
    for record in records {
        if !models.contains(&record.model) {
            models.push(record.model);
        }
    }

    models
        .into_iter()
        .map(|model| {
            let own: Vec<&ScoreRecord> = records.iter().filter(|r| r.model == model).collect();
            let smapes: Vec<f64> = own.iter().map(|r| r.smape).collect();
            let mases: Vec<f64> = own.iter().map(|r| r.mase).collect();
            AggregateScore {
                model,
                mean_smape: nan_mean(&smapes),
                mean_mase: nan_mean(&mases),
                folds: own.len(),
                fallbacks: own.iter().filter(|r| r.is_fallback()).count(),
            }
        })
        .collect()
}

/// Ranking of the aggregated scores and the winning family.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Selection {
    /// Rankable models, best first.
    pub ranking: Vec<AggregateScore>,
    /// Models without a single finite sMAPE.
    pub excluded: Vec<AggregateScore>,
    pub selected: ModelKind,
}

impl Selection {
    /// Scores of the selected model.
    pub fn best(&self) -> &AggregateScore {
        &self.ranking[0]
    }
}

/// Ascending sMAPE, ties broken by ascending MASE with NaN last.
fn compare(a: &AggregateScore, b: &AggregateScore) -> Ordering {
    a.mean_smape
        .total_cmp(&b.mean_smape)
        .then_with(|| match (a.mean_mase.is_nan(), b.mean_mase.is_nan()) {
            (false, false) => a.mean_mase.total_cmp(&b.mean_mase),
            (false, true) => Ordering::Less,
            (true, false) => Ordering::Greater,
            (true, true) => Ordering::Equal,
        })
}

/// Rank `scores` and pick the first.
///
/// The sort is stable, so fully tied models keep their input order. Fails
/// when no model has a finite mean sMAPE.
pub fn select(scores: &[AggregateScore]) -> Result<Selection> {
    let (mut ranking, excluded): (Vec<_>, Vec<_>) =
        scores.iter().cloned().partition(AggregateScore::is_rankable);
    ranking.sort_by(compare);

    let selected = ranking
        .first()
        .map(|s| s.model)
        .ok_or_else(|| ForecastError::ComputationError("no model has a valid sMAPE".to_string()))?;

    Ok(Selection {
        ranking,
        excluded,
        selected,
    })
}
