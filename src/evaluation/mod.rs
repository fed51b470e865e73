//! Rolling-origin evaluation and model selection.

mod rolling;
mod selection;

pub use rolling::{CrossValidation, Fold, FoldGridFailure, RollingOrigin, ScoreRecord};
pub use selection::{aggregate, select, AggregateScore, Selection};
