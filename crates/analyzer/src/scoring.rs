use core_types::{RankRow, ScoringPolicy};
use std::cmp::Ordering;

/// Folds a ticker's two betas into its ranking score.
///
/// Defined only when both betas are. Sign is ignored: strong inverse
/// co-movement ranks as high as strong direct co-movement.
pub fn composite_score(
    policy: ScoringPolicy,
    beta_primary: Option<f64>,
    beta_secondary: Option<f64>,
) -> Option<f64> {
    let (a, b) = (beta_primary?.abs(), beta_secondary?.abs());
    let score = match policy {
        ScoringPolicy::MeanAbsolute => (a + b) / 2.0,
        ScoringPolicy::MaxAbsolute => a.max(b),
    };
    score.is_finite().then_some(score)
}

/// Orders scores with an absent score strictly below every present one.
pub fn compare_scores(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => Ordering::Equal,
    }
}

/// Sorts rows by descending score and assigns dense 1-based ranks.
///
/// The sort is stable, so equal scores keep their input order.
pub fn rank_rows(mut rows: Vec<RankRow>) -> Vec<RankRow> {
    rows.sort_by(|a, b| compare_scores(b.score, a.score));
    for (i, row) in rows.iter_mut().enumerate() {
        row.rank = i + 1;
    }
    rows
}
