//! Candidate implementations and best-candidate selection.

use serde::{Deserialize, Serialize};

/// One generated solution attempt.
///
/// # Invariants
/// - `quality` and `confidence` are finite and within `[0.0, 1.0]`
///   (enforced in the constructor)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Backend that produced the code
    pub source: String,
    pub code: String,
    pub quality: f64,
    pub confidence: f64,
}

impl Candidate {
    pub fn new(source: impl Into<String>, code: impl Into<String>, quality: f64, confidence: f64) -> Self {
        Self {
            source: source.into(),
            code: code.into(),
            quality: unit_interval(quality),
            confidence: unit_interval(confidence),
        }
    }

    /// Selection score: `quality × confidence`.
    pub fn score(&self) -> f64 {
        self.quality * self.confidence
    }
}

fn unit_interval(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// The selected candidate together with its score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    #[serde(flatten)]
    pub candidate: Candidate,
    pub score: f64,
}

/// Pick the candidate with the highest `quality × confidence`.
///
/// Equivalent to a stable descending sort followed by taking the head:
/// among equal scores the earliest candidate wins. Returns `None` for an
/// empty slice.
pub fn select_best(candidates: &[Candidate]) -> Option<ScoredCandidate> {
    let mut best: Option<(f64, &Candidate)> = None;
    for candidate in candidates {
        let score = candidate.score();
        match best {
            Some((best_score, _)) if score <= best_score => {}
            _ => best = Some((score, candidate)),
        }
    }
    best.map(|(score, candidate)| ScoredCandidate {
        candidate: candidate.clone(),
        score,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_priors_into_unit_interval() {
        let c = Candidate::new("x", "local a", 1.7, -0.2);
        assert_eq!(c.quality, 1.0);
        assert_eq!(c.confidence, 0.0);

        let nan = Candidate::new("x", "local a", f64::NAN, 0.5);
        assert_eq!(nan.quality, 0.0);
    }

    #[test]
    fn selects_highest_product() {
        let candidates = vec![
            Candidate::new("autocoder", "a", 0.9, 0.5),  // 0.45
            Candidate::new("huggingface", "b", 0.5, 0.6), // 0.30
            Candidate::new("llm", "c", 0.7, 0.8),        // 0.56
        ];
        let best = select_best(&candidates).unwrap();
        assert_eq!(best.candidate.source, "llm");
        assert!((best.score - 0.56).abs() < 1e-9);
    }

    #[test]
    fn ties_resolve_to_earliest_candidate() {
        let candidates = vec![
            Candidate::new("low", "a", 0.1, 0.1),
            Candidate::new("first", "b", 0.5, 0.8),
            Candidate::new("second", "c", 0.8, 0.5),
            Candidate::new("third", "d", 0.4, 1.0),
        ];
        assert_eq!(select_best(&candidates).unwrap().candidate.source, "first");
    }

    #[test]
    fn empty_input_selects_nothing() {
        assert!(select_best(&[]).is_none());
    }

    #[test]
    fn all_zero_scores_pick_the_first() {
        let candidates = vec![
            Candidate::new("a", "x", 0.0, 0.0),
            Candidate::new("b", "y", 0.0, 0.9),
        ];
        assert_eq!(select_best(&candidates).unwrap().candidate.source, "a");
    }

    #[test]
    fn scored_candidate_serializes_flat() {
        let best = select_best(&[Candidate::new("llm", "local a", 0.7, 0.8)]).unwrap();
        let value = serde_json::to_value(&best).unwrap();
        assert_eq!(value["source"], "llm");
        assert!(value.get("candidate").is_none());
        assert!(value["score"].as_f64().unwrap() > 0.55);
    }
}
