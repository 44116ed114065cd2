//! Score-based ranking for overload resolution.
//!
//! This module selects the best match from the candidates that accepted the
//! arguments.

use super::{Candidate, OverloadError};

/// Find the best match among matched candidates.
///
/// Candidates are sorted by score (stable, so declaration order breaks
/// nothing but display order). Inaccessible candidates are then dropped; if
/// another remaining candidate has the same score as the first, the call is
/// ambiguous.
///
/// # Returns
///
/// * `Ok(Candidate)` - The unique best candidate
/// * `Err(OverloadError::NoMatch)` - Nothing matched
/// * `Err(OverloadError::NoAccessible)` - Only inaccessible candidates matched
/// * `Err(OverloadError::Ambiguous)` - Two accessible candidates tie
pub fn find_best_match(mut matched: Vec<Candidate<'_>>) -> Result<Candidate<'_>, OverloadError> {
    if matched.is_empty() {
        return Err(OverloadError::NoMatch);
    }

    matched.sort_by(|a, b| a.score.total_cmp(&b.score));
    matched.retain(|c| c.accessible);

    let mut ranked = matched.into_iter();
    let best = ranked.next().ok_or(OverloadError::NoAccessible)?;
    if ranked.any(|other| other.score == best.score) {
        return Err(OverloadError::Ambiguous);
    }
    Ok(best)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flee_core::{FunctionEntry, TypeHash, primitives};

    fn candidate(f: &FunctionEntry, score: f64, accessible: bool) -> Candidate<'_> {
        let mut c = Candidate::new(f, accessible);
        c.score = score;
        c
    }

    #[test]
    fn lowest_score_wins() {
        let a = FunctionEntry::new("A", TypeHash::from_name("T"), primitives::INT32);
        let b = FunctionEntry::new("B", TypeHash::from_name("T"), primitives::INT32);
        let best = find_best_match(vec![candidate(&a, 3.0, true), candidate(&b, 1.0, true)])
            .unwrap();
        assert_eq!(best.function.name, "B");
    }

    #[test]
    fn inaccessible_better_match_is_skipped() {
        let a = FunctionEntry::new("A", TypeHash::from_name("T"), primitives::INT32);
        let b = FunctionEntry::new("B", TypeHash::from_name("T"), primitives::INT32);
        let best = find_best_match(vec![candidate(&a, 0.0, false), candidate(&b, 2.0, true)])
            .unwrap();
        assert_eq!(best.function.name, "B");
    }

    #[test]
    fn equal_scores_are_ambiguous() {
        let a = FunctionEntry::new("A", TypeHash::from_name("T"), primitives::INT32);
        let b = FunctionEntry::new("B", TypeHash::from_name("T"), primitives::INT32);
        let c = FunctionEntry::new("C", TypeHash::from_name("T"), primitives::INT32);
        let result = find_best_match(vec![
            candidate(&a, 1.0, true),
            candidate(&b, 2.0, true),
            candidate(&c, 1.0, true),
        ]);
        assert_eq!(result.unwrap_err(), OverloadError::Ambiguous);
    }

    #[test]
    fn empty_and_inaccessible() {
        assert_eq!(find_best_match(Vec::new()).unwrap_err(), OverloadError::NoMatch);
        let a = FunctionEntry::new("A", TypeHash::from_name("T"), primitives::INT32);
        assert_eq!(
            find_best_match(vec![candidate(&a, 0.0, false)]).unwrap_err(),
            OverloadError::NoAccessible
        );
    }
}
