// Rank of a known-correct answer in a ranking.

use crate::model::Candidate;

/// 0-based rank of `correct` among `candidates`, or `None` if it is absent.
///
/// Candidates sharing the correct one's cost are indistinguishable from it,
/// so the rank is the last position holding that cost.
pub fn rank_of(candidates: &[Candidate], correct: &str) -> Option<usize> {
    let found = candidates.iter().position(|c| c.text == correct)?;
    let cost = candidates[found].cost;
    let tied = candidates[found..]
        .iter()
        .take_while(|c| c.cost == cost)
        .count();
    Some(found + tied - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranking(entries: &[(&str, f64)]) -> Vec<Candidate> {
        entries
            .iter()
            .map(|&(text, cost)| Candidate {
                text: text.to_string(),
                cost,
            })
            .collect()
    }

    #[test]
    fn unique_cost_keeps_position() {
        let r = ranking(&[("a", 0.0), ("b", 1.0), ("c", 2.0)]);
        assert_eq!(rank_of(&r, "a"), Some(0));
        assert_eq!(rank_of(&r, "b"), Some(1));
    }

    #[test]
    fn ties_resolve_to_last_tied_position() {
        let r = ranking(&[("x", 0.0), ("a", 1.0), ("b", 1.0), ("c", 1.0), ("d", 2.0)]);
        assert_eq!(rank_of(&r, "a"), Some(3));
        assert_eq!(rank_of(&r, "c"), Some(3));
        assert_eq!(rank_of(&r, "d"), Some(4));
    }

    #[test]
    fn absent_answer_has_no_rank() {
        let r = ranking(&[("a", 0.0)]);
        assert_eq!(rank_of(&r, "z"), None);
        assert_eq!(rank_of(&[], "z"), None);
    }
}
