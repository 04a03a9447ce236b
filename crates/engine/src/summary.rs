use std::collections::HashMap;

use crate::model::ConsolidationSummary;

/// Per-bad-response outcome produced by the join.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowOutcome {
    /// Output rows emitted for this bad response (1 when unmatched).
    pub emitted: usize,
    /// At least one emitted row has a value in the primary added column.
    pub has_primary: bool,
}

/// Compute summary statistics from join outcomes.
pub fn compute_summary(outcomes: &[RowOutcome], key_counts: &HashMap<String, usize>) -> ConsolidationSummary {
    let total = outcomes.len();
    let matched = outcomes.iter().filter(|o| o.has_primary).count();
    let output_rows = outcomes.iter().map(|o| o.emitted).sum();
    let duplicate_keys = key_counts.values().filter(|&&n| n > 1).count();

    ConsolidationSummary {
        total,
        matched,
        unmatched: total - matched,
        output_rows,
        duplicate_keys,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(emitted: usize, has_primary: bool) -> RowOutcome {
        RowOutcome { emitted, has_primary }
    }

    #[test]
    fn summary_counts() {
        let outcomes = vec![
            outcome(1, true),
            outcome(3, true),
            outcome(1, false),
            outcome(2, false),
        ];
        let keys = HashMap::from([("a".to_string(), 1), ("b".to_string(), 3), ("c".to_string(), 2)]);
        let summary = compute_summary(&outcomes, &keys);
        assert_eq!(summary.total, 4);
        assert_eq!(summary.matched, 2);
        assert_eq!(summary.unmatched, 2);
        assert_eq!(summary.output_rows, 7);
        assert_eq!(summary.duplicate_keys, 2);
    }

    #[test]
    fn empty_input() {
        let summary = compute_summary(&[], &HashMap::new());
        assert_eq!(summary, ConsolidationSummary::default());
    }
}
