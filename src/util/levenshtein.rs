//! Weighted edit distance.

/// Cost of each edit operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditCosts {
    pub insert: usize,
    pub delete: usize,
    pub substitute: usize,
}

impl EditCosts {
    /// Unit costs for every operation.
    pub const UNIT: EditCosts = EditCosts {
        insert: 1,
        delete: 1,
        substitute: 1,
    };

    /// Insert and delete cost 1, a substitution costs as much as both.
    pub const SPELLING: EditCosts = EditCosts {
        insert: 1,
        delete: 1,
        substitute: 2,
    };
}

impl Default for EditCosts {
    fn default() -> Self {
        EditCosts::SPELLING
    }
}

/// Minimum cost of turning `source` into `target`, compared per character.
///
/// Two rows of the dynamic programming table are kept, so memory is
/// O(len(target)).
pub fn weighted_distance(source: &str, target: &str, costs: EditCosts) -> usize {
    let source: Vec<char> = source.chars().collect();
    let target: Vec<char> = target.chars().collect();

    if source.is_empty() {
        return target.len() * costs.insert;
    }
    if target.is_empty() {
        return source.len() * costs.delete;
    }

    let mut prev_row: Vec<usize> = (0..=target.len()).map(|j| j * costs.insert).collect();
    let mut curr_row = vec![0; target.len() + 1];

    for (i, s) in source.iter().enumerate() {
        curr_row[0] = (i + 1) * costs.delete;
        for (j, t) in target.iter().enumerate() {
            let substitution = if s == t { 0 } else { costs.substitute };
            curr_row[j + 1] = (prev_row[j + 1] + costs.delete)
                .min(curr_row[j] + costs.insert)
                .min(prev_row[j] + substitution);
        }
        std::mem::swap(&mut prev_row, &mut curr_row);
    }

    prev_row[target.len()]
}

/// Edit distance with substitutions costing 2.
pub fn spelling_distance(source: &str, target: &str) -> usize {
    weighted_distance(source, target, EditCosts::SPELLING)
}
