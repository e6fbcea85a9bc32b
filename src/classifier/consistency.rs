/// Cross-check between two capture groups of a vendor URL.
///
/// Group numbers are regex capture indices, not positions in the
/// identifier list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsistencyRule {
    /// Both groups parse as integers and denote the same number.
    NumericEqual(usize, usize),
    /// Both groups are the same slug once separators are normalised.
    SlugEqual(usize, usize),
}

impl ConsistencyRule {
    pub fn groups(&self) -> (usize, usize) {
        match *self {
            ConsistencyRule::NumericEqual(a, b) | ConsistencyRule::SlugEqual(a, b) => (a, b),
        }
    }

    pub fn holds(&self, left: &str, right: &str) -> bool {
        match self {
            ConsistencyRule::NumericEqual(..) => {
                match (left.parse::<u64>(), right.parse::<u64>()) {
                    (Ok(l), Ok(r)) => l == r,
                    _ => false,
                }
            }
            ConsistencyRule::SlugEqual(..) => normalize_slug(left) == normalize_slug(right),
        }
    }
}

/// Maps `-` and `+` to spaces and collapses whitespace runs. Case is kept.
pub fn normalize_slug(slug: &str) -> String {
    slug.replace(['-', '+'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_rule_compares_values_not_text() {
        let rule = ConsistencyRule::NumericEqual(1, 2);
        assert!(rule.holds("29234", "29234"));
        assert!(rule.holds("029234", "29234"));
        assert!(!rule.holds("29234", "29235"));
        assert!(!rule.holds("29234", "abc"));
    }

    #[test]
    fn slug_rule_ignores_separators_but_not_case() {
        let rule = ConsistencyRule::SlugEqual(1, 3);
        assert!(rule.holds("exploded-check-dress", "exploded check dress"));
        assert!(rule.holds("exploded--check+dress", "exploded-check-dress"));
        assert!(!rule.holds("Exploded-check-dress", "exploded-check-dress"));
        assert!(!rule.holds("check-dress", "exploded-check-dress"));
    }
}
