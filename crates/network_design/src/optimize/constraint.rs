//! Linear constraints carrying a tag naming the rule that produced them

use good_lp::{Expression, Variable, constraint};
use serde::Serialize;
use std::fmt::{Display, Formatter};
use strum_macros::Display as StrumDisplay;

/// Rule family a constraint belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, StrumDisplay, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    /// x[w,r] <= y[w]
    Linkage,
    /// sum_w x[w,r] = 1
    Coverage,
    /// y[w] = 1
    ForcedOpen,
    /// sum_w y[w] = n
    CountBound,
}

/// Kind plus the ids the constraint is about, e.g. `coverage[R1]`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ConstraintTag {
    pub kind: ConstraintKind,
    pub subject: String,
}

impl ConstraintTag {
    pub fn new(kind: ConstraintKind, subject: impl Into<String>) -> Self {
        Self {
            kind,
            subject: subject.into(),
        }
    }
}

impl Display for ConstraintTag {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}[{}]", self.kind, self.subject)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintSense {
    Equal,
    LessOrEqual,
}

/// `Σ coef·var (= | <=) rhs`
#[derive(Debug, Clone)]
pub struct LinearConstraint {
    pub tag: ConstraintTag,
    pub terms: Vec<(Variable, f64)>,
    pub sense: ConstraintSense,
    pub rhs: f64,
}

impl LinearConstraint {
    pub fn equal(tag: ConstraintTag, terms: Vec<(Variable, f64)>, rhs: f64) -> Self {
        Self {
            tag,
            terms,
            sense: ConstraintSense::Equal,
            rhs,
        }
    }

    pub fn less_or_equal(tag: ConstraintTag, terms: Vec<(Variable, f64)>, rhs: f64) -> Self {
        Self {
            tag,
            terms,
            sense: ConstraintSense::LessOrEqual,
            rhs,
        }
    }

    /// A constraint without terms reads `0 (= | <=) rhs`; true if that is false
    pub fn is_trivially_violated(&self) -> bool {
        if !self.terms.is_empty() {
            return false;
        }
        match self.sense {
            ConstraintSense::Equal => self.rhs.abs() > f64::EPSILON,
            ConstraintSense::LessOrEqual => self.rhs < 0.0,
        }
    }

    pub fn to_good_lp(&self) -> good_lp::Constraint {
        let lhs: Expression = self.terms.iter().map(|&(var, coef)| coef * var).sum();
        match self.sense {
            ConstraintSense::Equal => constraint::eq(lhs, self.rhs),
            ConstraintSense::LessOrEqual => constraint::leq(lhs, self.rhs),
        }
    }
}

impl Display for LinearConstraint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let op = match self.sense {
            ConstraintSense::Equal => "=",
            ConstraintSense::LessOrEqual => "<=",
        };
        write!(f, "{}: {} terms {} {}", self.tag, self.terms.len(), op, self.rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use good_lp::{ProblemVariables, variable};

    #[test]
    fn test_tag_display() {
        let tag = ConstraintTag::new(ConstraintKind::Coverage, "R1");
        assert_eq!(tag.to_string(), "coverage[R1]");
        let tag = ConstraintTag::new(ConstraintKind::CountBound, "3");
        assert_eq!(tag.to_string(), "count_bound[3]");
    }

    #[test]
    fn test_empty_constraint_violation() {
        let tag = ConstraintTag::new(ConstraintKind::Coverage, "R9");
        assert!(LinearConstraint::equal(tag.clone(), vec![], 1.0).is_trivially_violated());
        assert!(!LinearConstraint::equal(tag.clone(), vec![], 0.0).is_trivially_violated());
        assert!(!LinearConstraint::less_or_equal(tag.clone(), vec![], 0.0).is_trivially_violated());
        assert!(LinearConstraint::less_or_equal(tag, vec![], -1.0).is_trivially_violated());
    }

    #[test]
    fn test_constraint_display() {
        let mut vars = ProblemVariables::new();
        let x = vars.add(variable().binary());
        let y = vars.add(variable().binary());
        let c = LinearConstraint::less_or_equal(
            ConstraintTag::new(ConstraintKind::Linkage, "W1,R1"),
            vec![(x, 1.0), (y, -1.0)],
            0.0,
        );
        assert_eq!(c.to_string(), "linkage[W1,R1]: 2 terms <= 0");
        assert!(!c.is_trivially_violated());

        let empty = LinearConstraint::equal(ConstraintTag::new(ConstraintKind::Coverage, "R2"), vec![], 1.0);
        assert_eq!(empty.to_string(), "coverage[R2]: 0 terms = 1");
    }
}
