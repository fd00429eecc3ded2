use serde::{Deserialize, Serialize};

use crate::applicant::scalar::Scalar;
use crate::question::QuestionId;

/// Boolean rule over earlier answers controlling visibility or optionality.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredicateDefinition {
    pub root: PredicateExpressionNode,
}

impl PredicateDefinition {
    pub fn new(root: PredicateExpressionNode) -> Self {
        Self { root }
    }

    /// Single comparison against one question's scalar.
    pub fn leaf(
        question_id: QuestionId,
        scalar: Scalar,
        operator: Operator,
        value: PredicateValue,
    ) -> Self {
        Self::new(PredicateExpressionNode::Leaf(LeafOperation {
            question_id,
            scalar,
            operator,
            value,
        }))
    }

    /// Every question the predicate reads, in traversal order.
    pub fn question_ids(&self) -> Vec<QuestionId> {
        let mut ids = Vec::new();
        self.root.collect_question_ids(&mut ids);
        ids
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "node_type", rename_all = "snake_case")]
pub enum PredicateExpressionNode {
    Leaf(LeafOperation),
    And { children: Vec<PredicateExpressionNode> },
    Or { children: Vec<PredicateExpressionNode> },
}

impl PredicateExpressionNode {
    fn collect_question_ids(&self, ids: &mut Vec<QuestionId>) {
        match self {
            Self::Leaf(leaf) => {
                if !ids.contains(&leaf.question_id) {
                    ids.push(leaf.question_id);
                }
            }
            Self::And { children } | Self::Or { children } => {
                for child in children {
                    child.collect_question_ids(ids);
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeafOperation {
    pub question_id: QuestionId,
    pub scalar: Scalar,
    pub operator: Operator,
    pub value: PredicateValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operator {
    EqualTo,
    NotEqualTo,
    GreaterThan,
    GreaterThanOrEqualTo,
    LessThan,
    LessThanOrEqualTo,
    In,
    NotIn,
    AnyOf,
    NoneOf,
}

impl Operator {
    pub const fn label(self) -> &'static str {
        match self {
            Self::EqualTo => "equal to",
            Self::NotEqualTo => "not equal to",
            Self::GreaterThan => "greater than",
            Self::GreaterThanOrEqualTo => "greater than or equal to",
            Self::LessThan => "less than",
            Self::LessThanOrEqualTo => "less than or equal to",
            Self::In => "in",
            Self::NotIn => "not in",
            Self::AnyOf => "any of",
            Self::NoneOf => "none of",
        }
    }
}

/// Literal operand compared against the stored answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PredicateValue {
    String(String),
    Long(i64),
    ListOfStrings(Vec<String>),
    ListOfLongs(Vec<i64>),
}
