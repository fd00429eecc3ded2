use serde::Serialize;

use super::data::{applicant_path, ApplicantData};
use super::path::Path;
use super::scalar::{Scalar, ScalarType};
use crate::program::{
    BlockDefinition, LeafOperation, Operator, PredicateDefinition, PredicateExpressionNode,
    PredicateValue, ProgramDefinition,
};
use crate::question::QuestionId;

/// Why a predicate could not be evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "anomaly", rename_all = "snake_case")]
pub enum PredicateAnomaly {
    #[error("question {question_id} is not part of the program")]
    QuestionNotFound { question_id: QuestionId },
    #[error("question {question_id} is repeated outside the evaluating block's entities")]
    OutOfContext { question_id: QuestionId },
    #[error("question {question_id} does not own scalar {scalar:?}")]
    ScalarNotOwned {
        question_id: QuestionId,
        scalar: Scalar,
    },
    #[error("operator '{}' cannot compare question {question_id} with the given value", .operator.label())]
    TypeMismatch {
        question_id: QuestionId,
        operator: Operator,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PredicateRole {
    Hide,
    Optional,
}

/// Fail-open record: the predicate was treated as false and traversal continued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PredicateWarning {
    pub block_id: String,
    pub role: PredicateRole,
    pub anomaly: PredicateAnomaly,
}

/// Evaluates predicates for one concrete block against a document snapshot.
pub(crate) struct PredicateEvaluator<'a> {
    program: &'a ProgramDefinition,
    data: &'a ApplicantData,
    block: &'a BlockDefinition,
    context: &'a Path,
}

impl<'a> PredicateEvaluator<'a> {
    pub(crate) fn new(
        program: &'a ProgramDefinition,
        data: &'a ApplicantData,
        block: &'a BlockDefinition,
        context: &'a Path,
    ) -> Self {
        Self {
            program,
            data,
            block,
            context,
        }
    }

    pub(crate) fn evaluate(&self, predicate: &PredicateDefinition) -> Result<bool, PredicateAnomaly> {
        self.node(&predicate.root)
    }

    fn node(&self, node: &PredicateExpressionNode) -> Result<bool, PredicateAnomaly> {
        match node {
            PredicateExpressionNode::Leaf(leaf) => self.leaf(leaf),
            PredicateExpressionNode::And { children } => {
                for child in children {
                    if !self.node(child)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            PredicateExpressionNode::Or { children } => {
                for child in children {
                    if self.node(child)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
        }
    }

    fn leaf(&self, leaf: &LeafOperation) -> Result<bool, PredicateAnomaly> {
        let question_id = leaf.question_id;
        let (owner, question) = self
            .program
            .question_definition(question_id)
            .ok_or(PredicateAnomaly::QuestionNotFound { question_id })?;

        let scalar_type = question
            .question
            .scalars()
            .ok()
            .and_then(|scalars| {
                scalars
                    .iter()
                    .find(|(scalar, _)| *scalar == leaf.scalar)
                    .map(|(_, scalar_type)| *scalar_type)
            })
            .ok_or(PredicateAnomaly::ScalarNotOwned {
                question_id,
                scalar: leaf.scalar,
            })?;

        if !supports(scalar_type, leaf.operator, &leaf.value) {
            return Err(PredicateAnomaly::TypeMismatch {
                question_id,
                operator: leaf.operator,
            });
        }

        let context = self.context_for(owner, question_id)?;
        let path = question
            .question
            .contextualized_path(&context)
            .join_scalar(leaf.scalar);
        let data = self.data;
        let operator = leaf.operator;

        let outcome = match &leaf.value {
            PredicateValue::String(expected) => data
                .read_string(&path)
                .map(|actual| compare(operator, &actual, expected)),
            PredicateValue::Long(expected) => data
                .read_long(&path)
                .map(|actual| compare(operator, &actual, expected)),
            PredicateValue::ListOfStrings(expected) => match scalar_type {
                ScalarType::String => data
                    .read_string(&path)
                    .map(|actual| membership(operator, &actual, expected)),
                _ => data
                    .read_string_list(&path)
                    .map(|actual| overlap(operator, &actual, expected)),
            },
            PredicateValue::ListOfLongs(expected) => match scalar_type {
                ScalarType::Long => data
                    .read_long(&path)
                    .map(|actual| membership(operator, &actual, expected)),
                _ => data
                    .read_long_list(&path)
                    .map(|actual| overlap(operator, &actual, expected)),
            },
        };
        Ok(outcome.unwrap_or(false))
    }

    /// Context the referenced question was answered in, seen from the evaluating block.
    fn context_for(
        &self,
        owner: &BlockDefinition,
        question_id: QuestionId,
    ) -> Result<Path, PredicateAnomaly> {
        let Some(target) = owner.enumerator_id() else {
            return Ok(applicant_path());
        };

        let mut block = self.block;
        let mut context = self.context.clone();
        for _ in 0..=self.program.block_count() {
            match block.enumerator_id() {
                Some(enumerator) if enumerator == target => return Ok(context),
                Some(enumerator) => {
                    block = self
                        .program
                        .block_definition(enumerator)
                        .map_err(|_| PredicateAnomaly::OutOfContext { question_id })?;
                    context = context.parent_path();
                }
                None => break,
            }
        }
        Err(PredicateAnomaly::OutOfContext { question_id })
    }
}

fn supports(scalar_type: ScalarType, operator: Operator, value: &PredicateValue) -> bool {
    use Operator::*;

    match (scalar_type, value) {
        (ScalarType::String, PredicateValue::String(_)) => matches!(operator, EqualTo | NotEqualTo),
        (ScalarType::Long, PredicateValue::Long(_)) => matches!(
            operator,
            EqualTo | NotEqualTo | GreaterThan | GreaterThanOrEqualTo | LessThan | LessThanOrEqualTo
        ),
        (ScalarType::String, PredicateValue::ListOfStrings(_))
        | (ScalarType::Long, PredicateValue::ListOfLongs(_)) => matches!(operator, In | NotIn),
        (ScalarType::ListOfString, PredicateValue::ListOfStrings(_))
        | (ScalarType::ListOfLong, PredicateValue::ListOfLongs(_)) => {
            matches!(operator, AnyOf | NoneOf)
        }
        _ => false,
    }
}

fn compare<T: PartialOrd>(operator: Operator, actual: &T, expected: &T) -> bool {
    match operator {
        Operator::EqualTo => actual == expected,
        Operator::NotEqualTo => actual != expected,
        Operator::GreaterThan => actual > expected,
        Operator::GreaterThanOrEqualTo => actual >= expected,
        Operator::LessThan => actual < expected,
        Operator::LessThanOrEqualTo => actual <= expected,
        _ => false,
    }
}

fn membership<T: PartialEq>(operator: Operator, actual: &T, expected: &[T]) -> bool {
    match operator {
        Operator::In => expected.contains(actual),
        Operator::NotIn => !expected.contains(actual),
        _ => false,
    }
}

fn overlap<T: PartialEq>(operator: Operator, actual: &[T], expected: &[T]) -> bool {
    let any = actual.iter().any(|value| expected.contains(value));
    match operator {
        Operator::AnyOf => any,
        Operator::NoneOf => !any,
        _ => false,
    }
}
