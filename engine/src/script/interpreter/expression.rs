//! Postfix expression evaluation.
//!
//! An expression is a flat postfix sequence. It is reduced by repeatedly replacing the first
//! `operand operand operator` triple with its result until one operand is left. The parser emits
//! operators in source order, so evaluation is strictly left to right: `2 + 3 * 4` is `20`.
//! Parentheses are the only way to group.

use crate::{
    ecs::value::{Operator, Value},
    script::{
        error::RuntimeError,
        interpreter::Executor,
        node::{Node, NodeKind},
    },
};

#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Operand(Value),
    Operator(Operator),
}

/// Reduce a postfix sequence to its value.
pub fn reduce(mut items: Vec<Item>) -> Result<Value, RuntimeError> {
    while items.len() > 1 {
        let position = items
            .windows(3)
            .position(|window| {
                matches!(
                    window,
                    [Item::Operand(_), Item::Operand(_), Item::Operator(_)]
                )
            })
            .ok_or(RuntimeError::MalformedExpression)?;
        let reduced = match &items[position..position + 3] {
            [Item::Operand(lhs), Item::Operand(rhs), Item::Operator(operator)] => {
                operator.apply(lhs, rhs)?
            }
            _ => return Err(RuntimeError::MalformedExpression),
        };
        items.splice(position..position + 3, [Item::Operand(reduced)]);
    }
    match items.pop() {
        Some(Item::Operand(value)) => Ok(value),
        _ => Err(RuntimeError::MalformedExpression),
    }
}

impl Executor<'_, '_> {
    pub(super) fn evaluate(&mut self, expression: &Node) -> Result<Value, RuntimeError> {
        let items = expression
            .children
            .iter()
            .map(|node| self.item(node))
            .collect::<Result<Vec<_>, _>>()?;
        reduce(items)
    }

    fn item(&mut self, node: &Node) -> Result<Item, RuntimeError> {
        let value = match node.kind {
            NodeKind::Operator => {
                return Operator::from_symbol(&node.value)
                    .map(Item::Operator)
                    .ok_or(RuntimeError::MalformedExpression);
            }
            NodeKind::Number => Value::Number(literal(node)?),
            NodeKind::Integer => Value::Integer(literal(node)?),
            NodeKind::String => Value::String(node.value.clone()),
            NodeKind::Boolean => Value::Boolean(node.value == "true"),
            NodeKind::Path => self.stack.read(&node.segments())?,
            NodeKind::Call => self.call(node)?,
            _ => return Err(RuntimeError::MalformedExpression),
        };
        Ok(Item::Operand(value))
    }
}

fn literal<T: std::str::FromStr>(node: &Node) -> Result<T, RuntimeError> {
    node.value
        .parse()
        .map_err(|_| RuntimeError::MalformedExpression)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::Error;

    fn operand(value: impl Into<Value>) -> Item {
        Item::Operand(value.into())
    }

    #[test]
    fn reduces_left_to_right() {
        // 2 + 3 * 4, as written
        let items = vec![
            operand(2_i64),
            operand(3_i64),
            Item::Operator(Operator::Add),
            operand(4_i64),
            Item::Operator(Operator::Mul),
        ];
        assert_eq!(reduce(items), Ok(Value::Integer(20)));
    }

    #[test]
    fn grouped_operands_reduce_first() {
        // 2 * (3 + 4)
        let items = vec![
            operand(2_i64),
            operand(3_i64),
            operand(4_i64),
            Item::Operator(Operator::Add),
            Item::Operator(Operator::Mul),
        ];
        assert_eq!(reduce(items), Ok(Value::Integer(14)));
    }

    #[test]
    fn malformed_sequences() {
        assert_eq!(reduce(Vec::new()), Err(RuntimeError::MalformedExpression));
        assert_eq!(
            reduce(vec![operand(1_i64), operand(2_i64)]),
            Err(RuntimeError::MalformedExpression)
        );
        assert_eq!(
            reduce(vec![Item::Operator(Operator::Add)]),
            Err(RuntimeError::MalformedExpression)
        );
    }

    #[test]
    fn operator_errors_propagate() {
        let items = vec![operand(1_i64), operand(0_i64), Item::Operator(Operator::Div)];
        assert_eq!(
            reduce(items),
            Err(RuntimeError::Ecs(Error::DivisionByZero {
                operator: Operator::Div
            }))
        );
    }
}
