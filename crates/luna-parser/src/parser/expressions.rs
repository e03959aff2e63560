use crate::ast::{BinaryOp, Expression, UnaryOp};
use crate::parser::{line_of, AstParser};
use crate::pest_parser::Rule;
use pest::iterators::Pair;

impl AstParser {
    /// Build an expression from an `expr` pair, resolving precedence with the Pratt table
    pub(super) fn build_expr(&self, pair: Pair<Rule>) -> Result<Expression, String> {
        if pair.as_rule() != Rule::expr {
            return Err(format!("Expected expression, got {:?}", pair.as_rule()));
        }

        self.pratt
            .map_primary(|primary| self.build_primary(primary))
            .map_prefix(|op, operand| {
                let line = line_of(&op);
                let op = match op.as_rule() {
                    Rule::op_neg => UnaryOp::Negate,
                    Rule::op_not => UnaryOp::Not,
                    Rule::op_len => UnaryOp::Length,
                    rule => return Err(format!("Unknown prefix operator: {:?}", rule)),
                };
                Ok(Expression::Unary {
                    op,
                    operand: Box::new(operand?),
                    line,
                })
            })
            .map_infix(|left, op, right| {
                let line = line_of(&op);
                let op = binary_op(op.as_rule())?;
                Ok(Expression::Binary {
                    op,
                    left: Box::new(left?),
                    right: Box::new(right?),
                    line,
                })
            })
            .parse(pair.into_inner())
    }
}

fn binary_op(rule: Rule) -> Result<BinaryOp, String> {
    let op = match rule {
        Rule::op_or => BinaryOp::Or,
        Rule::op_and => BinaryOp::And,
        Rule::op_lt => BinaryOp::Lt,
        Rule::op_le => BinaryOp::Le,
        Rule::op_gt => BinaryOp::Gt,
        Rule::op_ge => BinaryOp::Ge,
        Rule::op_eq => BinaryOp::Eq,
        Rule::op_ne => BinaryOp::Ne,
        Rule::op_concat => BinaryOp::Concat,
        Rule::op_add => BinaryOp::Add,
        Rule::op_sub => BinaryOp::Sub,
        Rule::op_mul => BinaryOp::Mul,
        Rule::op_div => BinaryOp::Div,
        Rule::op_mod => BinaryOp::Mod,
        Rule::op_pow => BinaryOp::Pow,
        _ => return Err(format!("Unknown binary operator: {:?}", rule)),
    };
    Ok(op)
}
