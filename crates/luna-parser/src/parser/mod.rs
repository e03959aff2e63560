//! Pest pairs to AST conversion

use crate::ast::{Chunk, Name, NameList};
use crate::pest_parser::Rule;
use pest::iterators::Pair;
use pest::pratt_parser::{Assoc, Op, PrattParser};

mod expressions;
mod primary;
mod statements;

/// Builds AST nodes from the pest parse tree
pub struct AstParser {
    /// Binary/unary operator precedence, lowest first
    pratt: PrattParser<Rule>,
}

impl AstParser {
    pub fn new() -> Self {
        let pratt = PrattParser::new()
            .op(Op::infix(Rule::op_or, Assoc::Left))
            .op(Op::infix(Rule::op_and, Assoc::Left))
            .op(Op::infix(Rule::op_lt, Assoc::Left)
                | Op::infix(Rule::op_gt, Assoc::Left)
                | Op::infix(Rule::op_le, Assoc::Left)
                | Op::infix(Rule::op_ge, Assoc::Left)
                | Op::infix(Rule::op_ne, Assoc::Left)
                | Op::infix(Rule::op_eq, Assoc::Left))
            .op(Op::infix(Rule::op_concat, Assoc::Right))
            .op(Op::infix(Rule::op_add, Assoc::Left) | Op::infix(Rule::op_sub, Assoc::Left))
            .op(Op::infix(Rule::op_mul, Assoc::Left)
                | Op::infix(Rule::op_div, Assoc::Left)
                | Op::infix(Rule::op_mod, Assoc::Left))
            .op(Op::prefix(Rule::op_neg) | Op::prefix(Rule::op_not) | Op::prefix(Rule::op_len))
            .op(Op::infix(Rule::op_pow, Assoc::Right));

        Self { pratt }
    }

    pub fn build_chunk(&self, module: &str, pair: Pair<Rule>) -> Result<Chunk, String> {
        let block_pair = pair
            .into_inner()
            .find(|p| p.as_rule() == Rule::block)
            .ok_or("Missing block in chunk")?;

        let block = self.build_block(block_pair)?;

        Ok(Chunk {
            module: module.to_string(),
            block,
        })
    }

    pub(super) fn build_name(&self, pair: Pair<Rule>) -> Result<Name, String> {
        if pair.as_rule() != Rule::identifier {
            return Err(format!("Expected identifier, got {:?}", pair.as_rule()));
        }
        Ok(Name::new(pair.as_str(), line_of(&pair)))
    }

    /// Works for both `name_list` and `param_list`
    pub(super) fn build_name_list(&self, pair: Pair<Rule>) -> Result<NameList, String> {
        let names = pair
            .into_inner()
            .map(|p| self.build_name(p))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(NameList { names })
    }
}

impl Default for AstParser {
    fn default() -> Self {
        Self::new()
    }
}

/// 1-based line where the pair starts
pub(crate) fn line_of(pair: &Pair<Rule>) -> u32 {
    pair.as_span().start_pos().line_col().0 as u32
}

/// 1-based line where the pair ends
pub(crate) fn end_line_of(pair: &Pair<Rule>) -> u32 {
    pair.as_span().end_pos().line_col().0 as u32
}

/// Inner pairs without keyword tokens
pub(crate) fn significant<'i>(pair: Pair<'i, Rule>) -> impl Iterator<Item = Pair<'i, Rule>> {
    pair.into_inner().filter(|p| !is_keyword(p.as_rule()))
}

fn is_keyword(rule: Rule) -> bool {
    matches!(
        rule,
        Rule::kw_break
            | Rule::kw_do
            | Rule::kw_else
            | Rule::kw_elseif
            | Rule::kw_end
            | Rule::kw_for
            | Rule::kw_function
            | Rule::kw_if
            | Rule::kw_in
            | Rule::kw_local
            | Rule::kw_repeat
            | Rule::kw_return
            | Rule::kw_then
            | Rule::kw_until
            | Rule::kw_while
    )
}
