use crate::ast::{
    Block, ElseIf, Expression, ExpressionList, FunctionBody, FunctionName, GenericFor, IfStatement,
    NameList, NumericFor, ReturnStatement, Statement,
};
use crate::parser::{end_line_of, line_of, significant, AstParser};
use crate::pest_parser::Rule;
use pest::iterators::Pair;

impl AstParser {
    pub(super) fn build_block(&self, pair: Pair<Rule>) -> Result<Block, String> {
        let end_line = end_line_of(&pair);
        let mut statements = Vec::new();
        let mut return_stmt = None;

        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::return_stat => return_stmt = Some(self.build_return_statement(inner)?),
                _ => statements.push(self.build_statement(inner)?),
            }
        }

        Ok(Block::new(statements, return_stmt, end_line))
    }

    fn build_return_statement(&self, pair: Pair<Rule>) -> Result<ReturnStatement, String> {
        let line = line_of(&pair);
        let exp_list = match significant(pair).next() {
            Some(list) => Some(self.build_expr_list(list)?),
            None => None,
        };
        Ok(ReturnStatement { exp_list, line })
    }

    pub(super) fn build_statement(&self, pair: Pair<Rule>) -> Result<Statement, String> {
        let line = line_of(&pair);

        match pair.as_rule() {
            Rule::local_function => {
                // Grammar: "local" ~ "function" ~ identifier ~ func_body
                let mut inner = significant(pair);
                let name = self.build_name(inner.next().ok_or("Missing local function name")?)?;
                let body_pair = inner.next().ok_or("Missing local function body")?;
                let body = self.build_func_body(body_pair, line)?;
                Ok(Statement::LocalFunction { name, body })
            }

            Rule::local_names => {
                // Grammar: "local" ~ name_list ~ ("=" ~ expr_list)?
                let mut inner = significant(pair);
                let names = self.build_name_list(inner.next().ok_or("Missing local names")?)?;
                let exp_list = match inner.next() {
                    Some(list) => Some(self.build_expr_list(list)?),
                    None => None,
                };
                Ok(Statement::LocalNameList { names, exp_list })
            }

            Rule::function_stat => {
                // Grammar: "function" ~ func_name ~ func_body
                let mut inner = significant(pair);
                let name = self.build_func_name(inner.next().ok_or("Missing function name")?)?;
                let body_pair = inner.next().ok_or("Missing function body")?;
                let body = self.build_func_body(body_pair, line)?;
                Ok(Statement::Function { name, body })
            }

            Rule::do_stat => {
                let block_pair = significant(pair).next().ok_or("Missing do block")?;
                Ok(Statement::Do(self.build_block(block_pair)?))
            }

            Rule::while_stat => {
                // Grammar: "while" ~ expr ~ "do" ~ block ~ "end"
                let mut inner = significant(pair);
                let condition = self.build_expr(inner.next().ok_or("Missing while condition")?)?;
                let body = self.build_block(inner.next().ok_or("Missing while body")?)?;
                Ok(Statement::While {
                    condition,
                    body,
                    line,
                })
            }

            Rule::repeat_stat => {
                // Grammar: "repeat" ~ block ~ "until" ~ expr
                let mut inner = significant(pair);
                let body = self.build_block(inner.next().ok_or("Missing repeat body")?)?;
                let condition = self.build_expr(inner.next().ok_or("Missing until condition")?)?;
                Ok(Statement::Repeat {
                    body,
                    condition,
                    line,
                })
            }

            Rule::if_stat => self.build_if_statement(pair),

            Rule::numeric_for => {
                // Grammar: "for" ~ identifier ~ "=" ~ expr ~ "," ~ expr ~ ("," ~ expr)? ~ "do" ~ block ~ "end"
                let mut inner: Vec<Pair<Rule>> = significant(pair).collect();
                let block_pair = inner.pop().ok_or("Missing for body")?;
                let mut inner = inner.into_iter();
                let var = self.build_name(inner.next().ok_or("Missing for variable")?)?;
                let start = self.build_expr(inner.next().ok_or("Missing for start")?)?;
                let limit = self.build_expr(inner.next().ok_or("Missing for limit")?)?;
                let step = match inner.next() {
                    Some(step) => Some(self.build_expr(step)?),
                    None => None,
                };
                let body = self.build_block(block_pair)?;
                Ok(Statement::NumericFor(NumericFor {
                    var,
                    start,
                    limit,
                    step,
                    body,
                }))
            }

            Rule::generic_for => {
                // Grammar: "for" ~ name_list ~ "in" ~ expr_list ~ "do" ~ block ~ "end"
                let mut inner = significant(pair);
                let names = self.build_name_list(inner.next().ok_or("Missing for names")?)?;
                let exp_list = self.build_expr_list(inner.next().ok_or("Missing for iterator")?)?;
                let body = self.build_block(inner.next().ok_or("Missing for body")?)?;
                Ok(Statement::GenericFor(GenericFor {
                    names,
                    exp_list,
                    body,
                    line,
                }))
            }

            Rule::break_stat => Ok(Statement::Break { line }),

            Rule::assignment => {
                // Grammar: var_list ~ "=" ~ expr_list
                let mut inner = pair.into_inner();
                let var_list = inner.next().ok_or("Missing assignment targets")?;
                let exp_list = self.build_expr_list(inner.next().ok_or("Missing assignment values")?)?;

                let mut targets = Vec::new();
                for var in var_list.into_inner() {
                    let target = self.build_suffixed(var)?;
                    match target {
                        Expression::Name(_) | Expression::Index { .. } | Expression::Member { .. } => {
                            targets.push(target)
                        }
                        _ => return Err(format!("line {}: cannot assign to this expression", line)),
                    }
                }

                Ok(Statement::Assignment {
                    targets,
                    exp_list,
                    line,
                })
            }

            Rule::call_stat => {
                let expr_pair = pair.into_inner().next().ok_or("Empty expression statement")?;
                match self.build_suffixed(expr_pair)? {
                    Expression::Call(call) => Ok(Statement::Call(*call)),
                    _ => Err(format!(
                        "line {}: syntax error, expression statement must be a call",
                        line
                    )),
                }
            }

            _ => Err(format!("Unexpected statement rule: {:?}", pair.as_rule())),
        }
    }

    fn build_if_statement(&self, pair: Pair<Rule>) -> Result<Statement, String> {
        let line = line_of(&pair);
        let mut inner = significant(pair);

        // Grammar: "if" ~ expr ~ "then" ~ block ~ elseif_clause* ~ else_clause? ~ "end"
        let condition = self.build_expr(inner.next().ok_or("Missing if condition")?)?;
        let then_block = self.build_block(inner.next().ok_or("Missing then block")?)?;

        let mut else_ifs = Vec::new();
        let mut else_block = None;

        for clause in inner {
            match clause.as_rule() {
                Rule::elseif_clause => {
                    let mut parts = significant(clause);
                    let condition = self.build_expr(parts.next().ok_or("Missing elseif condition")?)?;
                    let block = self.build_block(parts.next().ok_or("Missing elseif block")?)?;
                    else_ifs.push(ElseIf { condition, block });
                }
                Rule::else_clause => {
                    let block_pair = significant(clause).next().ok_or("Missing else block")?;
                    else_block = Some(self.build_block(block_pair)?);
                }
                _ => return Err(format!("Unexpected if clause: {:?}", clause.as_rule())),
            }
        }

        Ok(Statement::If(IfStatement {
            condition,
            then_block,
            else_ifs,
            else_block,
            line,
        }))
    }

    fn build_func_name(&self, pair: Pair<Rule>) -> Result<FunctionName, String> {
        let mut path = Vec::new();
        let mut method = None;

        // Grammar: identifier ~ ("." ~ identifier)* ~ method_name?
        for part in pair.into_inner() {
            match part.as_rule() {
                Rule::identifier => path.push(self.build_name(part)?),
                Rule::method_name => {
                    let name_pair = part.into_inner().next().ok_or("Missing method name")?;
                    method = Some(self.build_name(name_pair)?);
                }
                _ => return Err(format!("Unexpected function name part: {:?}", part.as_rule())),
            }
        }

        if path.is_empty() {
            return Err("Function name cannot be empty".to_string());
        }

        Ok(FunctionName { path, method })
    }

    /// `line` is the line of the `function` keyword that introduced the body
    pub(super) fn build_func_body(&self, pair: Pair<Rule>, line: u32) -> Result<FunctionBody, String> {
        let mut params = NameList::default();
        let mut block = None;

        // Grammar: "(" ~ param_list? ~ ")" ~ block ~ "end"
        for part in significant(pair) {
            match part.as_rule() {
                Rule::param_list => params = self.build_name_list(part)?,
                Rule::block => block = Some(self.build_block(part)?),
                _ => return Err(format!("Unexpected function body part: {:?}", part.as_rule())),
            }
        }

        Ok(FunctionBody {
            params,
            block: block.ok_or("Missing function block")?,
            line,
        })
    }

    pub(super) fn build_expr_list(&self, pair: Pair<Rule>) -> Result<ExpressionList, String> {
        let expressions = pair
            .into_inner()
            .map(|p| self.build_expr(p))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ExpressionList::new(expressions))
    }
}
