use crate::ast::{
    CallKind, Expression, ExpressionList, FuncCall, Literal, TableDefine, TableField, Terminator,
};
use crate::parser::{line_of, AstParser};
use crate::pest_parser::Rule;
use pest::iterators::Pair;

impl AstParser {
    pub(super) fn build_primary(&self, pair: Pair<Rule>) -> Result<Expression, String> {
        let line = line_of(&pair);

        match pair.as_rule() {
            Rule::nil_lit => Ok(literal(Literal::Nil, line)),
            Rule::true_lit => Ok(literal(Literal::Boolean(true), line)),
            Rule::false_lit => Ok(literal(Literal::Boolean(false), line)),
            Rule::number => {
                let value = parse_number(pair.as_str())?;
                Ok(Expression::number(value, line))
            }
            Rule::string => Ok(Expression::string(self.build_string(pair)?, line)),
            Rule::function_def => {
                let body_pair = crate::parser::significant(pair)
                    .next()
                    .ok_or("Missing function body")?;
                let body = self.build_func_body(body_pair, line)?;
                Ok(Expression::Function(Box::new(body)))
            }
            Rule::table_constructor => Ok(Expression::Table(self.build_table(pair)?)),
            Rule::suffixed_expr => self.build_suffixed(pair),
            _ => Err(format!("Unexpected primary rule: {:?}", pair.as_rule())),
        }
    }

    /// Build `prefix_atom ~ suffix*`, folding the suffixes left to right
    pub(super) fn build_suffixed(&self, pair: Pair<Rule>) -> Result<Expression, String> {
        let mut inner = pair.into_inner();
        let atom = inner.next().ok_or("Empty suffixed expression")?;

        let mut expr = match atom.as_rule() {
            Rule::identifier => Expression::Name(self.build_name(atom)?),
            Rule::paren_expr => {
                let expr_pair = atom.into_inner().next().ok_or("Empty parenthesized expression")?;
                self.build_expr(expr_pair)?
            }
            _ => return Err(format!("Unexpected prefix expression: {:?}", atom.as_rule())),
        };

        for suffix in inner {
            let line = line_of(&suffix);
            expr = match suffix.as_rule() {
                Rule::member_suffix => {
                    let name_pair = suffix.into_inner().next().ok_or("Missing member name")?;
                    Expression::Member {
                        object: Box::new(expr),
                        member: self.build_name(name_pair)?,
                    }
                }
                Rule::index_suffix => {
                    let key_pair = suffix.into_inner().next().ok_or("Missing index key")?;
                    Expression::Index {
                        object: Box::new(expr),
                        key: Box::new(self.build_expr(key_pair)?),
                        line,
                    }
                }
                Rule::method_suffix => {
                    let mut parts = suffix.into_inner();
                    let method = self.build_name(parts.next().ok_or("Missing method name")?)?;
                    let args = self.build_call_args(parts.next().ok_or("Missing method arguments")?)?;
                    Expression::Call(Box::new(FuncCall {
                        kind: CallKind::Method {
                            object: expr,
                            method,
                        },
                        args,
                        line,
                    }))
                }
                Rule::call_suffix => {
                    let args_pair = suffix.into_inner().next().ok_or("Missing call arguments")?;
                    let args = self.build_call_args(args_pair)?;
                    Expression::Call(Box::new(FuncCall {
                        kind: CallKind::Normal { caller: expr },
                        args,
                        line,
                    }))
                }
                _ => return Err(format!("Unexpected suffix: {:?}", suffix.as_rule())),
            };
        }

        Ok(expr)
    }

    /// `(e1, e2)`, `{...}` or a single string literal
    fn build_call_args(&self, pair: Pair<Rule>) -> Result<ExpressionList, String> {
        let Some(inner) = pair.into_inner().next() else {
            return Ok(ExpressionList::default());
        };
        let line = line_of(&inner);

        match inner.as_rule() {
            Rule::expr_list => self.build_expr_list(inner),
            Rule::table_constructor => Ok(ExpressionList::new(vec![Expression::Table(
                self.build_table(inner)?,
            )])),
            Rule::string => Ok(ExpressionList::new(vec![Expression::string(
                self.build_string(inner)?,
                line,
            )])),
            _ => Err(format!("Unexpected call arguments: {:?}", inner.as_rule())),
        }
    }

    pub(super) fn build_table(&self, pair: Pair<Rule>) -> Result<TableDefine, String> {
        let line = line_of(&pair);
        let mut fields = Vec::new();

        for field in pair.into_inner() {
            let field = match field.as_rule() {
                Rule::positional_field => {
                    let value = field.into_inner().next().ok_or("Empty table item")?;
                    TableField::Positional(self.build_expr(value)?)
                }
                Rule::named_field => {
                    let mut parts = field.into_inner();
                    let name = self.build_name(parts.next().ok_or("Missing field name")?)?;
                    let value = self.build_expr(parts.next().ok_or("Missing field value")?)?;
                    TableField::Named { name, value }
                }
                Rule::indexed_field => {
                    let mut parts = field.into_inner();
                    let key = self.build_expr(parts.next().ok_or("Missing field key")?)?;
                    let value = self.build_expr(parts.next().ok_or("Missing field value")?)?;
                    TableField::Indexed { key, value }
                }
                _ => return Err(format!("Unexpected table field: {:?}", field.as_rule())),
            };
            fields.push(field);
        }

        Ok(TableDefine { fields, line })
    }

    fn build_string(&self, pair: Pair<Rule>) -> Result<String, String> {
        let content = pair.into_inner().next().ok_or("Malformed string literal")?;
        self.process_escape_sequences(content.as_str())
    }

    /// Handles: \n, \t, \r, \a, \b, \f, \v, \\, \", \', \0 and decimal \ddd
    fn process_escape_sequences(&self, s: &str) -> Result<String, String> {
        let mut result = String::with_capacity(s.len());
        let mut chars = s.chars().peekable();

        while let Some(ch) = chars.next() {
            if ch != '\\' {
                result.push(ch);
                continue;
            }

            match chars.next() {
                Some('n') => result.push('\n'),
                Some('t') => result.push('\t'),
                Some('r') => result.push('\r'),
                Some('a') => result.push('\u{07}'),
                Some('b') => result.push('\u{08}'),
                Some('f') => result.push('\u{0C}'),
                Some('v') => result.push('\u{0B}'),
                Some('\\') => result.push('\\'),
                Some('"') => result.push('"'),
                Some('\'') => result.push('\''),
                Some(d) if d.is_ascii_digit() => {
                    let mut code = d.to_digit(10).unwrap_or(0);
                    for _ in 0..2 {
                        match chars.peek().and_then(|c| c.to_digit(10)) {
                            Some(next) => {
                                code = code * 10 + next;
                                chars.next();
                            }
                            None => break,
                        }
                    }
                    let decoded = u8::try_from(code)
                        .map_err(|_| format!("Escape sequence too large: \\{}", code))?;
                    result.push(decoded as char);
                }
                // Unknown escape: keep it verbatim
                Some(other) => {
                    result.push('\\');
                    result.push(other);
                }
                None => result.push('\\'),
            }
        }

        Ok(result)
    }
}

fn literal(value: Literal, line: u32) -> Expression {
    Expression::Terminator(Terminator { value, line })
}

fn parse_number(text: &str) -> Result<f64, String> {
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        return u64::from_str_radix(hex, 16)
            .map(|n| n as f64)
            .map_err(|e| format!("Failed to parse number '{}': {}", text, e));
    }
    text.parse::<f64>()
        .map_err(|e| format!("Failed to parse number '{}': {}", text, e))
}
