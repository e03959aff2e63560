use crate::ast::Chunk;
use crate::parser::AstParser;
use pest::Parser;
use pest_derive::Parser;

#[derive(Parser)]
#[grammar = "grammar.pest"]
pub struct LunaParser;

/// Parse source text into a chunk named `<chunk>`
pub fn parse(source: &str) -> Result<Chunk, String> {
    parse_chunk("<chunk>", source)
}

/// Parse source text into a chunk with the given module name
pub fn parse_chunk(module: &str, source: &str) -> Result<Chunk, String> {
    let mut pairs = LunaParser::parse(Rule::chunk, source)
        .map_err(|e| format!("Parse error: {}", e))?;

    let chunk = pairs.next().ok_or("Empty parse result")?;

    AstParser::new().build_chunk(module, chunk)
}
