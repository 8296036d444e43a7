pub mod context;
pub mod diagnostics;
pub mod lexer;
pub mod parser;
pub mod pretty;
pub mod span;
pub mod types;

pub use context::CompilerContext;
pub use diagnostics::Error;
pub use parser::stmt::Statement;

/// Parse a complete source text against the given context, producing the
/// top-level statements. The caller owns the context so predefined global
/// bindings stay a driver concern.
pub fn parse_source(context: &mut CompilerContext, source: &str) -> Result<Vec<Statement>, Error> {
    let mut tokens = lexer::TokenStream::new(source)?;
    parser::parse_program(context, &mut tokens)
}
