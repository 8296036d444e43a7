use clap::Parser;
use std::path::PathBuf;

use valleyc::types::TypeRegistry;
use valleyc::{diagnostics, pretty, CompilerContext};

#[derive(Parser)]
#[command(name = "valleyc", version, about = "The Valley compiler front end")]
struct Cli {
    /// Source file path
    file: PathBuf,
}

fn main() {
    let cli = Cli::parse();

    let source = match std::fs::read_to_string(&cli.file) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("error: could not read {}: {err}", cli.file.display());
            return;
        }
    };

    let mut context = CompilerContext::new();
    context.create_identifier("true", TypeRegistry::BOOL, true, true);
    context.create_identifier("false", TypeRegistry::BOOL, true, true);
    context.create_identifier("null", TypeRegistry::VOID, true, true);

    let filename = cli.file.display().to_string();
    match valleyc::parse_source(&mut context, &source) {
        Ok(code) => {
            for (i, stmt) in code.iter().enumerate() {
                println!("--- {} ---", i + 1);
                println!("{}", pretty::statement_repr(&context.types, stmt));
            }
        }
        Err(err) => diagnostics::render_error(&source, &filename, &err),
    }
}
