//! Whole pipeline, from source text to module text.
use crate::{
    codegen::Generator,
    diagnostic::Annotation,
    error::{Cd20Error, Cd20Result},
    parser::Parser,
    scan::Lexer,
    symbols::SymbolTableManager,
};

/// Compiler configuration parameters.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CompileConf {
    /// Log the syntax tree after parsing.
    pub dump_ast: bool,
    /// Log every scope and symbol after code generation.
    pub dump_symbols: bool,
    /// Log the instruction listing after the module is built.
    pub dump_code: bool,
}

/// Result of a successful compile.
#[derive(Debug, Clone)]
pub struct Compilation {
    /// SM20 module text.
    pub module: String,
    /// Warnings raised along the way.
    pub annotations: Vec<Annotation>,
}

/// Compile a CD20 translation unit.
///
/// A program that fails to parse yields [`Cd20Error::Compile`] carrying
/// every annotation raised, the error last.
pub fn compile_str(source_code: &str, conf: &CompileConf) -> Cd20Result<Compilation> {
    let mut symbols = SymbolTableManager::new();
    let mut annotations: Vec<Annotation> = Vec::new();

    let root = Parser::new(Lexer::new(source_code), &mut symbols, &mut annotations).parse();
    let root = match root {
        Some(root) => root,
        None => return Err(Cd20Error::Compile(annotations)),
    };
    if conf.dump_ast {
        log::debug!("syntax tree:\n{}", root);
    }

    let mut code = Generator::new(&mut symbols).generate(&root)?;
    let module = code.generate_module(&mut symbols)?;

    if conf.dump_symbols {
        log::debug!("{}", symbols);
    }
    if conf.dump_code {
        log::debug!("{}", code);
    }

    Ok(Compilation { module, annotations })
}
