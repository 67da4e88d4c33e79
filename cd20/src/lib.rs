pub mod ast;
pub mod codegen;
mod compile;
pub mod constants;
pub mod diagnostic;
mod error;
pub mod parser;
pub mod scan;
pub mod symbols;
pub mod types;

pub use self::compile::{compile_str, CompileConf, Compilation};

/// Version of this compiler implementation.
pub const IMPL_VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod prelude {
    pub use super::{
        compile::{compile_str, CompileConf, Compilation},
        diagnostic::{Annotation, DiagnosticSink, Listing, Severity},
        error::{Cd20Error, Cd20Result, ParseError, ParseErrorKind, ParseResult},
        parser::Parser,
        symbols::SymbolTableManager,
    };
}
