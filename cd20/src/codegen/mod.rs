//! SM20 code generation.
mod generator;
mod instr;
mod manager;
mod module;
mod op;

pub use self::{
    generator::Generator,
    instr::Instruction,
    manager::{CodeManager, Constant},
    module::{Lines, Section, WordFilled},
    op::Operation,
};
