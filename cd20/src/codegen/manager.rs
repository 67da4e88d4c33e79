use smol_str::SmolStr;
use std::{collections::BTreeMap, convert::TryFrom, fmt};

use super::{
    module::{Lines, Section, WordFilled},
    Instruction, Operation,
};
use crate::{
    constants::{STRING_TERMINATOR, WORD_SIZE},
    error::{Cd20Error, Cd20Result},
    symbols::{BaseRegister, SymbolId, SymbolTableManager},
};

/// Literal value paired with the symbol that stands for it in the pool.
#[derive(Debug, Clone, PartialEq)]
pub struct Constant<T> {
    pub value: T,
    pub symbol: SymbolId,
}

/// Owns the instruction stream and constant pool of a module.
///
/// Instructions are keyed by their byte position. Each instruction
/// starts where the previous one ends.
#[derive(Debug, Default)]
pub struct CodeManager {
    instructions: BTreeMap<usize, Instruction>,
    /// Position of the next instruction.
    cursor: usize,
    integers: Vec<Constant<i64>>,
    floats: Vec<Constant<f64>>,
    strings: Vec<Constant<SmolStr>>,
}

impl CodeManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an instruction, returning the position it was placed at.
    pub fn insert(&mut self, instruction: Instruction) -> usize {
        let position = self.cursor;
        log::trace!("{:04}: {}", position, instruction);
        self.cursor += instruction.size();
        self.instructions.insert(position, instruction);
        position
    }

    #[inline]
    pub fn insert_op(&mut self, op: Operation) -> usize {
        self.insert(Instruction::simple(op))
    }

    /// Append a load of a symbol that is resolved when the module is built.
    #[inline]
    pub fn insert_backfill(&mut self, placeholder: Operation, symbol: SymbolId) -> usize {
        self.insert(Instruction::backfill(placeholder, symbol))
    }

    /// Position the next instruction will be placed at.
    #[inline]
    pub fn position(&self) -> usize {
        self.cursor
    }

    pub fn instruction(&self, position: usize) -> Option<&Instruction> {
        self.instructions.get(&position)
    }

    /// Instructions in stream order, with their positions.
    pub fn instructions(&self) -> impl Iterator<Item = (usize, &Instruction)> {
        self.instructions.iter().map(|(position, instr)| (*position, instr))
    }

    /// Overwrite the operands of an already emitted instruction.
    pub fn patch_operands(&mut self, position: usize, bytes: &[u8]) -> Cd20Result<()> {
        self.instructions
            .get_mut(&position)
            .ok_or_else(|| Cd20Error::internal(format!("no instruction at position {}", position)))?
            .patch(bytes)
    }

    pub fn add_integer_constant(&mut self, value: i64, symbol: SymbolId) {
        self.integers.push(Constant { value, symbol });
    }

    pub fn add_float_constant(&mut self, value: f64, symbol: SymbolId) {
        self.floats.push(Constant { value, symbol });
    }

    pub fn add_string_constant(&mut self, value: impl Into<SmolStr>, symbol: SymbolId) {
        self.strings.push(Constant {
            value: value.into(),
            symbol,
        });
    }

    pub fn integer_constants(&self) -> &[Constant<i64>] {
        &self.integers
    }

    pub fn float_constants(&self) -> &[Constant<f64>] {
        &self.floats
    }

    pub fn string_constants(&self) -> &[Constant<SmolStr>] {
        &self.strings
    }

    /// Lay out the constant pool, backfill every symbol load, and
    /// serialise the module.
    ///
    /// The pool starts on the first word boundary after the code, with
    /// integers first, then floats, then strings.
    pub fn generate_module(&mut self, symbols: &mut SymbolTableManager) -> Cd20Result<String> {
        let mut offset = next_word_boundary(self.cursor);
        offset = place_constants(&self.integers, offset, symbols, |_| WORD_SIZE)?;
        offset = place_constants(&self.floats, offset, symbols, |_| WORD_SIZE)?;
        offset = place_constants(&self.strings, offset, symbols, |value| value.len() + 1)?;
        log::debug!("module size {} bytes", offset);

        self.backfill(symbols)?;

        let sections = [
            self.instruction_section()?,
            self.integer_section(),
            self.float_section(),
            self.string_section()?,
        ];

        Ok(sections
            .iter()
            .map(Section::to_string)
            .collect::<Vec<_>>()
            .join("\n"))
    }

    /// Resolve every backfilled load.
    ///
    /// Every referenced symbol must have its storage by now.
    pub fn backfill(&mut self, symbols: &SymbolTableManager) -> Cd20Result<()> {
        self.instructions
            .values_mut()
            .try_for_each(|instruction| instruction.resolve(symbols))
    }

    fn instruction_section(&self) -> Cd20Result<Section> {
        let mut section = WordFilled::new();
        for instruction in self.instructions.values() {
            section.push(instruction.op().code())?;
            section.extend(instruction.operands())?;
        }
        Ok(section.finish()?)
    }

    fn integer_section(&self) -> Section {
        let mut section = Lines::new();
        for constant in &self.integers {
            section.push(constant.value);
        }
        section.finish()
    }

    /// Reals keep a fractional part (`2.0`) and switch to exponent form
    /// at the extremes (`1e20`, `1e-7`).
    fn float_section(&self) -> Section {
        let mut section = Lines::new();
        for constant in &self.floats {
            section.push(format!("{:?}", constant.value));
        }
        section.finish()
    }

    fn string_section(&self) -> Cd20Result<Section> {
        let mut section = WordFilled::new();
        for constant in &self.strings {
            section.extend(constant.value.as_bytes())?;
            section.push(STRING_TERMINATOR)?;
        }
        Ok(section.finish()?)
    }
}

/// Bind each constant's symbol to its pool offset, returning the offset after the last one.
fn place_constants<T>(
    constants: &[Constant<T>],
    start: usize,
    symbols: &mut SymbolTableManager,
    size_of: impl Fn(&T) -> usize,
) -> Cd20Result<usize> {
    let mut offset = start;
    for constant in constants {
        let position = i32::try_from(offset)
            .map_err(|_| Cd20Error::internal(format!("constant offset {} out of range", offset)))?;
        symbols
            .symbol_mut(constant.symbol)
            .set_storage(BaseRegister::Constants, position);
        offset += size_of(&constant.value);
    }
    Ok(offset)
}

#[inline]
fn next_word_boundary(position: usize) -> usize {
    match position % WORD_SIZE {
        0 => position,
        remainder => position + (WORD_SIZE - remainder),
    }
}

/// Instruction listing, one per line.
impl fmt::Display for CodeManager {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "instructions: {}", self.instructions.len())?;
        for (position, instruction) in &self.instructions {
            writeln!(f, "{:04}: {}", position, instruction)?;
        }
        writeln!(
            f,
            "constants: {} int, {} real, {} string",
            self.integers.len(),
            self.floats.len(),
            self.strings.len()
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        symbols::{Attribute, Symbol, SymbolKind},
        types::DataType,
    };

    fn pooled(symbols: &mut SymbolTableManager, key: &str, kind: SymbolKind) -> SymbolId {
        symbols.insert_constant(key, Symbol::new(kind, key, 1, 1))
    }

    #[test]
    fn test_positions_are_contiguous() {
        let mut code = CodeManager::new();
        assert_eq!(code.insert(Instruction::with_operands(Operation::Lb, [2])), 0);
        assert_eq!(code.insert_op(Operation::Alloc), 2);
        assert_eq!(code.insert_backfill(Operation::PlaceholderLv, SymbolId(0)), 3);
        assert_eq!(code.insert_op(Operation::Halt), 8);
        assert_eq!(code.position(), 9);

        let mut expected = 0;
        for (position, instruction) in code.instructions() {
            assert_eq!(position, expected);
            expected += instruction.size();
        }
    }

    #[test]
    fn test_word_boundary() {
        assert_eq!(next_word_boundary(0), 0);
        assert_eq!(next_word_boundary(1), 8);
        assert_eq!(next_word_boundary(8), 8);
        assert_eq!(next_word_boundary(13), 16);
    }

    #[test]
    fn test_constant_layout() {
        let mut symbols = SymbolTableManager::new();
        symbols.create_scope("global");
        let int = pooled(&mut symbols, "7", SymbolKind::IntConstant);
        let real = pooled(&mut symbols, "2.5", SymbolKind::RealConstant);
        let first = pooled(&mut symbols, "\"hi\"", SymbolKind::StringConstant);
        let second = pooled(&mut symbols, "\"yo\"", SymbolKind::StringConstant);

        let mut code = CodeManager::new();
        code.add_integer_constant(7, int);
        code.add_float_constant(2.5, real);
        code.add_string_constant("hi", first);
        code.add_string_constant("yo", second);
        code.insert_backfill(Operation::PlaceholderLv, int);
        code.insert_backfill(Operation::PlaceholderLa, second);
        code.insert_op(Operation::Halt);

        let module = code.generate_module(&mut symbols).unwrap();

        // 11 bytes of code round up to 16.
        let offset = |id: SymbolId| symbols.symbol(id).storage().unwrap().offset;
        assert_eq!(offset(int), 16);
        assert_eq!(offset(real), 24);
        assert_eq!(offset(first), 32);
        assert_eq!(offset(second), 35);

        assert_eq!(
            module,
            "2\n  80  00  00  00  16  90  00  00\n  00  35  00  00  00  00  00  00\n\
             1\n7\n\
             1\n2.5\n\
             1\n 104 105  00 121 111  00  00  00"
        );
    }

    #[test]
    fn test_section_counts_match_lines() {
        let mut symbols = SymbolTableManager::new();
        symbols.create_scope("global");
        let long = symbols.insert_constant(
            "\"a rather long string constant\"",
            Symbol::new(SymbolKind::StringConstant, "s", 1, 1)
                .with_attribute(Attribute::DataType(DataType::String)),
        );

        let mut code = CodeManager::new();
        code.add_string_constant("a rather long string constant", long);
        for _ in 0..3 {
            code.insert_backfill(Operation::PlaceholderLa, long);
            code.insert_op(Operation::Strpr);
        }
        code.insert_op(Operation::Halt);

        let module = code.generate_module(&mut symbols).unwrap();
        let mut lines = module.lines();
        while let Some(count) = lines.next() {
            let count: usize = count.parse().unwrap();
            for _ in 0..count {
                assert!(lines.next().is_some());
            }
        }
    }

    #[test]
    fn test_unset_storage_is_internal_error() {
        let mut symbols = SymbolTableManager::new();
        symbols.create_scope("global");
        let function = symbols.insert_symbol(Symbol::new(SymbolKind::Function, "f", 1, 1), None);

        let mut code = CodeManager::new();
        code.insert_backfill(Operation::PlaceholderLa, function);
        code.insert_op(Operation::Js2);

        assert!(matches!(
            code.generate_module(&mut symbols),
            Err(Cd20Error::Internal(_))
        ));
    }

    #[test]
    fn test_float_format() {
        let mut code = CodeManager::new();
        for value in [2.0, 0.5, 1e20, 1e-7] {
            code.add_float_constant(value, SymbolId(0));
        }
        assert_eq!(code.float_section().to_string(), "4\n2.0\n0.5\n1e20\n1e-7");
    }

    #[test]
    fn test_patch_operands() {
        let mut code = CodeManager::new();
        let jump = code.insert(Instruction::with_operands(Operation::La0, [0; 4]));
        code.insert_op(Operation::Br);
        code.patch_operands(jump, &[0, 0, 0, 6]).unwrap();
        assert_eq!(code.instruction(jump).unwrap().operands(), &[0, 0, 0, 6]);
        assert!(code.patch_operands(1, &[0]).is_err());
    }
}
