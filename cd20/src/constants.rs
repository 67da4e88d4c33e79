//! Constant values of the SM20 target machine.

/// Size in bytes of one machine word.
///
/// Every numeric value, and every variable slot, occupies one word.
pub const WORD_SIZE: usize = 8;

/// Number of bytes per line in the word filled sections of a module.
pub const WORD_LINE: usize = WORD_SIZE;

/// First offset handed out in the globals region.
pub const GLOBALS_BASE: i32 = 0;

/// First offset handed out for function locals.
///
/// The first two words of a frame hold the return address
/// and the caller's frame pointer.
pub const LOCALS_BASE: i32 = 16;

/// First offset handed out for function parameters.
///
/// Parameters are pushed by the caller, so they live below the frame.
pub const PARAMS_BASE: i32 = -8;

/// Distance between consecutive variable slots.
pub const SLOT_SIZE: i32 = WORD_SIZE as i32;

/// Size in bytes of an instruction that loads a symbol's address or value.
///
/// One opcode byte followed by a 4-byte big-endian offset.
pub const ADDRESS_INSTR_SIZE: usize = 5;

/// Largest count that fits the single signed byte operand of `LB`.
pub const MAX_BYTE_OPERAND: usize = i8::MAX as usize;

/// Terminator byte written after each string constant.
pub const STRING_TERMINATOR: u8 = 0;

/// Deepest parenthesised nesting the expression parser accepts.
pub const MAX_NESTING_DEPTH: usize = 64;
