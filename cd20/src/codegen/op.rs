//! SM20 operation codes.
use std::fmt;

/// Machine operations, by their byte code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
#[rustfmt::skip]
pub enum Operation {
    Halt    = 0,
    Noop    = 1,
    Trap    = 2,
    /// Integer zero to top of stack.
    Zero    = 3,
    False   = 4,
    True    = 5,
    /// Toggle between integer and float.
    Type    = 7,
    Itype   = 8,
    Ftype   = 9,

    Add     = 11,
    /// Second minus top.
    Sub     = 12,
    Mul     = 13,
    Div     = 14,
    Rem     = 15,
    Pow     = 16,
    /// Change sign.
    Chs     = 17,
    Abs     = 18,

    // Compare top of stack against zero.
    Gt      = 21,
    Ge      = 22,
    Lt      = 23,
    Le      = 24,
    Eq      = 25,
    Ne      = 26,

    And     = 31,
    Or      = 32,
    Xor     = 33,
    Not     = 34,
    /// Pop condition, then branch to the popped address when true.
    Bt      = 35,
    /// Pop condition, then branch to the popped address when false.
    Bf      = 36,
    /// Branch to the popped address.
    Br      = 37,

    /// Load value at popped address.
    L       = 40,
    /// Push the one byte operand.
    Lb      = 41,
    /// Push the two byte operand.
    Lh      = 42,
    /// Store top of stack at the address below it.
    St      = 43,
    Step    = 51,
    /// Reserve stack slots, count popped.
    Alloc   = 52,
    Array   = 53,
    Index   = 54,
    Size    = 55,
    Dup     = 56,

    Readf   = 60,
    Readi   = 61,
    Valpr   = 62,
    Strpr   = 63,
    Chrpr   = 64,
    Newln   = 65,
    Space   = 66,

    /// Move top of stack into the return slot.
    Rval    = 70,
    Retn    = 71,
    /// Jump to subroutine.
    Js2     = 72,

    // Load value, by base register.
    Lv0     = 80,
    Lv1     = 81,
    Lv2     = 82,
    // Load address, by base register.
    La0     = 90,
    La1     = 91,
    La2     = 92,

    /// Load value, base register not known yet.
    PlaceholderLv = 100,
    /// Load address, base register not known yet.
    PlaceholderLa = 110,
}

impl Operation {
    #[inline]
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Whether the operation stands in for a load until backfilled.
    #[inline]
    pub fn is_placeholder(self) -> bool {
        matches!(self, Operation::PlaceholderLv | Operation::PlaceholderLa)
    }

    /// Assembly mnemonic.
    #[rustfmt::skip]
    pub fn mnemonic(self) -> &'static str {
        use Operation as O;
        match self {
            O::Halt          => "HALT",
            O::Noop          => "NOOP",
            O::Trap          => "TRAP",
            O::Zero          => "ZERO",
            O::False         => "FALSE",
            O::True          => "TRUE",
            O::Type          => "TYPE",
            O::Itype         => "ITYPE",
            O::Ftype         => "FTYPE",
            O::Add           => "ADD",
            O::Sub           => "SUB",
            O::Mul           => "MUL",
            O::Div           => "DIV",
            O::Rem           => "REM",
            O::Pow           => "POW",
            O::Chs           => "CHS",
            O::Abs           => "ABS",
            O::Gt            => "GT",
            O::Ge            => "GE",
            O::Lt            => "LT",
            O::Le            => "LE",
            O::Eq            => "EQ",
            O::Ne            => "NE",
            O::And           => "AND",
            O::Or            => "OR",
            O::Xor           => "XOR",
            O::Not           => "NOT",
            O::Bt            => "BT",
            O::Bf            => "BF",
            O::Br            => "BR",
            O::L             => "L",
            O::Lb            => "LB",
            O::Lh            => "LH",
            O::St            => "ST",
            O::Step          => "STEP",
            O::Alloc         => "ALLOC",
            O::Array         => "ARRAY",
            O::Index         => "INDEX",
            O::Size          => "SIZE",
            O::Dup           => "DUP",
            O::Readf         => "READF",
            O::Readi         => "READI",
            O::Valpr         => "VALPR",
            O::Strpr         => "STRPR",
            O::Chrpr         => "CHRPR",
            O::Newln         => "NEWLN",
            O::Space         => "SPACE",
            O::Rval          => "RVAL",
            O::Retn          => "RETN",
            O::Js2           => "JS2",
            O::Lv0           => "LV0",
            O::Lv1           => "LV1",
            O::Lv2           => "LV2",
            O::La0           => "LA0",
            O::La1           => "LA1",
            O::La2           => "LA2",
            O::PlaceholderLv => "LV?",
            O::PlaceholderLa => "LA?",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.mnemonic())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(Operation::Halt.code(), 0);
        assert_eq!(Operation::Strpr.code(), 63);
        assert_eq!(Operation::La0.code(), 90);
        assert_eq!(Operation::Lv2.code(), 82);
        assert_eq!(Operation::PlaceholderLa.code(), 110);
        assert!(Operation::PlaceholderLv.is_placeholder());
        assert!(!Operation::La1.is_placeholder());
    }

    #[test]
    fn test_mnemonic() {
        assert_eq!(Operation::Js2.to_string(), "JS2");
        assert_eq!(format!("{:<6}|", Operation::St.mnemonic()), "ST    |");
    }
}
