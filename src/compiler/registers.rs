//! MIPS general-purpose registers and the bands the allocator hands out.

use std::{fmt::Display, ops::RangeInclusive};

/// Number of registers available for passing arguments (`$a0`..`$a3`).
pub const ARGUMENT_REGISTERS: usize = 4;
/// Number of callee-saved registers preserved by every prologue (`$s0`..`$s7`).
pub const SAVED_REGISTERS: usize = 8;

/// Callee-saved band used for expression scratch values.
pub const SCRATCH_BAND: RangeInclusive<u8> = 16..=23;
/// Caller-saved temporaries. Tracked, but nothing allocates them yet.
pub const TEMPORARY_BAND: RangeInclusive<u8> = 8..=15;
/// Marked used from the start: `$zero`, `$at`, `$v0`/`$v1`, `$a0`-`$a3`,
/// `$k0`/`$k1`, `$gp`, `$sp`, `$fp` and `$ra`.
pub const RESERVED: [RangeInclusive<u8>; 2] = [0..=7, 26..=31];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Register(pub u8);

impl Register {
    pub const ZERO: Register = Register(0);
    pub const V0: Register = Register(2);
    pub const A0: Register = Register(4);
    pub const T8: Register = Register(24);
    pub const GP: Register = Register(28);
    pub const SP: Register = Register(29);
    pub const FP: Register = Register(30);
    pub const RA: Register = Register(31);

    /// `$a{index}`, for `index < ARGUMENT_REGISTERS`.
    pub fn argument(index: usize) -> Register {
        Register(Register::A0.0 + index as u8)
    }

    /// `$s{index}`, for `index < SAVED_REGISTERS`.
    pub fn saved(index: usize) -> Register {
        Register(*SCRATCH_BAND.start() + index as u8)
    }

    pub fn index(&self) -> usize {
        self.0 as usize
    }

    /// ABI name as used in prologues and epilogues, e.g. `$s0`, `$fp`.
    pub fn name(&self) -> String {
        match self.0 {
            0 => String::from("$zero"),
            1 => String::from("$at"),
            2..=3 => format!("$v{}", self.0 - 2),
            4..=7 => format!("$a{}", self.0 - 4),
            8..=15 => format!("$t{}", self.0 - 8),
            16..=23 => format!("$s{}", self.0 - 16),
            24..=25 => format!("$t{}", self.0 - 16),
            26..=27 => format!("$k{}", self.0 - 26),
            28 => String::from("$gp"),
            29 => String::from("$sp"),
            30 => String::from("$fp"),
            _ => String::from("$ra"),
        }
    }
}

/// Numeric form, `$16`, as used inside expression code.
impl Display for Register {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "${}", self.0)
    }
}
