//! Stack frame layout of a compiled function.
//!
//! ```text
//!  high   old $sp
//!         parameters, locals         -4*slot($fp), with $fp = old $sp - 4
//!         saved $fp
//!         (padding word, globals)
//!         $ra                        48($sp)
//!         $s0..$s7                   16($sp)..44($sp)
//!  low    argument home area         0($sp)..12($sp)
//! ```

pub const WORD_SIZE: u32 = 4;
/// Words reserved at the bottom of the frame for the callee's argument homes.
pub const ARGUMENT_HOME_WORDS: u32 = 4;
/// Bytes each block-scoped dynamic pushes onto the stack.
pub const DYNAMIC_SLOT_BYTES: u32 = 8;

const SAVED_REGISTER_WORDS: u32 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Frame {
    pub globals: u32,
    pub locals: u32,
    pub params: u32,
}

impl Frame {
    pub fn new(globals: usize, locals: usize, params: usize) -> Self {
        Frame {
            globals: globals as u32,
            locals: locals as u32,
            params: params as u32,
        }
    }

    /// Total words: one spare, globals, locals, params, `$s0`-`$s7`,
    /// `$ra`, argument homes, rounded up to an even count.
    pub fn words(&self) -> u32 {
        let words = 1
            + self.globals
            + self.locals
            + self.params
            + SAVED_REGISTER_WORDS
            + 1
            + ARGUMENT_HOME_WORDS;
        words + words % 2
    }

    /// Frame size in bytes, always a multiple of 8.
    pub fn size(&self) -> u32 {
        self.words() * WORD_SIZE
    }

    /// `$sp`-relative offset of `$s{index}` at function entry.
    pub fn saved_register_offset(&self, index: usize) -> u32 {
        WORD_SIZE * (ARGUMENT_HOME_WORDS + index as u32)
    }

    /// `$sp`-relative offset of `$ra` at function entry.
    pub fn return_address_offset(&self) -> u32 {
        WORD_SIZE * (ARGUMENT_HOME_WORDS + SAVED_REGISTER_WORDS)
    }

    /// `$sp`-relative offset of the caller's `$fp`, just below the locals.
    pub fn frame_pointer_offset(&self) -> u32 {
        self.size() - WORD_SIZE * (self.locals + self.params + 1)
    }
}
