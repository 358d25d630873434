//! Textual assembly output.

use std::fmt::Display;

/// Column the operands start at, counted from the mnemonic.
const MNEMONIC_WIDTH: usize = 12;

/// Accumulates the generated assembly, one line per instruction, directive or label.
#[derive(Debug, Default, Clone)]
pub struct Assembly {
    text: String,
}

impl Assembly {
    pub fn new() -> Self {
        Assembly::default()
    }

    /// `    mnemonic    operands`, with the mnemonic padded to a fixed width.
    pub fn emit(&mut self, mnemonic: &str, operands: impl Display) {
        let line = format!("    {:<width$}{}", mnemonic, operands, width = MNEMONIC_WIDTH);
        self.text.push_str(line.trim_end());
        self.text.push('\n');
    }

    /// An instruction or directive without operands.
    pub fn emit_bare(&mut self, mnemonic: &str) {
        self.emit(mnemonic, "");
    }

    pub fn nop(&mut self) {
        self.emit_bare("nop");
    }

    pub fn label(&mut self, label: impl Display) {
        self.text.push_str(&format!("{}:\n", label));
    }

    pub fn blank(&mut self) {
        self.text.push('\n');
    }

    pub fn into_string(self) -> String {
        self.text
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelKind {
    Not,
    End,
    Else,
    Top,
    Do,
}

impl LabelKind {
    fn prefix(&self) -> &'static str {
        match self {
            LabelKind::Not => "not",
            LabelKind::End => "end",
            LabelKind::Else => "else",
            LabelKind::Top => "top",
            LabelKind::Do => "do",
        }
    }
}

/// Local branch target such as `$end3`. The number comes from the session
/// counter, so every construct owns a distinct set of labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Label {
    pub kind: LabelKind,
    pub number: u32,
}

impl Label {
    pub fn new(kind: LabelKind, number: u32) -> Self {
        Label { kind, number }
    }
}

impl Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "${}{}", self.kind.prefix(), self.number)
    }
}
