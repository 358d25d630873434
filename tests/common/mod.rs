//! A small MIPS I interpreter for the subset of instructions the code
//! generator emits. Branch delay slots are not modelled; every slot the
//! generator fills holds a `nop`.

use std::collections::HashMap;

const STACK_TOP: i32 = 0x7fff_0000;
const DATA_BASE: u32 = 0x1000_0000;
const CALLER_FP: i32 = 0x0bad_f00d;
const HALT: i32 = -1;
const STEP_LIMIT: usize = 1_000_000;

#[derive(Debug, Clone, PartialEq)]
enum Operand {
    Register(usize),
    Immediate(i32),
    Memory { offset: i32, base: usize },
    Got(String),
    Symbol(String),
}

#[derive(Debug, Clone)]
struct Instruction {
    mnemonic: String,
    operands: Vec<Operand>,
    line: usize,
}

fn register_number(name: &str) -> Option<usize> {
    const ABI: [&str; 32] = [
        "zero", "at", "v0", "v1", "a0", "a1", "a2", "a3", "t0", "t1", "t2", "t3", "t4", "t5",
        "t6", "t7", "s0", "s1", "s2", "s3", "s4", "s5", "s6", "s7", "t8", "t9", "k0", "k1",
        "gp", "sp", "fp", "ra",
    ];

    let name = name.strip_prefix('$')?;
    if let Ok(number) = name.parse::<usize>() {
        return (number < 32).then_some(number);
    }
    ABI.iter().position(|abi| *abi == name)
}

fn parse_operand(text: &str) -> Result<Operand, String> {
    if let Some(register) = register_number(text) {
        return Ok(Operand::Register(register));
    }
    if let Some(rest) = text.strip_prefix("%got(") {
        let name = rest
            .split(')')
            .next()
            .ok_or_else(|| format!("malformed GOT reference {:?}", text))?;
        return Ok(Operand::Got(name.to_string()));
    }
    if let Some((offset, base)) = text.split_once('(') {
        let base = register_number(base.trim_end_matches(')'))
            .ok_or_else(|| format!("bad base register in {:?}", text))?;
        let offset = offset
            .parse::<i32>()
            .map_err(|_| format!("bad offset in {:?}", text))?;
        return Ok(Operand::Memory { offset, base });
    }
    if let Ok(value) = text.parse::<i32>() {
        return Ok(Operand::Immediate(value));
    }
    Ok(Operand::Symbol(text.to_string()))
}

#[derive(PartialEq)]
enum Section {
    Text,
    Data,
}

pub struct Machine {
    instructions: Vec<Instruction>,
    labels: HashMap<String, usize>,
    symbols: HashMap<String, u32>,
    memory: HashMap<u32, i32>,
    registers: [i32; 32],
    lo: i32,
    pub steps: usize,
}

impl Machine {
    /// Assembles `source` into an instruction list, a label table and the
    /// initial data image.
    pub fn load(source: &str) -> Result<Machine, String> {
        let mut machine = Machine {
            instructions: vec![],
            labels: HashMap::new(),
            symbols: HashMap::new(),
            memory: HashMap::new(),
            registers: [0; 32],
            lo: 0,
            steps: 0,
        };
        let mut section = Section::Text;
        let mut last_data_label: Option<String> = None;

        for (index, raw) in source.lines().enumerate() {
            let line = index + 1;
            let text = raw.trim();
            if text.is_empty() {
                continue;
            }

            if !raw.starts_with(char::is_whitespace) {
                let label = text
                    .strip_suffix(':')
                    .ok_or_else(|| format!("line {}: expected a label, got {:?}", line, text))?;
                match section {
                    Section::Text => {
                        if machine
                            .labels
                            .insert(label.to_string(), machine.instructions.len())
                            .is_some()
                        {
                            return Err(format!("line {}: label {} defined twice", line, label));
                        }
                    }
                    Section::Data => {
                        machine.allocate(label);
                        last_data_label = Some(label.to_string());
                    }
                }
                continue;
            }

            let (mnemonic, operands) = match text.split_once(char::is_whitespace) {
                Some((mnemonic, operands)) => (mnemonic, operands.trim()),
                None => (text, ""),
            };

            if mnemonic.starts_with('.') {
                match mnemonic {
                    ".text" => section = Section::Text,
                    ".data" => section = Section::Data,
                    ".comm" => {
                        let name = operands.split(',').next().unwrap_or_default().trim();
                        machine.allocate(name);
                    }
                    ".word" => {
                        let name = last_data_label
                            .take()
                            .ok_or_else(|| format!("line {}: .word without a label", line))?;
                        let value = operands
                            .parse::<i32>()
                            .map_err(|_| format!("line {}: bad word {:?}", line, operands))?;
                        let address = machine.symbols[&name];
                        machine.memory.insert(address, value);
                    }
                    _ => {}
                }
                continue;
            }

            let operands = if operands.is_empty() {
                vec![]
            } else {
                operands
                    .split(',')
                    .map(|operand| parse_operand(operand.trim()))
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|error| format!("line {}: {}", line, error))?
            };

            machine.instructions.push(Instruction {
                mnemonic: mnemonic.to_string(),
                operands,
                line,
            });
        }

        machine.check_branch_targets()?;
        Ok(machine)
    }

    fn allocate(&mut self, name: &str) {
        let next = DATA_BASE + 4 * self.symbols.len() as u32;
        let address = *self.symbols.entry(name.to_string()).or_insert(next);
        self.memory.entry(address).or_insert(0);
    }

    fn check_branch_targets(&self) -> Result<(), String> {
        for instruction in &self.instructions {
            for operand in &instruction.operands {
                if let Operand::Symbol(name) = operand {
                    if !self.labels.contains_key(name) {
                        return Err(format!(
                            "line {}: undefined label {}",
                            instruction.line, name
                        ));
                    }
                }
            }
        }
        Ok(())
    }

    /// Current value of a global variable.
    pub fn global(&self, name: &str) -> Option<i32> {
        let address = self.symbols.get(name)?;
        self.memory.get(address).copied()
    }

    /// Calls `function` with up to four arguments and returns `$v0`.
    ///
    /// Fails when the callee does not restore `$sp`, `$fp` and `$s0`-`$s7`.
    pub fn call(&mut self, function: &str, arguments: &[i32]) -> Result<i32, String> {
        let mut pc = *self
            .labels
            .get(function)
            .ok_or_else(|| format!("no function {}", function))?;

        self.registers = [0; 32];
        self.registers[29] = STACK_TOP;
        self.registers[30] = CALLER_FP;
        self.registers[31] = HALT;
        for index in 16..=23 {
            self.registers[index] = 0x5000 + index as i32;
        }
        for (index, argument) in arguments.iter().enumerate() {
            self.registers[4 + index] = *argument;
        }
        let saved = self.registers;

        loop {
            self.steps += 1;
            if self.steps > STEP_LIMIT {
                return Err(format!("no halt after {} steps", STEP_LIMIT));
            }

            let instruction = self
                .instructions
                .get(pc)
                .cloned()
                .ok_or_else(|| format!("fell off the program at {}", pc))?;

            match self.step(&instruction, pc)? {
                Some(next) => pc = next,
                None => break,
            }
        }

        for index in (16..=23).chain([29, 30]) {
            if self.registers[index] != saved[index] {
                return Err(format!(
                    "${} not restored: {:#x} instead of {:#x}",
                    index, self.registers[index], saved[index]
                ));
            }
        }

        Ok(self.registers[2])
    }

    /// Runs `main` without arguments.
    pub fn run_main(&mut self) -> Result<i32, String> {
        self.call("main", &[])
    }

    fn read(&self, operand: &Operand) -> Result<i32, String> {
        match operand {
            Operand::Register(register) => Ok(self.registers[*register]),
            Operand::Immediate(value) => Ok(*value),
            other => Err(format!("expected a register or immediate, got {:?}", other)),
        }
    }

    fn write(&mut self, operand: &Operand, value: i32) -> Result<(), String> {
        match operand {
            Operand::Register(0) => Ok(()),
            Operand::Register(register) => {
                self.registers[*register] = value;
                Ok(())
            }
            other => Err(format!("expected a register, got {:?}", other)),
        }
    }

    fn address(&self, operand: &Operand) -> Result<u32, String> {
        let Operand::Memory { offset, base } = operand else {
            return Err(format!("expected a memory operand, got {:?}", operand));
        };
        let address = self.registers[*base].wrapping_add(*offset) as u32;
        if address % 4 != 0 {
            return Err(format!("unaligned access at {:#x}", address));
        }
        Ok(address)
    }

    fn target(&self, operand: &Operand) -> Result<usize, String> {
        match operand {
            Operand::Symbol(name) => self
                .labels
                .get(name)
                .copied()
                .ok_or_else(|| format!("undefined label {}", name)),
            other => Err(format!("expected a label, got {:?}", other)),
        }
    }

    fn step(&mut self, instruction: &Instruction, pc: usize) -> Result<Option<usize>, String> {
        let ops = &instruction.operands;
        let arity = |count: usize| {
            if ops.len() == count {
                Ok(())
            } else {
                Err(format!(
                    "line {}: {} takes {} operands",
                    instruction.line, instruction.mnemonic, count
                ))
            }
        };
        let next = pc + 1;

        match instruction.mnemonic.as_str() {
            "nop" => {}
            "addu" | "addiu" | "addi" | "sub" | "and" | "or" | "xor" | "slt" | "srlv"
            | "sllv" => {
                arity(3)?;
                let (s, t) = (self.read(&ops[1])?, self.read(&ops[2])?);
                let value = match instruction.mnemonic.as_str() {
                    "addu" | "addiu" | "addi" => s.wrapping_add(t),
                    "sub" => s.wrapping_sub(t),
                    "and" => s & t,
                    "or" => s | t,
                    "xor" => s ^ t,
                    "slt" => (s < t) as i32,
                    "srlv" => ((s as u32) >> (t & 31)) as i32,
                    _ => ((s as u32) << (t & 31)) as i32,
                };
                self.write(&ops[0], value)?;
            }
            "mult" => {
                arity(2)?;
                self.lo = self.read(&ops[0])?.wrapping_mul(self.read(&ops[1])?);
            }
            "div" => {
                arity(2)?;
                let divisor = self.read(&ops[1])?;
                if divisor == 0 {
                    return Err(format!("line {}: division by zero", instruction.line));
                }
                self.lo = self.read(&ops[0])?.wrapping_div(divisor);
            }
            "mflo" => {
                arity(1)?;
                self.write(&ops[0], self.lo)?;
            }
            "li" | "move" => {
                arity(2)?;
                let value = self.read(&ops[1])?;
                self.write(&ops[0], value)?;
            }
            "lw" => {
                arity(2)?;
                let value = match &ops[1] {
                    Operand::Got(name) => *self
                        .symbols
                        .get(name)
                        .ok_or_else(|| format!("no GOT entry for {}", name))?
                        as i32,
                    memory => {
                        let address = self.address(memory)?;
                        self.memory.get(&address).copied().unwrap_or(0)
                    }
                };
                self.write(&ops[0], value)?;
            }
            "sw" => {
                arity(2)?;
                let value = self.read(&ops[0])?;
                let address = self.address(&ops[1])?;
                self.memory.insert(address, value);
            }
            "beq" | "bne" => {
                arity(3)?;
                let equal = self.read(&ops[0])? == self.read(&ops[1])?;
                if equal == (instruction.mnemonic == "beq") {
                    return Ok(Some(self.target(&ops[2])?));
                }
            }
            "b" => {
                arity(1)?;
                return Ok(Some(self.target(&ops[0])?));
            }
            "jal" => {
                arity(1)?;
                self.registers[31] = next as i32;
                return Ok(Some(self.target(&ops[0])?));
            }
            "jr" => {
                arity(1)?;
                let target = self.read(&ops[0])?;
                if target == HALT {
                    return Ok(None);
                }
                return Ok(Some(target as usize));
            }
            other => {
                return Err(format!(
                    "line {}: unsupported instruction {}",
                    instruction.line, other
                ))
            }
        }

        Ok(Some(next))
    }
}
