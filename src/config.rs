/// Knobs shared by the assembler and the interpreter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Character that separates statements in one input
    pub separator: char,
    /// How many registers the interpreter may hold at once
    pub max_registers: usize,
}

impl Config {
    pub const DEFAULT_SEPARATOR: char = ';';
    pub const DEFAULT_MAX_REGISTERS: usize = 127;

    pub fn with_separator(mut self, separator: char) -> Self {
        self.separator = separator;
        self
    }

    pub fn with_max_registers(mut self, max_registers: usize) -> Self {
        self.max_registers = max_registers;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            separator: Self::DEFAULT_SEPARATOR,
            max_registers: Self::DEFAULT_MAX_REGISTERS,
        }
    }
}
