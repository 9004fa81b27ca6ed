pub mod compute_budget;
pub mod file;
pub mod system;

pub use file::{InstructionFileError, load_instruction_file, parse_instruction_file};
