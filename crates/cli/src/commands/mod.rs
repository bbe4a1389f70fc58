pub mod config;
pub mod doctor;
pub mod seed;

pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}
