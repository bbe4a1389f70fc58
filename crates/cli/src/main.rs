use std::process::ExitCode;

fn main() -> ExitCode {
    estoque_cli::run()
}
