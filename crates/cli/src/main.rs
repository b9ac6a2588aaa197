use std::process::ExitCode;

fn main() -> ExitCode {
    tia_cli::run()
}
