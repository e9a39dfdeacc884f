use std::process::ExitCode;

fn main() -> ExitCode {
    critbot_cli::run()
}
