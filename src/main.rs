use std::process::ExitCode;

fn main() -> ExitCode {
    pyautodoc::cli::run()
}
