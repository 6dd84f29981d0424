use std::process::ExitCode;

fn main() -> ExitCode {
    instabids_cli::run()
}
