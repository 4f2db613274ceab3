use std::process::ExitCode;

fn main() -> ExitCode {
    depthtrack::cli::run()
}
