use std::process::ExitCode;

fn main() -> ExitCode {
    ExitCode::from(flowc_driver::run())
}
