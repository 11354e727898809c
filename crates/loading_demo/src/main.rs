use std::env;
use std::process::ExitCode;

mod app;

use app::options::{parse_options, usage_text, ParsedArgs};

fn main() -> ExitCode {
    let args = env::args().skip(1).collect::<Vec<_>>();
    let options = match parse_options(&args) {
        Ok(ParsedArgs::Run(options)) => options,
        Ok(ParsedArgs::Help) => {
            println!("{}", usage_text());
            return ExitCode::SUCCESS;
        }
        Err(message) => {
            eprintln!("{message}\n\n{}", usage_text());
            return ExitCode::from(2);
        }
    };

    match app::bootstrap::build_app(options) {
        Ok(wiring) => app::loop_runner::run(wiring),
        Err(err) => {
            eprintln!("startup failed: {err}");
            ExitCode::FAILURE
        }
    }
}
