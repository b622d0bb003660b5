use zap::cli::{run_cli, OutputFormatter};
use zap::utils::BuildInfo;

fn main() {
    if let Err(err) = run_cli(BuildInfo::default()) {
        eprintln!("{}", OutputFormatter::format_error(&err));
        std::process::exit(1);
    }
}
