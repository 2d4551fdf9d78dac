//! Binary entrypoint for minifont-cli.

fn main() {
    if let Err(err) = minifont_cli::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
