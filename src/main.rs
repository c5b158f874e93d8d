use account_ledger::{app, common::logging};

fn main() {
    logging::init();

    if let Err(e) = app::run(std::env::args()) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
