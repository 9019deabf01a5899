fn main() {
    if let Err(e) = cardpeek::cli::main() {
        eprintln!("❌ {e}");
        std::process::exit(1);
    }
}
