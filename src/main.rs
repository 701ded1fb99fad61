fn main() {
    if let Err(err) = csv_batchload::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
