fn main() {
    if let Err(err) = housing_insights::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
