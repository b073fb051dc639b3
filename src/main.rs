fn main() {
    if let Err(e) = app_lib::run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
