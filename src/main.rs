fn main() {
    if let Err(err) = tabsync::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
