fn main() {
    if let Err(err) = pomoloop_lib::run() {
        eprintln!("pomoloop: {err:#}");
        std::process::exit(1);
    }
}
