fn main() {
    if let Err(err) = windiet::cli::run() {
        windiet::ui::eprintln_error(&err);
        std::process::exit(windiet::exit::exit_code(&err));
    }
}
