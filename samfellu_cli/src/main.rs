fn main() {
    std::process::exit(samfellu_cli::run_cli());
}
