fn main() {
    let code = apphub_deploy::run_cli();
    if code != 0 {
        std::process::exit(code);
    }
}
