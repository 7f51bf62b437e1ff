pub mod artifact;
pub mod builder;
pub mod cli;
pub mod credentials;
pub mod metadata;
pub mod uploader;

/// Run the command line interface and return an exit code.
pub fn run_cli() -> i32 {
    cli::run()
}
