/// Initializes logging to stderr; stdout is reserved for command output.
pub fn init_logger(verbose: bool) {
    env_logger::Builder::new()
        .filter_level(if verbose {
            log::LevelFilter::Trace
        } else {
            log::LevelFilter::Warn
        })
        .target(env_logger::Target::Stderr)
        .init();
}
