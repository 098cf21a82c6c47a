use log::LevelFilter;
use samfellu_traits::{SmfError, SmfResult};
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};

/// This is a basic setup for a samfellu application to get you started.
/// Duplicate and customize as needed when your needs grow.
///
/// verbose: if true, debug lines from the pipeline are printed, otherwise only warnings and errors.
/// Everything goes to stderr so the progress line on stdout stays readable.
pub fn basic_samfellu_setup(verbose: bool) -> SmfResult<()> {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    let config = ConfigBuilder::new()
        .set_time_level(LevelFilter::Off)
        .set_target_level(LevelFilter::Debug)
        .build();
    TermLogger::init(level, config, TerminalMode::Stderr, ColorChoice::Auto)
        .map_err(|e| SmfError::configuration("Failed to set up the logger").add_cause(&e.to_string()))
}
