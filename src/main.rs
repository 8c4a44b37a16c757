use clap::Parser;
use davis_www::app::{Options, RunError, run_with_io};
use davis_www::fetch::HttpFetcher;
use log::error;
use std::panic::{self, PanicHookInfo};

/// Exit codes for the application
const EXIT_SUCCESS: i32 = 0;
const EXIT_ERROR: i32 = 1;
const EXIT_PANIC: i32 = 2;

/// Load settings, build the HTTP fetcher and poll until done.
///
/// # Errors
/// Returns `RunError` if the configuration is invalid, the HTTP client cannot
/// be built, or writing to stdout fails. Unreachable reporters are not errors.
async fn run(options: Options) -> Result<(), RunError> {
    let settings = options.load_settings()?;
    let fetcher = HttpFetcher::new(settings.timeout)?;
    let mut stdout = std::io::stdout().lock();

    run_with_io(&options, &settings, &fetcher, &mut stdout).await?;
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Set up panic hook to ensure clean exit codes for process managers
    // (e.g., systemd, Telegraf execd) that monitor exit status
    panic::set_hook(Box::new(move |info: &PanicHookInfo| {
        eprintln!("Panic! {}", info);
        std::process::exit(EXIT_PANIC);
    }));

    let options = Options::parse();

    let default_filter = if options.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    match run(options).await {
        Ok(()) => std::process::exit(EXIT_SUCCESS),
        Err(why) => {
            error!("{}", why);
            std::process::exit(EXIT_ERROR);
        }
    }
}
