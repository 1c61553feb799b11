use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Verbosity follows the repeated `-v` convention: 0 = info, 1 = debug, 2+ = trace.
pub fn init_cli_logger(verbose: u8) {
    let default_filter = match verbose {
        0 => "ood_predict=info",
        1 => "ood_predict=debug,info",
        _ => "trace",
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .init();
}
