//! Logging and tracing configuration
//!
//! Diagnostics go to stderr so that rendered results on stdout stay clean.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter directive for the given verbosity
fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "httpprobe=debug,warn"
    } else {
        "httpprobe=info,warn"
    }
}

/// Initialize tracing for the CLI (stderr logging)
///
/// Logs are controlled by the `RUST_LOG` environment variable.
/// Without it, `verbose` selects DEBUG for this crate, otherwise INFO.
pub fn init_cli(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive_follows_verbosity() {
        assert_eq!(default_directive(true), "httpprobe=debug,warn");
        assert_eq!(default_directive(false), "httpprobe=info,warn");
    }
}
