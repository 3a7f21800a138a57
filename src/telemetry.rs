use std::io;

use anyhow::{anyhow, Context, Result};
use tracing_subscriber::{
    fmt::{format::FmtSpan, time::UtcTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

pub(crate) fn init() -> Result<()> {
    let fmt_env_filter = env_filter_merge_from_environment("info", "PHOTOSHARE_LOG_LEVEL")?;
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_timer(UtcTime::rfc_3339())
        .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE)
        .with_filter(fmt_env_filter);

    tracing_subscriber::registry()
        .with(fmt_layer)
        .try_init()
        .context("Failed to set global default tracing subscriber")?;

    Ok(())
}

fn env_filter_merge_from_environment(
    default_directives: &'static str,
    env_var: &'static str,
) -> Result<EnvFilter> {
    let mut filter = EnvFilter::builder()
        .parse(default_directives)
        .with_context(|| anyhow!("Default directives were invalid: {default_directives}"))?;

    if let Ok(env_value) = std::env::var(env_var) {
        for env_directive in env_value.split(',') {
            match env_directive.parse() {
                Ok(directive) => filter = filter.add_directive(directive),
                Err(err) => eprintln!("WARN ignoring log directive: {env_directive:?}: {err}"),
            }
        }
    }

    Ok(filter)
}
