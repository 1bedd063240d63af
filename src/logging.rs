use anyhow::Context as _;

/// Directives applied when `RUST_LOG` is unset. The HTML parser stack is
/// chatty at debug level, so it stays at `warn` unless asked for explicitly.
const DEFAULT_DIRECTIVES: &str = "info,html5ever=warn,selectors=warn";

pub fn init() -> anyhow::Result<()> {
    init_with_default(DEFAULT_DIRECTIVES)
}

pub fn init_with_default(default_directives: &str) -> anyhow::Result<()> {
    let filter = match tracing_subscriber::EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => tracing_subscriber::EnvFilter::try_new(default_directives)
            .with_context(|| format!("build log filter from {default_directives:?}"))?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow::anyhow!("initialize tracing subscriber: {err}"))?;

    Ok(())
}
