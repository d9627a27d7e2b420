pub mod config;
pub mod rotate;
pub mod schedule;
pub mod serve;
pub mod status;
pub mod trigger;
pub mod update;

/// Current-thread runtime for commands that drive async core code.
pub(crate) fn runtime() -> anyhow::Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?)
}
