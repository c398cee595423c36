use anyhow::Context;
use forum_domain::config::ForumConfig;
use forum_kernel::config::load_config;
use forum_logger::Logger;
use forum_server::Server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg: ForumConfig =
        load_config(None::<&str>).context("Critical: Configuration is malformed")?;

    let mut logger = Logger::builder(env!("CARGO_PKG_NAME"))
        .level_name(&cfg.logging.level)
        .context("Critical: Unknown log level")?
        .json(cfg.logging.json);
    if let Some(dir) = &cfg.logging.path {
        logger = logger.path(dir.clone());
    }
    let _log = logger.init()?;

    Server::builder().config(cfg).build()?.run().await
}
