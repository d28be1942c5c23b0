use anyhow::{Context, Result};
use clap::Parser;
use gradebook::app::App;
use gradebook::config::Config;
use gradebook::http::HttpServer;
use gradebook::logging;
use gradebook::store::FileStore;

fn main() -> Result<()> {
    let config = Config::parse();
    logging::init_logging(&config.log_level, config.log_format)?;

    let addr = config.socket_addr();
    let mut server = HttpServer::bind(addr, config.limits())
        .with_context(|| format!("Failed to bind {}", addr))?;
    server.set_timeout(config.timeout());

    let store = FileStore::in_dir(&config.data_dir);
    let mut app = App::new(store, &config.index);

    tracing::info!(
        addr = %server.local_addr()?,
        store = %app.store().path().display(),
        "Server listening"
    );

    server.serve(&mut app);
    Ok(())
}
