use std::net::SocketAddr;
use std::path::Path;

use anyhow::Context;
use quill_core::QuillConfig;
use quill_trigger::{HttpTrigger, TriggerOptions};
use tracing::info;

use super::init::CONFIG_FILE;
use super::pages;

pub async fn serve(config_path: Option<&Path>, bind: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    let addr = match bind {
        Some(bind) => bind
            .parse::<SocketAddr>()
            .with_context(|| format!("invalid --bind address {bind:?}"))?,
        None => config.bind_addr()?,
    };

    let options = TriggerOptions::from_config(&config);
    info!(
        %addr,
        content_type = %options.default_content_type,
        redirect_status = options.redirect_status,
        "starting quill"
    );

    let trigger = HttpTrigger::new(addr, pages::site(), options);
    let (tx, rx) = tokio::sync::watch::channel(false);

    let server = tokio::spawn(trigger.serve(rx));

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl-c")?;
    info!("received ctrl-c, shutting down");
    let _ = tx.send(true);

    server.await.context("server task failed")?
}

fn load_config(path: Option<&Path>) -> anyhow::Result<QuillConfig> {
    match path {
        Some(path) => QuillConfig::from_file(path)
            .with_context(|| format!("failed to load {}", path.display())),
        None => {
            let default = Path::new(CONFIG_FILE);
            if default.exists() {
                QuillConfig::from_file(default)
                    .with_context(|| format!("failed to load {}", default.display()))
            } else {
                Ok(QuillConfig::default())
            }
        }
    }
}
