//! Command handlers. Each returns the process exit status.

mod account;
mod browse;
mod settings;
mod transfer;

use std::path::PathBuf;
use std::sync::Arc;

use motionlab_api::{ApiClient, SessionStore};

use crate::cli::{Cli, Command};
use crate::config::{self, CliConfig};

/// State shared by every command.
pub struct Context {
    pub config: CliConfig,
    pub config_path: PathBuf,
    pub session: Arc<SessionStore>,
}

impl Context {
    pub fn client(&self) -> anyhow::Result<ApiClient> {
        Ok(ApiClient::new(&self.config.base_url)?)
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<u8> {
    let config_path = match cli.config {
        Some(path) => path,
        None => config::default_config_path()?,
    };
    let mut config = CliConfig::load(&config_path);
    if let Some(server) = cli.server {
        config.base_url = server;
    }
    tracing::debug!(base_url = %config.base_url, path = %config_path.display(), "configuration loaded");

    let ctx = Context {
        config,
        config_path,
        session: Arc::new(SessionStore::open_default()?),
    };

    match cli.command {
        Command::Upload(args) => transfer::upload(&ctx, args).await,
        Command::Download(args) => transfer::download(&ctx, args).await,
        Command::Fetch(args) => transfer::fetch(&ctx, args).await,
        Command::Groups { group } => browse::groups(&ctx, group).await,
        Command::Videos(args) => browse::videos(&ctx, args).await,
        Command::Login { token, username } => account::login(&ctx, &token, username.as_deref()),
        Command::Logout => account::logout(&ctx),
        Command::Config(args) => settings::config(&ctx, args),
    }
}
