//! `config` command.

use super::Context;
use crate::cli::ConfigArgs;
use crate::config::CliConfig;

pub fn config(ctx: &Context, args: ConfigArgs) -> anyhow::Result<u8> {
    // Start from the file, not from `ctx.config`, so `--server` is not persisted.
    let mut config = CliConfig::load(&ctx.config_path);
    if !args.is_empty() {
        apply(&mut config, args);
        config.save(&ctx.config_path)?;
    }
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(0)
}

fn apply(config: &mut CliConfig, args: ConfigArgs) {
    if let Some(url) = args.base_url {
        config.base_url = url;
    }
    if let Some(n) = args.batch_size {
        config.batch_size = n;
    }
    if let Some(n) = args.concurrency {
        config.max_concurrency = Some(n);
    }
    if let Some(hint) = args.network {
        config.network_hint = Some(hint);
    }
    if let Some(dir) = args.download_dir {
        config.download_dir = Some(dir);
    }
    if let Some(required) = args.upload_requires_auth {
        config.upload_requires_auth = required;
    }
}
