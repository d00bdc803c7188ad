//! Session commands.

use super::Context;

pub fn login(ctx: &Context, token: &str, username: Option<&str>) -> anyhow::Result<u8> {
    let token = token.trim();
    anyhow::ensure!(!token.is_empty(), "token must not be empty");

    ctx.session.save(token, username)?;
    match username {
        Some(name) => println!("logged in as {name}"),
        None => println!("token stored"),
    }
    if ctx.session.token_from_env() {
        tracing::warn!(
            "{} is set and takes precedence over the stored token",
            motionlab_api::TOKEN_ENV
        );
    }
    Ok(0)
}

pub fn logout(ctx: &Context) -> anyhow::Result<u8> {
    ctx.session.clear()?;
    println!("logged out");
    Ok(0)
}
