use crate::{
    api,
    cli::{actions::Action, globals::GlobalArgs},
};
use anyhow::Result;
use secrecy::SecretString;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub jwt_secret: SecretString,
    pub issuer: String,
    pub token_ttl_seconds: i64,
    pub frontend_url: String,
}

/// Handle the server action
///
/// # Errors
/// Returns an error if the store cannot be reached or the server fails to
/// start.
pub async fn handle(action: Action) -> Result<()> {
    match action {
        Action::Server(args) => {
            let globals = GlobalArgs::new(
                args.jwt_secret,
                args.issuer,
                args.token_ttl_seconds,
                args.frontend_url,
            );

            api::new(args.port, &args.dsn, &globals).await?;
        }
    }

    Ok(())
}
