use std::{env::var, str::FromStr as _, sync::Arc};

use eyre::{eyre, Context, Error};
use model::{
    ids::UserId,
    rights::{Actor, Role},
};
use url::Url;

const DEFAULT_RUST_LOG: &str = "info";

#[derive(Clone)]
pub struct Env(Arc<EnvInner>);

#[derive(Clone)]
pub struct EnvInner {
    api_url: Url,
    api_token: Option<String>,
    rust_log: String,
    user_id: UserId,
    user_role: Role,
}

impl Env {
    pub fn api_url(&self) -> &Url {
        &self.0.api_url
    }

    pub fn api_token(&self) -> Option<&str> {
        self.0.api_token.as_deref()
    }

    pub fn rust_log(&self) -> &str {
        &self.0.rust_log
    }

    pub fn user_id(&self) -> UserId {
        self.0.user_id
    }

    pub fn user_role(&self) -> Role {
        self.0.user_role
    }

    /// The user the calendar acts for.
    pub fn actor(&self) -> Actor {
        Actor::new(self.0.user_id, self.0.user_role)
    }

    /// Reads the process environment. `.env` must already be applied.
    pub fn load() -> Result<Env, Error> {
        let api_url = var("API_URL").context("API_URL is not set")?;
        let user_id = var("USER_ID").context("USER_ID is not set")?;
        let user_role = var("USER_ROLE").context("USER_ROLE is not set")?;

        Ok(Env(Arc::new(EnvInner {
            api_url: Url::parse(&api_url).context("API_URL is not a valid url")?,
            api_token: var("API_TOKEN").ok().filter(|token| !token.is_empty()),
            rust_log: var("RUST_LOG").unwrap_or_else(|_| DEFAULT_RUST_LOG.to_owned()),
            user_id: UserId(
                user_id
                    .parse()
                    .with_context(|| format!("USER_ID is not a number: {}", user_id))?,
            ),
            user_role: Role::from_str(&user_role)
                .map_err(|_| eyre!("USER_ROLE is not a known role: {}", user_role))?,
        })))
    }
}
