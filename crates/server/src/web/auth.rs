use serde::{Deserialize, Serialize};

/// Claims of the bearer token identifying the caller.
///
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Caller login, used for node visibility.
    pub sub: String,
    pub exp: usize,
    pub iat: usize,
}

pub mod token {
    use super::Claims;
    use crate::config::TokenEnv;
    use chrono::{Duration, Utc};
    use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
    use secrecy::ExposeSecret;
    use vcloud_common::prelude::{AuthError, Error, Result};

    /// Issues a token for `login`, valid for the configured duration.
    ///
    pub fn create(login: &str, settings: &TokenEnv) -> Result<String> {
        let now = Utc::now();
        let expires_in = Duration::seconds(settings.duration_sec as i64);
        let claims = Claims {
            sub: login.to_owned(),
            exp: (now + expires_in).timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        let key = EncodingKey::from_secret(settings.secret.expose_secret().as_bytes());
        Ok(encode(&Header::default(), &claims, &key)?)
    }

    /// Validates a token and returns its claims.
    ///
    pub fn validate(token: &str, settings: &TokenEnv) -> Result<Claims> {
        let key = DecodingKey::from_secret(settings.secret.expose_secret().as_bytes());

        decode::<Claims>(token, &key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|_| Error::Auth(AuthError::Token))
    }

}
