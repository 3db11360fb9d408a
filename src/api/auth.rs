//! Webhook Authentication
//!
//! The platform signs every webhook call with an HS256 JWT whose single
//! audience is the bot id.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use uuid::Uuid;

use crate::bot::Bot;
use crate::error::WebhookError;

/// `aud` may be a single string or a list.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Audience {
    One(String),
    Many(Vec<String>),
}

#[derive(Debug, Deserialize)]
struct WebhookClaims {
    #[serde(default)]
    aud: Option<Audience>,
}

/// Checks a webhook bearer token against the bot id and secret.
pub fn validate_webhook_token(
    token: &str,
    bot_id: Uuid,
    secret_key: &str,
    leeway: Duration,
) -> Result<(), WebhookError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = leeway.as_secs();
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    let data = decode::<WebhookClaims>(
        token,
        &DecodingKey::from_secret(secret_key.as_bytes()),
        &validation,
    )
    .map_err(|e| WebhookError::Unauthorized(format!("invalid token: {}", e)))?;

    let audiences = match data.claims.aud {
        Some(Audience::One(aud)) => vec![aud],
        Some(Audience::Many(list)) => list,
        None => Vec::new(),
    };
    let [audience] = audiences.as_slice() else {
        return Err(WebhookError::Unauthorized(format!(
            "number of audiences is {}, expected 1",
            audiences.len()
        )));
    };

    let token_bot_id = Uuid::parse_str(audience).map_err(|_| {
        WebhookError::Unauthorized(format!("audience '{}' is not a bot id", audience))
    })?;
    if token_bot_id != bot_id {
        return Err(WebhookError::Unauthorized(format!(
            "token is issued for bot '{}', but '{}' expected",
            token_bot_id, bot_id
        )));
    }

    Ok(())
}

/// Middleware rejecting webhook calls without a valid bot JWT.
pub async fn require_bot_jwt(
    State(bot): State<Arc<Bot>>,
    request: Request,
    next: Next,
) -> Result<Response, WebhookError> {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .filter(|h| !h.is_empty())
        .ok_or_else(|| {
            WebhookError::Unauthorized("expected 'Authorization: Bearer ...' header".to_string())
        })?;

    let token = match auth_header.split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") => token.trim(),
        _ => {
            return Err(WebhookError::Unauthorized(
                "wrong Authorization header".to_string(),
            ))
        }
    };

    validate_webhook_token(token, bot.id(), bot.secret_key(), bot.jwt_leeway())?;

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;

    const SECRET: &str = "secret";

    fn sign(claims: serde_json::Value, alg: Algorithm, secret: &str) -> String {
        encode(
            &Header::new(alg),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn now() -> i64 {
        chrono::Utc::now().timestamp()
    }

    #[test]
    fn test_valid_token_with_string_audience() {
        let bot_id = Uuid::new_v4();
        let token = sign(
            json!({"aud": bot_id.to_string(), "exp": now() + 60}),
            Algorithm::HS256,
            SECRET,
        );
        assert!(validate_webhook_token(&token, bot_id, SECRET, Duration::ZERO).is_ok());
    }

    #[test]
    fn test_valid_token_with_list_audience_and_no_exp() {
        let bot_id = Uuid::new_v4();
        let token = sign(json!({"aud": [bot_id.to_string()]}), Algorithm::HS256, SECRET);
        assert!(validate_webhook_token(&token, bot_id, SECRET, Duration::ZERO).is_ok());
    }

    #[test]
    fn test_rejects_foreign_audience() {
        let token = sign(
            json!({"aud": Uuid::new_v4().to_string()}),
            Algorithm::HS256,
            SECRET,
        );
        let err = validate_webhook_token(&token, Uuid::new_v4(), SECRET, Duration::ZERO);
        assert!(matches!(err, Err(WebhookError::Unauthorized(_))));
    }

    #[test]
    fn test_rejects_several_audiences() {
        let bot_id = Uuid::new_v4();
        let token = sign(
            json!({"aud": [bot_id.to_string(), bot_id.to_string()]}),
            Algorithm::HS256,
            SECRET,
        );
        let err = validate_webhook_token(&token, bot_id, SECRET, Duration::ZERO).unwrap_err();
        assert!(err.to_string().contains("number of audiences is 2"));
    }

    #[test]
    fn test_rejects_missing_audience() {
        let token = sign(json!({"sub": "x"}), Algorithm::HS256, SECRET);
        assert!(validate_webhook_token(&token, Uuid::new_v4(), SECRET, Duration::ZERO).is_err());
    }

    #[test]
    fn test_rejects_wrong_secret_and_algorithm() {
        let bot_id = Uuid::new_v4();
        let claims = json!({"aud": bot_id.to_string()});

        let wrong_secret = sign(claims.clone(), Algorithm::HS256, "other");
        assert!(validate_webhook_token(&wrong_secret, bot_id, SECRET, Duration::ZERO).is_err());

        let wrong_alg = sign(claims, Algorithm::HS512, SECRET);
        assert!(validate_webhook_token(&wrong_alg, bot_id, SECRET, Duration::ZERO).is_err());
    }

    #[test]
    fn test_leeway_accepts_recently_expired_token() {
        let bot_id = Uuid::new_v4();
        let token = sign(
            json!({"aud": bot_id.to_string(), "exp": now() - 120}),
            Algorithm::HS256,
            SECRET,
        );

        assert!(validate_webhook_token(&token, bot_id, SECRET, Duration::ZERO).is_err());
        assert!(validate_webhook_token(&token, bot_id, SECRET, Duration::from_secs(300)).is_ok());
    }
}
