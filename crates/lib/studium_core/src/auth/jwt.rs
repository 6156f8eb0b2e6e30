//! JWT token generation and verification.
//!
//! Both token kinds are HS256 JWTs carrying a fixed issuer and audience.
//! Access tokens embed the user identity; refresh tokens carry only the
//! user ID plus a `token_type` tag, and are additionally tracked
//! server-side (see [`super::session`]).

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};

use super::AuthError;
use crate::models::auth::{AccessClaims, RefreshClaims, TokenIdentity, User};

/// Issuer claim stamped into every token.
pub const ISSUER: &str = "studium";

/// Audience claim stamped into every token.
pub const AUDIENCE: &str = "studium-users";

/// Type tag carried by refresh tokens.
pub const REFRESH_TOKEN_TYPE: &str = "refresh";

/// Default access token lifetime: 15 minutes.
///
/// Must stay strictly shorter than [`DEFAULT_REFRESH_TOKEN_EXPIRY_DAYS`];
/// the rotation scheme assumes access tokens die first.
pub const DEFAULT_ACCESS_TOKEN_EXPIRY_SECS: i64 = 15 * 60;

/// Default refresh token lifetime: 7 days.
pub const DEFAULT_REFRESH_TOKEN_EXPIRY_DAYS: i64 = 7;

/// Generate a signed JWT access token (HS256).
pub fn generate_access_token(
    user: &User,
    secret: &[u8],
    expiry_secs: i64,
) -> Result<String, AuthError> {
    let now = Utc::now();
    let claims = AccessClaims {
        sub: user.id.clone(),
        email: user.email.clone(),
        name: user.name.clone(),
        iat: now.timestamp(),
        exp: (now + Duration::seconds(expiry_secs)).timestamp(),
        iss: ISSUER.to_string(),
        aud: AUDIENCE.to_string(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret),
    )
    .map_err(|e| AuthError::Internal(format!("jwt encode: {e}")))
}

/// Generate a signed JWT refresh token (HS256, `token_type = "refresh"`).
pub fn generate_refresh_token(
    user_id: &str,
    secret: &[u8],
    expiry_days: i64,
) -> Result<String, AuthError> {
    let now = Utc::now();
    let claims = RefreshClaims {
        sub: user_id.to_string(),
        token_type: REFRESH_TOKEN_TYPE.to_string(),
        iat: now.timestamp(),
        exp: (now + Duration::days(expiry_days)).timestamp(),
        iss: ISSUER.to_string(),
        aud: AUDIENCE.to_string(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret),
    )
    .map_err(|e| AuthError::Internal(format!("jwt encode: {e}")))
}

/// Validation rules shared by both token kinds.
fn validation() -> Validation {
    let mut v = Validation::default();
    v.validate_exp = true;
    v.set_issuer(&[ISSUER]);
    v.set_audience(&[AUDIENCE]);
    v
}

/// Verify an access token, returning the identity it proves.
///
/// Pure: no store access. Any failure (signature, expiry, issuer/audience)
/// maps to `InvalidToken`.
pub fn verify_access_token(token: &str, secret: &[u8]) -> Result<TokenIdentity, AuthError> {
    let key = DecodingKey::from_secret(secret);
    let data = decode::<AccessClaims>(token, &key, &validation())
        .map_err(|_| AuthError::InvalidToken)?;
    Ok(TokenIdentity {
        user_id: data.claims.sub,
        email: data.claims.email,
        name: data.claims.name,
    })
}

/// Verify a refresh token's signature and type tag.
///
/// This is only the tamper check; the persisted record decides whether the
/// token is still live.
pub fn verify_refresh_token(token: &str, secret: &[u8]) -> Result<RefreshClaims, AuthError> {
    let key = DecodingKey::from_secret(secret);
    let data = decode::<RefreshClaims>(token, &key, &validation())
        .map_err(|_| AuthError::InvalidToken)?;
    if data.claims.token_type != REFRESH_TOKEN_TYPE {
        return Err(AuthError::InvalidToken);
    }
    Ok(data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"unit-test-signing-secret";

    fn test_user() -> User {
        User {
            id: "11111111-1111-7111-8111-111111111111".into(),
            email: "ada@example.com".into(),
            name: Some("Ada".into()),
        }
    }

    #[test]
    fn access_token_round_trip() {
        let user = test_user();
        let token = generate_access_token(&user, SECRET, 900).unwrap();
        let identity = verify_access_token(&token, SECRET).unwrap();
        assert_eq!(identity.user_id, user.id);
        assert_eq!(identity.email, user.email);
        assert_eq!(identity.name, user.name);
    }

    #[test]
    fn access_token_rejects_wrong_secret() {
        let token = generate_access_token(&test_user(), SECRET, 900).unwrap();
        assert!(matches!(
            verify_access_token(&token, b"other-secret"),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn access_token_rejects_expiry() {
        // Well past the default 60s validation leeway.
        let token = generate_access_token(&test_user(), SECRET, -3600).unwrap();
        assert!(matches!(
            verify_access_token(&token, SECRET),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn access_token_rejects_tampering() {
        let token = generate_access_token(&test_user(), SECRET, 900).unwrap();
        let mut tampered = token.into_bytes();
        let last = tampered.len() - 1;
        tampered[last] = if tampered[last] == b'A' { b'B' } else { b'A' };
        let tampered = String::from_utf8(tampered).unwrap();
        assert!(matches!(
            verify_access_token(&tampered, SECRET),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn refresh_token_carries_type_tag() {
        let token = generate_refresh_token("user-1", SECRET, 7).unwrap();
        let claims = verify_refresh_token(&token, SECRET).unwrap();
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.token_type, REFRESH_TOKEN_TYPE);
    }

    #[test]
    fn access_token_is_not_a_refresh_token() {
        let token = generate_access_token(&test_user(), SECRET, 900).unwrap();
        assert!(matches!(
            verify_refresh_token(&token, SECRET),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn garbage_is_invalid_token() {
        assert!(matches!(
            verify_access_token("not-a-jwt", SECRET),
            Err(AuthError::InvalidToken)
        ));
    }
}
