// security/src/lib.rs
//
// Token handling and the request auth context. Password hashing itself
// lives on `models::User` (bcrypt); this crate covers everything between
// a verified credential and an authorized request.

pub mod middleware;

use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use models::{DomainError, DomainResult, Role, User};

/// Signing material plus the token lifetime, built once at startup from
/// config and shared through application state.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_secs: u64,
}

impl JwtKeys {
    pub fn new(secret: &[u8], ttl_hours: u64) -> Self {
        JwtKeys {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl_secs: ttl_hours * 3600,
        }
    }
}

/// JWT claims: user id, role, and the time bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: Role,
    pub iat: u64,
    pub exp: u64,
}

/// The one explicit auth value threaded through request handling, inserted
/// into request extensions by the bearer middleware.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: String,
    pub role: Role,
}

impl From<Claims> for AuthContext {
    fn from(claims: Claims) -> Self {
        AuthContext {
            user_id: claims.sub,
            role: claims.role,
        }
    }
}

fn unix_now() -> DomainResult<u64> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|e| DomainError::Internal(format!("system time error: {}", e)))
}

/// Issues a signed, time-bounded bearer token for the user.
pub fn issue_token(keys: &JwtKeys, user: &User) -> DomainResult<String> {
    let now = unix_now()?;
    let claims = Claims {
        sub: user.id.clone(),
        role: user.role(),
        iat: now,
        exp: now + keys.ttl_secs,
    };
    encode(&Header::default(), &claims, &keys.encoding)
        .map_err(|e| DomainError::Internal(format!("failed to encode token: {}", e)))
}

/// Decodes and validates a bearer token. Missing, malformed, expired and
/// badly signed tokens all surface as the same `Unauthenticated` error so
/// callers cannot distinguish why a token was refused.
pub fn validate_token(keys: &JwtKeys, token: &str) -> DomainResult<Claims> {
    decode::<Claims>(token, &keys.decoding, &Validation::default())
        .map(|data| data.claims)
        .map_err(|_| DomainError::Unauthenticated("invalid or expired token".to_string()))
}

/// Allow-list role check for gated handlers.
pub fn require_role(ctx: &AuthContext, allowed: &[Role]) -> DomainResult<()> {
    if allowed.contains(&ctx.role) {
        Ok(())
    } else {
        Err(DomainError::PermissionDenied(format!(
            "role {} may not perform this operation",
            ctx.role
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::{NewUser, Role};

    fn keys() -> JwtKeys {
        JwtKeys::new(b"test-secret-test-secret-test-secret!", 24)
    }

    fn admin() -> User {
        User::from_new(NewUser {
            username: "root".to_string(),
            email: "root@limousine.test".to_string(),
            password: "pw".to_string(),
            gender: String::new(),
            role: Role::Admin,
            driver_id: None,
            subdriver_id: None,
            vehicle_number: None,
            school_id: None,
            greeter_id: None,
        })
        .unwrap()
    }

    #[test]
    fn token_round_trips_id_and_role() {
        let keys = keys();
        let user = admin();
        let token = issue_token(&keys, &user).unwrap();
        let claims = validate_token(&keys, &token).unwrap();
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.role, Role::Admin);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn wrong_secret_is_unauthenticated() {
        let user = admin();
        let token = issue_token(&keys(), &user).unwrap();
        let other = JwtKeys::new(b"another-secret-another-secret-pad!!!", 24);
        assert!(matches!(
            validate_token(&other, &token).unwrap_err(),
            DomainError::Unauthenticated(_)
        ));
    }

    #[test]
    fn expired_token_is_unauthenticated() {
        let keys = keys();
        let now = unix_now().unwrap();
        let stale = Claims {
            sub: "u-1".to_string(),
            role: Role::Driver,
            iat: now - 7200,
            exp: now - 3600, // well past the default leeway
        };
        let token = encode(&Header::default(), &stale, &keys.encoding).unwrap();
        assert!(matches!(
            validate_token(&keys, &token).unwrap_err(),
            DomainError::Unauthenticated(_)
        ));
    }

    #[test]
    fn garbage_token_is_unauthenticated() {
        assert!(matches!(
            validate_token(&keys(), "not.a.token").unwrap_err(),
            DomainError::Unauthenticated(_)
        ));
    }

    #[test]
    fn role_allow_list_is_enforced() {
        let ctx = AuthContext {
            user_id: "u-1".to_string(),
            role: Role::Driver,
        };
        assert!(require_role(&ctx, &[Role::Driver, Role::Admin]).is_ok());
        assert!(matches!(
            require_role(&ctx, &[Role::Admin]).unwrap_err(),
            DomainError::PermissionDenied(_)
        ));
    }
}
