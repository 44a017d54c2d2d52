//! Compact HMAC-signed bearer tokens.
//!
//! Wire format: `base64url(claims JSON) "." base64url(HMAC-SHA256)`, both
//! segments unpadded. The MAC covers the payload segment exactly as
//! transmitted. Tokens are never stored server-side; validity is bounded
//! only by the fixed lifetime of their type.

use altar_core::models::identity::{Identity, Role};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use uuid::Uuid;

use crate::error::AuthError;

type HmacSha256 = Hmac<Sha256>;

/// Access token lifetime: 15 minutes.
pub const ACCESS_TOKEN_TTL_MS: i64 = 15 * 60 * 1000;
/// Refresh token lifetime: 7 days.
pub const REFRESH_TOKEN_TTL_MS: i64 = 7 * 24 * 60 * 60 * 1000;

const SEPARATOR: char = '.';

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    #[default]
    Access,
    Refresh,
}

impl TokenType {
    pub fn ttl_ms(self) -> i64 {
        match self {
            Self::Access => ACCESS_TOKEN_TTL_MS,
            Self::Refresh => REFRESH_TOKEN_TTL_MS,
        }
    }

    pub fn ttl_secs(self) -> u64 {
        self.ttl_ms().unsigned_abs() / 1000
    }
}

/// Signed token payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "WireClaims")]
pub struct Claims {
    /// Normalized username.
    #[serde(rename = "username")]
    pub subject: String,
    pub role: Role,
    /// Epoch milliseconds.
    pub issued_at: i64,
    pub token_type: TokenType,
    /// Membership at issue time. Informational for clients only; access
    /// checks always use the live membership.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wedding_ids: Option<Vec<Uuid>>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub must_change_password: bool,
}

impl Claims {
    pub fn new(subject: impl Into<String>, role: Role, token_type: TokenType) -> Self {
        Self {
            subject: subject.into(),
            role,
            issued_at: Utc::now().timestamp_millis(),
            token_type,
            wedding_ids: None,
            must_change_password: false,
        }
    }

    pub fn identity(&self) -> Identity {
        Identity::new(self.subject.clone(), self.role)
    }
}

/// Decoding shape that also accepts payloads minted before `role`,
/// `tokenType` and the `username` rename existed.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireClaims {
    #[serde(alias = "subject")]
    username: String,
    role: Option<Role>,
    #[serde(default)]
    is_master: bool,
    issued_at: i64,
    token_type: Option<TokenType>,
    wedding_ids: Option<Vec<Uuid>>,
    #[serde(default)]
    must_change_password: bool,
}

impl From<WireClaims> for Claims {
    fn from(wire: WireClaims) -> Self {
        let role = wire.role.unwrap_or(if wire.is_master {
            Role::Master
        } else {
            Role::Legacy
        });
        Self {
            subject: wire.username,
            role,
            issued_at: wire.issued_at,
            token_type: wire.token_type.unwrap_or_default(),
            wedding_ids: wire.wedding_ids,
            must_change_password: wire.must_change_password,
        }
    }
}

/// Signs and verifies bearer tokens with a server-held secret.
#[derive(Clone)]
pub struct TokenCodec {
    key: Vec<u8>,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec").finish_non_exhaustive()
    }
}

impl TokenCodec {
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self, AuthError> {
        let key = secret.as_ref().to_vec();
        if key.is_empty() {
            return Err(AuthError::Crypto("token secret must not be empty".into()));
        }
        Ok(Self { key })
    }

    fn mac(&self) -> Result<HmacSha256, AuthError> {
        HmacSha256::new_from_slice(&self.key)
            .map_err(|e| AuthError::Crypto(format!("HMAC initialization failed: {e}")))
    }

    /// Serialize and sign `claims`. Deterministic for identical input.
    pub fn sign(&self, claims: &Claims) -> Result<String, AuthError> {
        let json = serde_json::to_vec(claims)
            .map_err(|e| AuthError::Crypto(format!("claims encode: {e}")))?;
        let payload = URL_SAFE_NO_PAD.encode(json);

        let mut mac = self.mac()?;
        mac.update(payload.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        Ok(format!("{payload}{SEPARATOR}{signature}"))
    }

    /// Verify a token against the current wall clock.
    pub fn verify(&self, token: &str, expected: TokenType) -> Result<Claims, AuthError> {
        self.verify_at(token, expected, Utc::now().timestamp_millis())
    }

    /// Verify a token as of `now_ms` (epoch milliseconds).
    ///
    /// Checks run in order: shape, signature, payload decoding, token
    /// type, expiry.
    pub fn verify_at(
        &self,
        token: &str,
        expected: TokenType,
        now_ms: i64,
    ) -> Result<Claims, AuthError> {
        let mut parts = token.split(SEPARATOR);
        let (Some(payload), Some(signature), None) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(AuthError::MalformedToken);
        };
        if payload.is_empty() || signature.is_empty() {
            return Err(AuthError::MalformedToken);
        }

        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| AuthError::InvalidSignature)?;
        let mut mac = self.mac()?;
        mac.update(payload.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| AuthError::InvalidSignature)?;

        let json = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| AuthError::MalformedToken)?;
        let claims: Claims =
            serde_json::from_slice(&json).map_err(|_| AuthError::MalformedToken)?;

        if claims.token_type != expected {
            return Err(AuthError::WrongTokenType);
        }
        if now_ms.saturating_sub(claims.issued_at) > expected.ttl_ms() {
            return Err(AuthError::TokenExpired);
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALPHABET: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

    fn codec() -> TokenCodec {
        TokenCodec::new("test-signing-secret").unwrap()
    }

    fn staff_claims(token_type: TokenType) -> Claims {
        let mut claims = Claims::new("planner", Role::WeddingStaff, token_type);
        claims.wedding_ids = Some(vec![Uuid::new_v4(), Uuid::new_v4()]);
        claims
    }

    fn replace_char(token: &str, index: usize) -> String {
        let mut chars: Vec<char> = token.chars().collect();
        let original = chars[index];
        chars[index] = ALPHABET.chars().find(|c| *c != original).unwrap();
        chars.into_iter().collect()
    }

    #[test]
    fn round_trip_preserves_claims() {
        let codec = codec();
        for claims in [
            Claims::new("master", Role::Master, TokenType::Access),
            Claims::new("alice", Role::Super, TokenType::Refresh),
            staff_claims(TokenType::Access),
        ] {
            let token = codec.sign(&claims).unwrap();
            let decoded = codec.verify(&token, claims.token_type).unwrap();
            assert_eq!(decoded, claims);
        }
    }

    #[test]
    fn signing_is_deterministic() {
        let claims = staff_claims(TokenType::Access);
        assert_eq!(codec().sign(&claims).unwrap(), codec().sign(&claims).unwrap());
    }

    #[test]
    fn tampering_with_either_segment_is_detected() {
        let codec = codec();
        let token = codec.sign(&staff_claims(TokenType::Access)).unwrap();
        for index in 0..token.len() {
            if token.as_bytes()[index] == b'.' {
                continue;
            }
            let tampered = replace_char(&token, index);
            assert_eq!(
                codec.verify(&tampered, TokenType::Access),
                Err(AuthError::InvalidSignature),
                "position {index} not detected"
            );
        }
    }

    #[test]
    fn forged_payload_is_rejected() {
        let codec = codec();
        let token = codec
            .sign(&Claims::new("couple", Role::WeddingClient, TokenType::Access))
            .unwrap();
        let signature = token.split('.').nth(1).unwrap();
        let forged = URL_SAFE_NO_PAD.encode(
            serde_json::to_vec(&Claims::new("couple", Role::Master, TokenType::Access)).unwrap(),
        );
        assert_eq!(
            codec.verify(&format!("{forged}.{signature}"), TokenType::Access),
            Err(AuthError::InvalidSignature)
        );
    }

    #[test]
    fn other_secret_is_rejected() {
        let token = codec()
            .sign(&Claims::new("alice", Role::Super, TokenType::Access))
            .unwrap();
        let other = TokenCodec::new("another-secret").unwrap();
        assert_eq!(
            other.verify(&token, TokenType::Access),
            Err(AuthError::InvalidSignature)
        );
    }

    #[test]
    fn expiry_boundary_is_exclusive() {
        let codec = codec();
        let now = Utc::now().timestamp_millis();
        for token_type in [TokenType::Access, TokenType::Refresh] {
            let mut claims = Claims::new("alice", Role::Super, token_type);

            claims.issued_at = now - (token_type.ttl_ms() + 1);
            let token = codec.sign(&claims).unwrap();
            assert_eq!(
                codec.verify_at(&token, token_type, now),
                Err(AuthError::TokenExpired)
            );

            claims.issued_at = now - (token_type.ttl_ms() - 1);
            let token = codec.sign(&claims).unwrap();
            assert!(codec.verify_at(&token, token_type, now).is_ok());
        }
    }

    #[test]
    fn token_types_are_not_interchangeable() {
        let codec = codec();
        let access = codec
            .sign(&Claims::new("alice", Role::Super, TokenType::Access))
            .unwrap();
        let refresh = codec
            .sign(&Claims::new("alice", Role::Super, TokenType::Refresh))
            .unwrap();
        assert_eq!(
            codec.verify(&access, TokenType::Refresh),
            Err(AuthError::WrongTokenType)
        );
        assert_eq!(
            codec.verify(&refresh, TokenType::Access),
            Err(AuthError::WrongTokenType)
        );
    }

    #[test]
    fn separator_count_must_be_exactly_one() {
        let codec = codec();
        let token = codec
            .sign(&Claims::new("alice", Role::Super, TokenType::Access))
            .unwrap();
        let extra = format!("{token}.extra");
        for malformed in [
            "",
            "no-separator",
            ".",
            "payload.",
            ".signature",
            extra.as_str(),
        ] {
            assert_eq!(
                codec.verify(malformed, TokenType::Access),
                Err(AuthError::MalformedToken),
                "{malformed:?}"
            );
        }
    }

    #[test]
    fn legacy_payload_without_type_decodes_as_access() {
        let codec = codec();
        let now = Utc::now().timestamp_millis();
        let payload = URL_SAFE_NO_PAD.encode(
            serde_json::json!({ "username": "master", "isMaster": true, "issuedAt": now })
                .to_string(),
        );
        let mut mac = codec.mac().unwrap();
        mac.update(payload.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        let claims = codec
            .verify(&format!("{payload}.{signature}"), TokenType::Access)
            .unwrap();
        assert_eq!(claims.role, Role::Master);
        assert_eq!(claims.token_type, TokenType::Access);
        assert_eq!(claims.subject, "master");
    }

    #[test]
    fn access_lifetime_is_fifteen_minutes() {
        assert_eq!(TokenType::Access.ttl_secs(), 900);
        assert_eq!(TokenType::Refresh.ttl_secs(), 604_800);
    }

    #[test]
    fn empty_secret_is_rejected() {
        assert!(matches!(TokenCodec::new(""), Err(AuthError::Crypto(_))));
    }
}
