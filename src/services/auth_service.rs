use std::str::FromStr;
use std::sync::Arc;

use chrono::Utc;
use ethers::types::Signature;
use jsonwebtoken::{ decode, encode, DecodingKey, EncodingKey, Header, Validation };
use rand::RngCore;
use serde::{ Deserialize, Serialize };

use crate::db::ShardManager;
use crate::error::{ AppError, Result };
use crate::services::recipient_service::validate_wallet;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    iat: i64,
    exp: i64,
}

/// Wallet-signature login: nonce issue, signature verify, bearer tokens.
pub struct AuthService {
    shards: Arc<ShardManager>,
    jwt_secret: String,
    jwt_ttl_seconds: i64,
}

impl AuthService {
    pub fn new(shards: Arc<ShardManager>, jwt_secret: String, jwt_ttl_seconds: i64) -> Self {
        Self {
            shards,
            jwt_secret,
            jwt_ttl_seconds,
        }
    }

    /// Issue a fresh login nonce for the address, overwriting any prior
    /// unconsumed one.
    pub async fn issue_nonce(&self, address: &str) -> Result<String> {
        validate_wallet(address)?;

        let mut bytes = [0u8; 16];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        let nonce = hex::encode(bytes);

        self.shards.shard(address).await.store_nonce(nonce.clone()).await?;
        Ok(nonce)
    }

    /// Verify a wallet signature over the canonical login message. The nonce
    /// is single-use: it is consumed on the first successful verify, so a
    /// replayed signature finds no nonce to check against.
    pub async fn verify(&self, address: &str, signature: &str) -> Result<String> {
        validate_wallet(address)?;
        let shard = self.shards.shard(address).await;

        let nonce = shard
            .current_nonce().await?
            .ok_or_else(|| AppError::Unauthorized("no login nonce issued".to_string()))?;

        let message = login_message(&nonce);
        let signer = recover_signer(&message, signature)?;

        if signer != shard.address() {
            return Err(AppError::Unauthorized("signature does not match address".to_string()));
        }

        shard.clear_nonce().await?;
        self.mint_token(shard.address())
    }

    fn mint_token(&self, address: &str) -> Result<String> {
        mint_token(&self.jwt_secret, self.jwt_ttl_seconds, address)
    }

    /// Check a bearer token and return the address it was minted for.
    pub fn verify_token(&self, token: &str) -> Result<String> {
        check_token(&self.jwt_secret, token)
    }
}

fn mint_token(secret: &str, ttl_seconds: i64, address: &str) -> Result<String> {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: address.to_string(),
        iat: now,
        exp: now + ttl_seconds,
    };

    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).map_err(|e|
        AppError::Internal(format!("failed to mint token: {}", e))
    )
}

fn check_token(secret: &str, token: &str) -> Result<String> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default()
    ).map_err(|_| AppError::Unauthorized("invalid or expired token".to_string()))?;

    Ok(data.claims.sub)
}

/// The exact message the wallet signs. Any deviation, including whitespace,
/// changes the recovered signer.
pub fn login_message(nonce: &str) -> String {
    format!(
        "Welcome to VoicePay!\n\n\
         To securely sign in, please confirm this message.\n\n\
         Security code: {}\n\n\
         This signature will not trigger any blockchain transaction or gas fee.",
        nonce
    )
}

/// Recover the lowercased signer address from an EIP-191 personal-sign
/// signature over `message`.
pub fn recover_signer(message: &str, signature: &str) -> Result<String> {
    let signature = Signature::from_str(signature.trim_start_matches("0x")).map_err(|_|
        AppError::Unauthorized("malformed signature".to_string())
    )?;

    let signer = signature
        .recover(message)
        .map_err(|_| AppError::Unauthorized("signature recovery failed".to_string()))?;

    Ok(format!("{:?}", signer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::signers::{ LocalWallet, Signer };

    #[test]
    fn test_login_message_embeds_nonce() {
        let message = login_message("deadbeef");
        assert!(message.starts_with("Welcome to VoicePay!"));
        assert!(message.contains("Security code: deadbeef"));
        assert!(message.ends_with("gas fee."));
    }

    #[tokio::test]
    async fn test_recover_signer_round_trip() {
        let wallet = LocalWallet::new(&mut rand::thread_rng());
        let message = login_message("abc123");

        let signature = wallet.sign_message(&message).await.unwrap();
        let recovered = recover_signer(&message, &signature.to_string()).unwrap();

        assert_eq!(recovered, format!("{:?}", wallet.address()));
    }

    #[tokio::test]
    async fn test_recover_rejects_wrong_message() {
        let wallet = LocalWallet::new(&mut rand::thread_rng());
        let signature = wallet.sign_message(login_message("first")).await.unwrap();

        let recovered = recover_signer(&login_message("second"), &signature.to_string()).unwrap();
        assert_ne!(recovered, format!("{:?}", wallet.address()));
    }

    #[test]
    fn test_recover_rejects_garbage() {
        assert!(recover_signer("message", "0x1234").is_err());
        assert!(recover_signer("message", "not a signature").is_err());
    }

    #[test]
    fn test_token_round_trip() {
        let secret = "test-secret-test-secret-test-secret!";
        let token = mint_token(secret, 3600, "0xabc").unwrap();

        assert_eq!(check_token(secret, &token).unwrap(), "0xabc");
        assert!(check_token("other-secret-other-secret-other!", &token).is_err());
        assert!(check_token(secret, "garbage.token.here").is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let secret = "test-secret-test-secret-test-secret!";
        let token = mint_token(secret, -120, "0xabc").unwrap();
        assert!(check_token(secret, &token).is_err());
    }
}
