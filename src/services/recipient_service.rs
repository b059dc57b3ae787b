use std::sync::Arc;

use crate::db::entity::recipient;
use crate::db::{ RecipientPatch, ShardManager };
use crate::error::{ AppError, Result };

/// Outcome of resolving a spoken recipient name against a user's saved list.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolveOutcome {
    /// Exactly one recipient whose name matches the query verbatim.
    Exact(recipient::Model),
    /// No exact match, but exactly one recipient whose name contains the query.
    PartialUnique(recipient::Model),
    /// Two or more candidates in the winning match class.
    Ambiguous(Vec<recipient::Model>),
    NotFound,
}

pub struct RecipientService {
    shards: Arc<ShardManager>,
}

impl RecipientService {
    pub fn new(shards: Arc<ShardManager>) -> Self {
        Self { shards }
    }

    pub async fn list(&self, user_address: &str) -> Result<Vec<recipient::Model>> {
        self.shards.shard(user_address).await.list_recipients().await
    }

    pub async fn add(
        &self,
        user_address: &str,
        name: String,
        wallet: String,
        note: Option<String>
    ) -> Result<recipient::Model> {
        if name.trim().is_empty() {
            return Err(AppError::Validation("recipient name must not be empty".to_string()));
        }
        validate_wallet(&wallet)?;

        self.shards.shard(user_address).await.add_recipient(name, wallet, note).await
    }

    pub async fn update(
        &self,
        user_address: &str,
        old_wallet: &str,
        patch: RecipientPatch
    ) -> Result<recipient::Model> {
        if let Some(wallet) = patch.wallet.as_deref() {
            validate_wallet(wallet)?;
        }
        if let Some(name) = patch.name.as_deref() {
            if name.trim().is_empty() {
                return Err(AppError::Validation("recipient name must not be empty".to_string()));
            }
        }

        self.shards.shard(user_address).await.update_recipient(old_wallet, patch).await
    }

    pub async fn delete(&self, user_address: &str, wallet: &str) -> Result<()> {
        self.shards.shard(user_address).await.delete_recipient(wallet).await
    }

    /// Resolve a spoken name to a saved recipient. Exact name matches win
    /// over substring matches; ambiguity within the winning class is
    /// reported with the candidates so the caller can ask the user.
    pub async fn resolve_by_name(&self, user_address: &str, query: &str) -> Result<ResolveOutcome> {
        let recipients = self.shards.shard(user_address).await.list_recipients().await?;
        Ok(resolve_recipient(&recipients, query))
    }
}

/// Case-insensitive two-tier match: exact name first, then substring.
pub fn resolve_recipient(recipients: &[recipient::Model], query: &str) -> ResolveOutcome {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return ResolveOutcome::NotFound;
    }

    let exact: Vec<&recipient::Model> = recipients
        .iter()
        .filter(|r| r.name.to_lowercase() == query)
        .collect();

    match exact.len() {
        1 => {
            return ResolveOutcome::Exact(exact[0].clone());
        }
        n if n >= 2 => {
            return ResolveOutcome::Ambiguous(exact.into_iter().cloned().collect());
        }
        _ => {}
    }

    let partial: Vec<&recipient::Model> = recipients
        .iter()
        .filter(|r| r.name.to_lowercase().contains(&query))
        .collect();

    match partial.len() {
        0 => ResolveOutcome::NotFound,
        1 => ResolveOutcome::PartialUnique(partial[0].clone()),
        _ => ResolveOutcome::Ambiguous(partial.into_iter().cloned().collect()),
    }
}

/// A wallet must be a 20-byte hex address with 0x prefix.
pub fn validate_wallet(wallet: &str) -> Result<()> {
    let hex_part = wallet.strip_prefix("0x").unwrap_or("");
    if hex_part.len() != 40 || !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(AppError::Validation(format!("invalid wallet address: {}", wallet)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn recipient(name: &str, wallet: &str) -> recipient::Model {
        let now = Utc::now();
        recipient::Model {
            id: Uuid::new_v4(),
            user_address: "0xuser".to_string(),
            name: name.to_string(),
            wallet: wallet.to_string(),
            note: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_exact_match_wins_over_partials() {
        let recipients = vec![
            recipient("alice", "0x0000000000000000000000000000000000000001"),
            recipient("alice smith", "0x0000000000000000000000000000000000000002"),
            recipient("alice jones", "0x0000000000000000000000000000000000000003")
        ];

        match resolve_recipient(&recipients, "Alice") {
            ResolveOutcome::Exact(found) => assert_eq!(found.name, "alice"),
            other => panic!("expected exact match, got {:?}", other),
        }
    }

    #[test]
    fn test_unique_partial_match() {
        let recipients = vec![
            recipient("Alice Smith", "0x0000000000000000000000000000000000000001"),
            recipient("Bob", "0x0000000000000000000000000000000000000002")
        ];

        match resolve_recipient(&recipients, "alice") {
            ResolveOutcome::PartialUnique(found) => assert_eq!(found.name, "Alice Smith"),
            other => panic!("expected partial match, got {:?}", other),
        }
    }

    #[test]
    fn test_ambiguous_exact_matches() {
        let recipients = vec![
            recipient("Sam", "0x0000000000000000000000000000000000000001"),
            recipient("sam", "0x0000000000000000000000000000000000000002")
        ];

        match resolve_recipient(&recipients, "sam") {
            ResolveOutcome::Ambiguous(options) => assert_eq!(options.len(), 2),
            other => panic!("expected ambiguity, got {:?}", other),
        }
    }

    #[test]
    fn test_ambiguous_partial_matches() {
        let recipients = vec![
            recipient("Sam Lee", "0x0000000000000000000000000000000000000001"),
            recipient("Samantha", "0x0000000000000000000000000000000000000002")
        ];

        match resolve_recipient(&recipients, "sam") {
            ResolveOutcome::Ambiguous(options) => assert_eq!(options.len(), 2),
            other => panic!("expected ambiguity, got {:?}", other),
        }
    }

    #[test]
    fn test_not_found() {
        let recipients = vec![recipient("Bob", "0x0000000000000000000000000000000000000001")];
        assert_eq!(resolve_recipient(&recipients, "carol"), ResolveOutcome::NotFound);
        assert_eq!(resolve_recipient(&recipients, "  "), ResolveOutcome::NotFound);
        assert_eq!(resolve_recipient(&[], "bob"), ResolveOutcome::NotFound);
    }

    #[test]
    fn test_validate_wallet() {
        validate_wallet("0x0000000000000000000000000000000000000001").unwrap();
        validate_wallet("0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48").unwrap();
        assert!(validate_wallet("0x1234").is_err());
        assert!(validate_wallet("1234567890123456789012345678901234567890").is_err());
        assert!(validate_wallet("0xzzzz0000000000000000000000000000000001zz").is_err());
        assert!(validate_wallet("").is_err());
    }
}
