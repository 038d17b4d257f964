use anyhow::{Context, Result};
use bcrypt::{hash, verify, DEFAULT_COST};

/// Hashes a password on the blocking pool; bcrypt is CPU-bound.
pub async fn hash_password(password: String) -> Result<String> {
    hash_password_with_cost(password, DEFAULT_COST).await
}

pub async fn hash_password_with_cost(password: String, cost: u32) -> Result<String> {
    tokio::task::spawn_blocking(move || hash(password, cost))
        .await
        .context("password hashing task panicked")?
        .context("failed to hash password")
}

/// Returns false for a wrong password and for a malformed stored hash.
pub async fn verify_password(password: String, password_hash: String) -> Result<bool> {
    let ok = tokio::task::spawn_blocking(move || verify(password, &password_hash).unwrap_or(false))
        .await
        .context("password verification task panicked")?;
    Ok(ok)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hash_then_verify() {
        let hashed = hash_password_with_cost("hunter2".to_string(), 4)
            .await
            .unwrap();
        assert_ne!(hashed, "hunter2");
        assert!(verify_password("hunter2".to_string(), hashed.clone())
            .await
            .unwrap());
        assert!(!verify_password("hunter3".to_string(), hashed).await.unwrap());
    }

    #[tokio::test]
    async fn test_malformed_hash_is_mismatch() {
        assert!(!verify_password("x".to_string(), "not-a-hash".to_string())
            .await
            .unwrap());
    }
}
