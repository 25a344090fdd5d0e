//! bcrypt password hashing. Runs on the blocking pool; hashing at cost 12 takes a few hundred ms.

use crate::error::AppError;

pub async fn hash(plain: &str, cost: u32) -> Result<String, AppError> {
    let plain = plain.to_owned();
    tokio::task::spawn_blocking(move || bcrypt::hash(plain, cost))
        .await
        .map_err(|e| AppError::Internal(format!("hash task: {}", e)))?
        .map_err(|e| AppError::Internal(format!("bcrypt: {}", e)))
}

/// False for a wrong password and for a malformed stored hash.
pub async fn verify(plain: &str, hashed: &str) -> Result<bool, AppError> {
    let plain = plain.to_owned();
    let hashed = hashed.to_owned();
    let outcome = tokio::task::spawn_blocking(move || bcrypt::verify(plain, &hashed))
        .await
        .map_err(|e| AppError::Internal(format!("verify task: {}", e)))?;
    match outcome {
        Ok(matches) => Ok(matches),
        Err(e) => {
            tracing::warn!(error = %e, "stored password hash is not valid bcrypt");
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hash_then_verify() {
        let hashed = hash("123456", 4).await.unwrap();
        assert!(hashed.starts_with("$2"));
        assert!(verify("123456", &hashed).await.unwrap());
        assert!(!verify("654321", &hashed).await.unwrap());
    }

    #[tokio::test]
    async fn garbage_hash_does_not_match() {
        assert!(!verify("123456", "not-a-hash").await.unwrap());
    }
}
