//! bcrypt 密码哈希实现。

use async_trait::async_trait;
use bcrypt::DEFAULT_COST;

use application::password::{PasswordHasher, PasswordHasherError};
use domain::value_objects::PasswordHash;

pub struct BcryptPasswordHasher {
    cost: u32,
}

impl Default for BcryptPasswordHasher {
    fn default() -> Self {
        Self { cost: DEFAULT_COST }
    }
}

impl BcryptPasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }
}

#[async_trait]
impl PasswordHasher for BcryptPasswordHasher {
    async fn hash(&self, plaintext: &str) -> Result<PasswordHash, PasswordHasherError> {
        let plaintext = plaintext.to_owned();
        let cost = self.cost;

        // bcrypt 是 CPU 密集操作，不能占用异步工作线程
        let hashed = tokio::task::spawn_blocking(move || bcrypt::hash(plaintext, cost))
            .await
            .map_err(|e| PasswordHasherError::hash_error(e.to_string()))?
            .map_err(|e| PasswordHasherError::hash_error(e.to_string()))?;

        PasswordHash::new(hashed).map_err(|e| PasswordHasherError::hash_error(e.to_string()))
    }

    async fn verify(
        &self,
        plaintext: &str,
        hashed: &PasswordHash,
    ) -> Result<bool, PasswordHasherError> {
        let plaintext = plaintext.to_owned();
        let hashed = hashed.as_str().to_owned();

        tokio::task::spawn_blocking(move || bcrypt::verify(plaintext, &hashed))
            .await
            .map_err(|e| PasswordHasherError::verify_error(e.to_string()))?
            .map_err(|e| PasswordHasherError::verify_error(e.to_string()))
    }
}
