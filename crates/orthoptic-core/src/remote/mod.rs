pub mod docstore;
pub mod identity;
pub mod push;

pub use docstore::{DocStoreClient, UserDocument};
pub use identity::{humanize_provider_message, AuthTokens, IdentityClient, RefreshedTokens};
pub use push::PushClient;

use crate::error::CoreError;
use crate::storage::Database;

const DEVICE_TOKEN_KEY: &str = "device_token";

/// Return this install's push registration token, minting one on first
/// use. A real registration token is issued by the platform push service
/// once the mobile shell wires it in; until then a stable per-install id
/// stands in so the rest of the pipeline is exercised end to end.
pub fn device_token(db: &Database) -> Result<String, CoreError> {
    if let Some(token) = db.kv_get(DEVICE_TOKEN_KEY)? {
        return Ok(token);
    }
    let token = format!("device-{}", uuid::Uuid::new_v4());
    db.kv_set(DEVICE_TOKEN_KEY, &token)?;
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_token_is_stable_per_install() {
        let db = Database::open_memory().unwrap();
        let first = device_token(&db).unwrap();
        let second = device_token(&db).unwrap();
        assert_eq!(first, second);
        assert!(first.starts_with("device-"));
    }
}
