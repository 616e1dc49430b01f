//! Secondary user indexes used by the audience filter's broadcast paths and
//! rebuildable by the reconciler (spec.md §4.5, SPEC_FULL.md §4.9.2):
//! `non_registered:users`, `province:<P>:users`, `city:<C>:users`.

use std::sync::Arc;

use prowhey_core::UserPayload;

use crate::error::StoreResult;
use crate::kv::KvStreamStore;

const NON_REGISTERED_KEY: &str = "non_registered:users";

pub struct SecondaryIndexes {
    store: Arc<dyn KvStreamStore>,
}

impl SecondaryIndexes {
    pub fn new(store: Arc<dyn KvStreamStore>) -> Self {
        Self { store }
    }

    fn province_key(province: &str) -> String {
        format!("province:{province}:users")
    }

    fn city_key(city: &str) -> String {
        format!("city:{city}:users")
    }

    /// Reconcile one user's index membership after a write to their profile.
    /// `previous` is the prior payload, if any, so stale memberships (e.g.
    /// a province change) are removed rather than merely added to.
    pub async fn update(
        &self,
        user_id: &str,
        previous: Option<&UserPayload>,
        current: Option<&UserPayload>,
    ) -> StoreResult<()> {
        if let Some(prev) = previous {
            if !prev.is_registered {
                self.store.srem(NON_REGISTERED_KEY, user_id).await?;
            }
            if let Some(province) = &prev.province {
                self.store.srem(&Self::province_key(province), user_id).await?;
            }
            if let Some(city) = &prev.city {
                self.store.srem(&Self::city_key(city), user_id).await?;
            }
        }
        if let Some(cur) = current {
            if !cur.is_registered {
                self.store.sadd(NON_REGISTERED_KEY, user_id).await?;
            }
            if let Some(province) = &cur.province {
                self.store.sadd(&Self::province_key(province), user_id).await?;
            }
            if let Some(city) = &cur.city {
                self.store.sadd(&Self::city_key(city), user_id).await?;
            }
        }
        Ok(())
    }

    pub async fn non_registered_users(&self) -> StoreResult<Vec<String>> {
        self.store.smembers(NON_REGISTERED_KEY).await
    }

    pub async fn province_users(&self, province: &str) -> StoreResult<Vec<String>> {
        self.store.smembers(&Self::province_key(province)).await
    }

    pub async fn city_users(&self, city: &str) -> StoreResult<Vec<String>> {
        self.store.smembers(&Self::city_key(city)).await
    }

    /// Drop every index entry and rebuild from the given `(user_id,
    /// payload)` pairs — the reconciler's full-rebuild path.
    pub async fn rebuild(&self, users: &[(String, UserPayload)]) -> StoreResult<()> {
        for key in self.store.scan_keys("province:*:users").await? {
            for member in self.store.smembers(&key).await? {
                self.store.srem(&key, &member).await?;
            }
        }
        for key in self.store.scan_keys("city:*:users").await? {
            for member in self.store.smembers(&key).await? {
                self.store.srem(&key, &member).await?;
            }
        }
        for member in self.store.smembers(NON_REGISTERED_KEY).await? {
            self.store.srem(NON_REGISTERED_KEY, &member).await?;
        }
        for (user_id, payload) in users {
            self.update(user_id, None, Some(payload)).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_store::InMemoryStore;

    fn user(province: &str, city: &str, registered: bool) -> UserPayload {
        UserPayload {
            display_name: "x".into(),
            groups: vec![],
            region: None,
            province: Some(province.into()),
            city: Some(city.into()),
            is_registered: registered,
        }
    }

    #[tokio::test]
    async fn add_then_query_by_province() {
        let idx = SecondaryIndexes::new(Arc::new(InMemoryStore::new()));
        idx.update("u-1", None, Some(&user("Riyadh", "Riyadh", true))).await.unwrap();
        let members = idx.province_users("Riyadh").await.unwrap();
        assert_eq!(members, vec!["u-1".to_string()]);
    }

    #[tokio::test]
    async fn moving_province_removes_stale_membership() {
        let idx = SecondaryIndexes::new(Arc::new(InMemoryStore::new()));
        let before = user("Riyadh", "Riyadh", true);
        idx.update("u-1", None, Some(&before)).await.unwrap();
        let after = user("Makkah", "Jeddah", true);
        idx.update("u-1", Some(&before), Some(&after)).await.unwrap();
        assert!(idx.province_users("Riyadh").await.unwrap().is_empty());
        assert_eq!(idx.province_users("Makkah").await.unwrap(), vec!["u-1".to_string()]);
    }

    #[tokio::test]
    async fn non_registered_users_are_indexed() {
        let idx = SecondaryIndexes::new(Arc::new(InMemoryStore::new()));
        idx.update("guest-1", None, Some(&user("Riyadh", "Riyadh", false))).await.unwrap();
        assert_eq!(idx.non_registered_users().await.unwrap(), vec!["guest-1".to_string()]);
    }
}
