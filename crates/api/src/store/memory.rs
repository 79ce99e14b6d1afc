//! In-process credential store
//!
//! Backs the router in tests and local tooling. The uniqueness and
//! last-superadmin checks happen under the same write lock as the mutation,
//! so there is no check-then-act window.

use std::collections::HashMap;

use async_trait::async_trait;
use taptosmile_shared::{AdminAccount, AdminId, AdminPatch};
use tokio::sync::RwLock;

use super::{CredentialStore, StoreError};

#[derive(Default)]
pub struct InMemoryCredentialStore {
    accounts: RwLock<HashMap<AdminId, AdminAccount>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// `id` is the only active superadmin in `accounts`
fn is_last_superadmin(accounts: &HashMap<AdminId, AdminAccount>, id: AdminId) -> bool {
    let mut active = accounts.values().filter(|a| a.is_active_superadmin());
    matches!((active.next(), active.next()), (Some(only), None) if only.id == id)
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<AdminAccount>, StoreError> {
        let accounts = self.accounts.read().await;
        Ok(accounts.values().find(|a| a.email == email).cloned())
    }

    async fn find_by_id(&self, id: AdminId) -> Result<Option<AdminAccount>, StoreError> {
        Ok(self.accounts.read().await.get(&id).cloned())
    }

    async fn insert(&self, account: AdminAccount) -> Result<AdminId, StoreError> {
        let mut accounts = self.accounts.write().await;
        if accounts.values().any(|a| a.email == account.email) {
            return Err(StoreError::Duplicate);
        }
        let id = account.id;
        accounts.insert(id, account);
        Ok(id)
    }

    async fn update(
        &self,
        id: AdminId,
        patch: AdminPatch,
    ) -> Result<Option<AdminAccount>, StoreError> {
        let mut accounts = self.accounts.write().await;
        if let Some(email) = &patch.email {
            if accounts.values().any(|a| a.id != id && &a.email == email) {
                return Err(StoreError::Duplicate);
            }
        }
        if patch.demotes_superadmin() && is_last_superadmin(&accounts, id) {
            return Err(StoreError::LastSuperadmin);
        }
        Ok(accounts.get_mut(&id).map(|account| {
            patch.apply_to(account);
            account.clone()
        }))
    }

    async fn delete(&self, id: AdminId) -> Result<u64, StoreError> {
        let mut accounts = self.accounts.write().await;
        if is_last_superadmin(&accounts, id) {
            return Err(StoreError::LastSuperadmin);
        }
        Ok(accounts.remove(&id).map_or(0, |_| 1))
    }

    async fn list_all(&self) -> Result<Vec<AdminAccount>, StoreError> {
        let mut all: Vec<AdminAccount> = self.accounts.read().await.values().cloned().collect();
        all.sort_by_key(|a| a.created_at);
        Ok(all)
    }

    async fn count(&self) -> Result<u64, StoreError> {
        Ok(self.accounts.read().await.len() as u64)
    }

    async fn count_active_superadmins(&self) -> Result<u64, StoreError> {
        let accounts = self.accounts.read().await;
        Ok(accounts.values().filter(|a| a.is_active_superadmin()).count() as u64)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
