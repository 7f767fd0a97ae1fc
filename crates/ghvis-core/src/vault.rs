//! Multi-tenant credential vault.
//!
//! The vault is the only component that mutates credential records. It
//! encrypts secrets before they reach the store and decrypts them only when a
//! caller asks for a specific credential.

use chrono::Utc;
use tracing::{debug, info, instrument, warn};

use crate::Result;
use crate::cipher::Cipher;
use crate::records::{Credential, CredentialInfo, StoredCredential};
use crate::secret::BearerToken;
use crate::traits::CredentialStore;
use crate::types::{CredentialName, TenantId};

/// Named, encrypted credentials per tenant with one active selection.
///
/// # Invariants
///
/// - At most one credential per tenant is active at any observation point.
/// - Secrets are stored only as ciphertext.
/// - Listing never decrypts.
#[derive(Debug, Clone)]
pub struct Vault<S> {
    store: S,
    cipher: Cipher,
}

impl<S: CredentialStore> Vault<S> {
    /// Create a vault over a store with the process-wide cipher.
    pub fn new(store: S, cipher: Cipher) -> Self {
        Self { store, cipher }
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Store a credential, replacing any with the same name.
    ///
    /// The record is inactive after this call, even if the name was active
    /// before. `created_at` is reset to now.
    #[instrument(skip(self, secret), fields(tenant = %tenant, name = %name))]
    pub async fn add_or_update(
        &self,
        tenant: TenantId,
        name: &CredentialName,
        secret: &BearerToken,
        principal: &str,
    ) -> Result<()> {
        let secret_ciphertext = self.cipher.encrypt(secret.expose())?;

        self.store
            .upsert_credential(StoredCredential {
                tenant,
                name: name.clone(),
                secret_ciphertext,
                remote_principal: principal.to_string(),
                is_active: false,
                created_at: Utc::now(),
            })
            .await?;

        info!(principal, "credential stored");
        Ok(())
    }

    /// Metadata of all the tenant's credentials, newest first.
    pub async fn list(&self, tenant: TenantId) -> Result<Vec<CredentialInfo>> {
        let rows = self.store.list_credentials(tenant).await?;
        Ok(rows.iter().map(StoredCredential::info).collect())
    }

    /// The tenant's active credential, decrypted.
    ///
    /// Returns `Ok(None)` when no credential is active.
    ///
    /// # Errors
    ///
    /// A stored secret that cannot be decrypted surfaces as
    /// [`Error::Decryption`](crate::Error::Decryption), never as `None`.
    #[instrument(skip(self), fields(tenant = %tenant))]
    pub async fn get_active(&self, tenant: TenantId) -> Result<Option<Credential>> {
        match self.store.find_active_credential(tenant).await? {
            Some(record) => self.decrypt(record).map(Some),
            None => {
                debug!("no active credential");
                Ok(None)
            }
        }
    }

    /// A credential by name, decrypted.
    pub async fn get(&self, tenant: TenantId, name: &CredentialName) -> Result<Option<Credential>> {
        match self.store.find_credential(tenant, name).await? {
            Some(record) => self.decrypt(record).map(Some),
            None => Ok(None),
        }
    }

    /// Make `name` the tenant's only active credential.
    ///
    /// Returns false if the name does not exist. In that case all of the
    /// tenant's credentials are left inactive.
    #[instrument(skip(self), fields(tenant = %tenant, name = %name))]
    pub async fn set_active(&self, tenant: TenantId, name: &CredentialName) -> Result<bool> {
        let activated = self.store.activate_exclusive(tenant, name).await?;
        if activated {
            info!("credential activated");
        } else {
            warn!("credential not found, no credential is active");
        }
        Ok(activated)
    }

    /// Delete a credential. Returns true if it existed.
    ///
    /// Removing the active credential leaves the tenant with none active.
    #[instrument(skip(self), fields(tenant = %tenant, name = %name))]
    pub async fn remove(&self, tenant: TenantId, name: &CredentialName) -> Result<bool> {
        let removed = self.store.delete_credential(tenant, name).await?;
        if removed {
            info!("credential removed");
        }
        Ok(removed)
    }

    fn decrypt(&self, record: StoredCredential) -> Result<Credential> {
        let plaintext = self.cipher.decrypt(&record.secret_ciphertext).map_err(|e| {
            warn!(tenant = %record.tenant, name = %record.name, error = %e, "stored credential unreadable");
            e
        })?;

        Ok(Credential {
            name: record.name,
            remote_principal: record.remote_principal,
            token: BearerToken::new(plaintext),
            is_active: record.is_active,
            created_at: record.created_at,
        })
    }
}
