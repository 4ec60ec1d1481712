use anyhow::{Context, Result};
use keyring::Entry;

use super::Credential;

const SERVICE_NAME: &str = "amber-sync";

/// Keychain storage for credentials, one entry per profile name.
pub struct CredentialStore;

impl CredentialStore {
    /// Store a credential for a profile in the OS keychain
    pub fn store(profile: &str, credential: &Credential) -> Result<()> {
        let entry = Entry::new(SERVICE_NAME, profile)
            .context("Failed to create keyring entry")?;
        entry
            .set_password(credential.expose())
            .context("Failed to store credential in keychain")?;
        Ok(())
    }

    /// Retrieve the credential for a profile from the OS keychain
    pub fn get(profile: &str) -> Result<Credential> {
        let entry = Entry::new(SERVICE_NAME, profile)
            .context("Failed to create keyring entry")?;
        entry
            .get_password()
            .map(Credential::new)
            .context("Failed to retrieve credential from keychain")
    }

    /// Delete the stored credential for a profile
    pub fn delete(profile: &str) -> Result<()> {
        let entry = Entry::new(SERVICE_NAME, profile)
            .context("Failed to create keyring entry")?;
        entry
            .delete_credential()
            .context("Failed to delete credential from keychain")?;
        Ok(())
    }

    /// Check if a credential exists for a profile
    pub fn has_credential(profile: &str) -> bool {
        if let Ok(entry) = Entry::new(SERVICE_NAME, profile) {
            entry.get_password().is_ok()
        } else {
            false
        }
    }
}
