//! # Identity Rotation Tables
//!
//! Account to auth key links and auth key membership rows. Each row is
//! upserted only by a strictly newer transaction version. Reverse lookups
//! go through index keys written alongside every applied row; the forward
//! row stays authoritative for the used flag.

use std::collections::BTreeSet;

use shared_types::Version;

use super::{LedgerService, Table, WriteSet};
use crate::domain::entities::{AccountAuthKeyLink, ApplyOutcome, AuthKeyPublicKeyLink};
use crate::domain::errors::LedgerError;
use crate::domain::identity::{AuthKeyEvent, IdentityEvent, PublicKeyMembership};
use crate::domain::keys::{display_key, index_components, KeyPrefix};
use crate::ports::inbound::IdentityRotationApi;
use crate::ports::outbound::{ChecksumProvider, KeyValueStore, RecordSerializer, TimeSource};

impl<KV, CS, TS, RS> LedgerService<KV, CS, TS, RS>
where
    KV: KeyValueStore,
    CS: ChecksumProvider,
    TS: TimeSource,
    RS: RecordSerializer,
{
    pub(crate) fn stage_identity_event(
        &self,
        event: &IdentityEvent,
        writes: &mut WriteSet,
    ) -> Result<ApplyOutcome, LedgerError> {
        match event {
            IdentityEvent::AuthKey(e) => self.stage_auth_key(e, writes),
            IdentityEvent::PublicKeyMembership(m) => self.stage_membership(m, writes),
        }
    }

    fn stage_auth_key(
        &self,
        event: &AuthKeyEvent,
        writes: &mut WriteSet,
    ) -> Result<ApplyOutcome, LedgerError> {
        let key = KeyPrefix::account_auth_key(&event.account_address, &event.auth_key)?;
        let index = KeyPrefix::auth_key_account_index(&event.auth_key, &event.account_address)?;

        if let Some(existing) = self.read_record::<AccountAuthKeyLink>(&key)? {
            if existing.last_transaction_version >= event.version {
                tracing::debug!(
                    account = %event.account_address,
                    auth_key = %event.auth_key,
                    version = event.version,
                    stored = existing.last_transaction_version,
                    "[ledger] Ignoring stale auth key link"
                );
                writes.stale(Table::AccountAuthKeyLink);
                return Ok(ApplyOutcome::Stale);
            }
        }

        let row = AccountAuthKeyLink {
            account_address: event.account_address.clone(),
            auth_key: event.auth_key.clone(),
            is_auth_key_used: event.is_auth_key_used,
            last_transaction_version: event.version,
        };
        writes.put(key, self.encode_record(&row)?);
        writes.put_index(index);
        writes.identity_written(Table::AccountAuthKeyLink);
        Ok(ApplyOutcome::Applied)
    }

    fn stage_membership(
        &self,
        membership: &PublicKeyMembership,
        writes: &mut WriteSet,
    ) -> Result<ApplyOutcome, LedgerError> {
        let key = KeyPrefix::auth_key_public_key(
            &membership.auth_key,
            &membership.public_key_type,
            &membership.public_key,
        )?;
        let index = KeyPrefix::public_key_index(
            &membership.public_key,
            &membership.public_key_type,
            &membership.auth_key,
        )?;

        if let Some(existing) = self.read_record::<AuthKeyPublicKeyLink>(&key)? {
            if existing.last_transaction_version >= membership.version {
                tracing::debug!(
                    auth_key = %membership.auth_key,
                    public_key = %membership.public_key,
                    version = membership.version,
                    stored = existing.last_transaction_version,
                    "[ledger] Ignoring stale key membership"
                );
                writes.stale(Table::AuthKeyPublicKeyLink);
                return Ok(ApplyOutcome::Stale);
            }
        }

        let row = AuthKeyPublicKeyLink {
            auth_key: membership.auth_key.clone(),
            public_key: membership.public_key.clone(),
            public_key_type: membership.public_key_type.clone(),
            account_public_key: membership.account_public_key.clone(),
            is_public_key_used: membership.is_public_key_used,
            signature_type: membership.signature_type.clone(),
            last_transaction_version: membership.version,
        };
        writes.put(key, self.encode_record(&row)?);
        writes.put_index(index);
        writes.identity_written(Table::AuthKeyPublicKeyLink);
        Ok(ApplyOutcome::Applied)
    }

    /// Components of every index key under `prefix`.
    fn scan_index(&self, prefix: &[u8]) -> Result<Vec<Vec<String>>, LedgerError> {
        let mut out = Vec::new();
        for (key, _) in self.kv_store.prefix_scan(prefix)? {
            match index_components(prefix, &key) {
                Some(parts) => out.push(parts),
                None => tracing::warn!(
                    key = %display_key(&key),
                    "[ledger] Skipping unreadable index key"
                ),
            }
        }
        Ok(out)
    }

    fn apply_single(&mut self, event: IdentityEvent) -> Result<ApplyOutcome, LedgerError> {
        self.ensure_chain_verified()?;

        let mut writes = WriteSet::new();
        let outcome = self.stage_identity_event(&event, &mut writes)?;
        self.commit(writes)?;
        Ok(outcome)
    }
}

impl<KV, CS, TS, RS> IdentityRotationApi for LedgerService<KV, CS, TS, RS>
where
    KV: KeyValueStore,
    CS: ChecksumProvider,
    TS: TimeSource,
    RS: RecordSerializer,
{
    fn apply_auth_key_event(
        &mut self,
        account_address: &str,
        auth_key: &str,
        now_used: bool,
        version: Version,
    ) -> Result<ApplyOutcome, LedgerError> {
        self.apply_single(
            AuthKeyEvent {
                account_address: account_address.to_string(),
                auth_key: auth_key.to_string(),
                is_auth_key_used: now_used,
                version,
            }
            .into(),
        )
    }

    fn apply_public_key_membership(
        &mut self,
        membership: PublicKeyMembership,
    ) -> Result<ApplyOutcome, LedgerError> {
        self.apply_single(membership.into())
    }

    fn current_auth_key(&self, account_address: &str) -> Result<Option<String>, LedgerError> {
        Ok(self
            .auth_key_links(account_address)?
            .into_iter()
            .filter(|link| link.is_auth_key_used)
            .max_by(|a, b| {
                (a.last_transaction_version, &a.auth_key)
                    .cmp(&(b.last_transaction_version, &b.auth_key))
            })
            .map(|link| link.auth_key))
    }

    fn current_signers(&self, auth_key: &str) -> Result<BTreeSet<String>, LedgerError> {
        Ok(self
            .key_set(auth_key)?
            .into_iter()
            .filter(|member| member.is_public_key_used)
            .map(|member| member.public_key)
            .collect())
    }

    fn key_set(&self, auth_key: &str) -> Result<Vec<AuthKeyPublicKeyLink>, LedgerError> {
        self.scan_records(&KeyPrefix::auth_key_members_prefix(auth_key)?)
    }

    fn auth_key_links(
        &self,
        account_address: &str,
    ) -> Result<Vec<AccountAuthKeyLink>, LedgerError> {
        self.scan_records(&KeyPrefix::account_links_prefix(account_address)?)
    }

    fn accounts_for_auth_key(&self, auth_key: &str) -> Result<BTreeSet<String>, LedgerError> {
        let mut accounts = BTreeSet::new();
        for parts in self.scan_index(&KeyPrefix::auth_key_accounts_prefix(auth_key)?)? {
            let [account] = parts.as_slice() else {
                continue;
            };
            let key = KeyPrefix::account_auth_key(account, auth_key)?;
            if let Some(link) = self.read_record::<AccountAuthKeyLink>(&key)? {
                if link.is_auth_key_used {
                    accounts.insert(link.account_address);
                }
            }
        }
        Ok(accounts)
    }

    fn auth_keys_for_public_key(&self, public_key: &str) -> Result<BTreeSet<String>, LedgerError> {
        let mut auth_keys = BTreeSet::new();
        for parts in self.scan_index(&KeyPrefix::public_key_index_prefix(public_key)?)? {
            let [public_key_type, auth_key] = parts.as_slice() else {
                continue;
            };
            let key = KeyPrefix::auth_key_public_key(auth_key, public_key_type, public_key)?;
            if let Some(member) = self.read_record::<AuthKeyPublicKeyLink>(&key)? {
                if member.is_public_key_used {
                    auth_keys.insert(member.auth_key);
                }
            }
        }
        Ok(auth_keys)
    }
}
