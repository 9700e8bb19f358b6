use crate::secrets::string::SecretString;
use crate::secrets::CredentialKey;
use sdk::errors::PitchError;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Where credential values come from
#[derive(Debug, Clone)]
enum Source {
    /// Process environment, read lazily
    Environment,
    /// Fixed values, used by tests and embedding callers
    Fixed(HashMap<CredentialKey, SecretString>),
}

/// Lazily resolved, in-memory cached credentials.
///
/// Nothing is read at construction time: a missing credential only fails
/// the request that needs it, with a configuration error.
#[derive(Debug)]
pub struct Credentials {
    source: Source,
    cache: RwLock<HashMap<CredentialKey, SecretString>>,
}

impl Credentials {
    /// Resolve credentials from environment variables
    pub fn from_env() -> Self {
        Self {
            source: Source::Environment,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Use a fixed set of values instead of the environment
    pub fn from_pairs<I, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (CredentialKey, V)>,
        V: Into<String>,
    {
        Self {
            source: Source::Fixed(
                pairs
                    .into_iter()
                    .map(|(k, v)| (k, SecretString::new(v.into())))
                    .collect(),
            ),
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Looks up a credential. Checks the memory cache first; on a miss the
    /// source is consulted and a hit is cached.
    pub fn lookup(&self, key: CredentialKey) -> Option<SecretString> {
        {
            let cache = self.cache.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(secret) = cache.get(&key) {
                return Some(secret.clone());
            }
        }

        let raw = match &self.source {
            Source::Environment => key
                .env_vars()
                .iter()
                .find_map(|var| std::env::var(var).ok().filter(|v| !v.trim().is_empty())),
            Source::Fixed(values) => values.get(&key).map(|v| v.unsecure().to_string()),
        }?;

        let secret = SecretString::new(raw.trim());
        {
            let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
            cache.insert(key, secret.clone());
        }
        tracing::debug!("Resolved credential {}", key.primary_var());
        Some(secret)
    }

    /// Like [`lookup`](Self::lookup) but a missing value is a configuration error
    pub fn require(&self, key: CredentialKey) -> Result<SecretString, PitchError> {
        self.lookup(key).ok_or_else(|| {
            PitchError::Config(format!(
                "{} not configured in environment variables",
                key.primary_var()
            ))
        })
    }

    /// Whether the credential is available, without failing
    pub fn is_present(&self, key: CredentialKey) -> bool {
        self.lookup(key).is_some()
    }
}
