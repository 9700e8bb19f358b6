pub mod cache;
pub mod string;

pub use cache::Credentials;
pub use string::SecretString;

use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

/// Every credential or endpoint the server reads from the environment.
///
/// Each key accepts its primary variable and, for values shared with the web
/// frontend, the `NEXT_PUBLIC_` alias.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialKey {
    OpenAiApiKey,
    SupabaseUrl,
    SupabaseAnonKey,
    ElevenLabsApiKey,
    HeygenApiKey,
    HeygenApiUrl,
}

impl CredentialKey {
    pub const ALL: [CredentialKey; 6] = [
        CredentialKey::OpenAiApiKey,
        CredentialKey::SupabaseUrl,
        CredentialKey::SupabaseAnonKey,
        CredentialKey::ElevenLabsApiKey,
        CredentialKey::HeygenApiKey,
        CredentialKey::HeygenApiUrl,
    ];

    /// Environment variables consulted, in priority order
    pub fn env_vars(&self) -> &'static [&'static str] {
        match self {
            CredentialKey::OpenAiApiKey => &["OPENAI_API_KEY"],
            CredentialKey::SupabaseUrl => &["SUPABASE_URL", "NEXT_PUBLIC_SUPABASE_URL"],
            CredentialKey::SupabaseAnonKey => &["SUPABASE_KEY", "NEXT_PUBLIC_SUPABASE_ANON_KEY"],
            CredentialKey::ElevenLabsApiKey => {
                &["ELEVENLABS_API_KEY", "NEXT_PUBLIC_ELEVENLABS_API_KEY"]
            }
            CredentialKey::HeygenApiKey => &["HEYGEN_API_KEY"],
            CredentialKey::HeygenApiUrl => &["HEYGEN_API_URL"],
        }
    }

    pub fn primary_var(&self) -> &'static str {
        self.env_vars()[0]
    }

    /// Whether a missing value has a built-in fallback
    pub fn is_optional(&self) -> bool {
        matches!(self, CredentialKey::HeygenApiUrl)
    }
}

impl fmt::Display for CredentialKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.primary_var())
    }
}

/// Regex patterns for detecting common secret formats.
static SECRET_PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();

/// Patterns match:
/// - OpenAI API keys: sk-...
/// - ElevenLabs API keys: sk_<hex>
/// - JWTs (Supabase access and anon keys): eyJ....
/// - Bearer tokens: Bearer <token>
fn get_secret_patterns() -> &'static Vec<Regex> {
    SECRET_PATTERNS.get_or_init(|| {
        [
            r"sk-[a-zA-Z0-9\-_]{20,}",
            r"sk_[a-f0-9]{32,}",
            r"eyJ[A-Za-z0-9_\-]{8,}\.[A-Za-z0-9_\-]{8,}\.[A-Za-z0-9_\-]{8,}",
            r"Bearer\s+[^\s]{20,}",
        ]
        .iter()
        .filter_map(|pattern| Regex::new(pattern).ok())
        .collect()
    })
}

/// Scrubs secrets from text by replacing them with [REDACTED].
///
/// Applied to upstream response bodies before they are logged or wrapped
/// into an error.
///
/// # Examples
/// ```
/// use pitch_engine::secrets::scrub;
///
/// let scrubbed = scrub("Incorrect API key provided: sk-1234567890abcdefghij");
/// assert_eq!(scrubbed, "Incorrect API key provided: [REDACTED]");
/// ```
pub fn scrub(text: &str) -> String {
    let mut result = text.to_string();
    for pattern in get_secret_patterns() {
        result = pattern.replace_all(&result, "[REDACTED]").to_string();
    }
    result
}
