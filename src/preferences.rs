// Persisted UI context: language, currency and the signed-in session

use std::{
    collections::BTreeMap,
    fmt, fs,
    path::{Path, PathBuf},
    str::FromStr,
    sync::Arc,
};

use dashmap::DashMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::i18n::Language;

pub const LANGUAGE_KEY: &str = "language";
pub const CURRENCY_KEY: &str = "currency";
pub const AUTH_KEY: &str = "auth";

#[derive(Error, Debug)]
pub enum PreferenceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Usd,
    Eur,
    Gbp,
    Aed,
    Sar,
    Egp,
}

impl Currency {
    pub const ALL: [Currency; 6] = [
        Currency::Usd,
        Currency::Eur,
        Currency::Gbp,
        Currency::Aed,
        Currency::Sar,
        Currency::Egp,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
            Currency::Aed => "AED",
            Currency::Sar => "SAR",
            Currency::Egp => "EGP",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Currency::ALL
            .into_iter()
            .find(|c| c.code() == upper)
            .ok_or_else(|| format!("unsupported currency: {s}"))
    }
}

// Key/value persistence for small pieces of UI state
pub trait PreferenceStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), PreferenceError>;
    fn remove(&self, key: &str) -> Result<(), PreferenceError>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    values: DashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).map(|v| v.value().clone())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PreferenceError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), PreferenceError> {
        self.values.remove(key);
        Ok(())
    }
}

// JSON object on disk, rewritten in full on every change
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    values: RwLock<BTreeMap<String, String>>,
}

impl FileStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PreferenceError> {
        let path = path.as_ref().to_path_buf();
        let values = match fs::read_to_string(&path) {
            Ok(raw) if raw.trim().is_empty() => BTreeMap::new(),
            Ok(raw) => serde_json::from_str(&raw)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path,
            values: RwLock::new(values),
        })
    }

    fn flush(&self, values: &BTreeMap<String, String>) -> Result<(), PreferenceError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, serde_json::to_string_pretty(values)?)?;
        Ok(())
    }
}

impl PreferenceStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.read().get(key).cloned()
    }

    // Memory only changes once the file write succeeded
    fn set(&self, key: &str, value: &str) -> Result<(), PreferenceError> {
        let mut values = self.values.write();
        let mut next = values.clone();
        next.insert(key.to_string(), value.to_string());
        self.flush(&next)?;
        *values = next;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), PreferenceError> {
        let mut values = self.values.write();
        if !values.contains_key(key) {
            return Ok(());
        }
        let mut next = values.clone();
        next.remove(key);
        self.flush(&next)?;
        *values = next;
        Ok(())
    }
}

fn restore<T: FromStr + Default>(store: &dyn PreferenceStore, key: &str) -> T {
    match store.get(key) {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            warn!(key, value = %raw, "ignoring invalid stored preference");
            T::default()
        }),
        None => T::default(),
    }
}

// Language and currency context
pub struct Preferences {
    store: Arc<dyn PreferenceStore>,
    language: RwLock<Language>,
    currency: RwLock<Currency>,
}

impl Preferences {
    pub fn load(store: Arc<dyn PreferenceStore>) -> Self {
        let language = restore::<Language>(store.as_ref(), LANGUAGE_KEY);
        let currency = restore::<Currency>(store.as_ref(), CURRENCY_KEY);
        debug!(%language, %currency, "preferences restored");

        Self {
            store,
            language: RwLock::new(language),
            currency: RwLock::new(currency),
        }
    }

    pub fn language(&self) -> Language {
        *self.language.read()
    }

    pub fn currency(&self) -> Currency {
        *self.currency.read()
    }

    pub fn set_language(&self, language: Language) -> Result<(), PreferenceError> {
        self.store.set(LANGUAGE_KEY, language.code())?;
        *self.language.write() = language;
        Ok(())
    }

    pub fn set_currency(&self, currency: Currency) -> Result<(), PreferenceError> {
        self.store.set(CURRENCY_KEY, currency.code())?;
        *self.currency.write() = currency;
        Ok(())
    }

    // `?lang=` / `?currency=` from the URL win over stored values and are persisted
    pub fn apply_query(
        &self,
        lang: Option<&str>,
        currency: Option<&str>,
    ) -> Result<(), PreferenceError> {
        if let Some(lang) = lang.and_then(|l| l.parse::<Language>().ok()) {
            self.set_language(lang)?;
        }
        if let Some(currency) = currency.and_then(|c| c.parse::<Currency>().ok()) {
            self.set_currency(currency)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Customer,
    Supplier,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: UserRole,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthSession {
    pub token: String,
    pub user: UserProfile,
}

pub struct AuthContext {
    store: Arc<dyn PreferenceStore>,
    session: RwLock<Option<AuthSession>>,
}

impl AuthContext {
    pub fn load(store: Arc<dyn PreferenceStore>) -> Self {
        let session = store.get(AUTH_KEY).and_then(|raw| {
            serde_json::from_str::<AuthSession>(&raw)
                .map_err(|e| warn!(error = %e, "discarding unreadable stored session"))
                .ok()
        });

        Self {
            store,
            session: RwLock::new(session),
        }
    }

    pub fn session(&self) -> Option<AuthSession> {
        self.session.read().clone()
    }

    pub fn token(&self) -> Option<String> {
        self.session.read().as_ref().map(|s| s.token.clone())
    }

    pub fn is_supplier(&self) -> bool {
        self.session
            .read()
            .as_ref()
            .is_some_and(|s| s.user.role == UserRole::Supplier)
    }

    pub fn sign_in(&self, session: AuthSession) -> Result<(), PreferenceError> {
        self.store.set(AUTH_KEY, &serde_json::to_string(&session)?)?;
        *self.session.write() = Some(session);
        Ok(())
    }

    pub fn sign_out(&self) -> Result<(), PreferenceError> {
        self.store.remove(AUTH_KEY)?;
        *self.session.write() = None;
        Ok(())
    }
}
