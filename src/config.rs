use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

// ---------------------------------------------------------------------------
// Environment override tracking
// ---------------------------------------------------------------------------

/// Tracks which configuration settings are overridden by environment variables.
#[derive(Debug, Clone, Default)]
pub struct EnvOverrides {
    overrides: HashMap<String, String>,
}

impl EnvOverrides {
    /// Check whether a setting key (e.g. "supabase.url") is overridden by an env var.
    pub fn is_overridden(&self, key: &str) -> bool {
        self.overrides.contains_key(key)
    }

    /// Get the env var name that overrides the given setting key.
    pub fn env_var_for(&self, key: &str) -> Option<&str> {
        self.overrides.get(key).map(String::as_str)
    }

    /// Get all overrides as a map of setting key -> env var name.
    pub fn all(&self) -> &HashMap<String, String> {
        &self.overrides
    }

    fn record(&mut self, key: &str, env_var: &str) {
        self.overrides.insert(key.to_string(), env_var.to_string());
    }
}

// ---------------------------------------------------------------------------
// Main configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub supabase: SupabaseConfig,
    #[serde(default)]
    pub app: AppConfig,
    #[serde(default)]
    pub callback: CallbackConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Env var overrides are not serialized to TOML.
    #[serde(skip)]
    pub env_overrides: EnvOverrides,
}

/// Hosted auth service connection.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SupabaseConfig {
    /// Project URL, e.g. `https://abcd1234.supabase.co`.
    #[serde(default)]
    pub url: String,
    /// Public anon key sent as the `apikey` header.
    #[serde(default)]
    pub anon_key: String,
    #[serde(default)]
    pub flow_type: FlowType,
    #[serde(default)]
    pub storage_backend: StorageBackend,
    #[serde(default = "default_storage_dir")]
    pub storage_dir: PathBuf,
    /// Overrides the derived `sb-<project-ref>-auth-token` key.
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_key: Option<String>,
}

impl Default for SupabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            anon_key: String::new(),
            flow_type: FlowType::default(),
            storage_backend: StorageBackend::default(),
            storage_dir: default_storage_dir(),
            storage_key: None,
        }
    }
}

impl SupabaseConfig {
    /// Storage key for the persisted session.
    ///
    /// Mirrors the JS client's naming so a session written by one is found
    /// by the other: `sb-<first host label>-auth-token`.
    pub fn effective_storage_key(&self) -> String {
        if let Some(key) = self.storage_key.as_deref().filter(|k| !k.is_empty()) {
            return key.to_string();
        }
        let project_ref = url::Url::parse(&self.url)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.split('.').next().unwrap_or(h).to_string()))
            .unwrap_or_else(|| "local".to_string());
        format!("sb-{project_ref}-auth-token")
    }
}

/// Product-level constants of the app shell.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Production web origin OAuth providers redirect to when running packaged.
    #[serde(default = "default_web_origin")]
    pub web_origin: String,
    /// Production hostnames; a callback served from one of these bounces
    /// into the app via deep link.
    #[serde(default = "default_web_hosts")]
    pub web_hosts: Vec<String>,
    #[serde(default = "default_deep_link_scheme")]
    pub deep_link_scheme: String,
    /// URL schemes (without `:`) that identify the packaged app shell.
    #[serde(default = "default_packaged_schemes")]
    pub packaged_schemes: Vec<String>,
    #[serde(default = "default_signup_path")]
    pub signup_path: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            web_origin: default_web_origin(),
            web_hosts: default_web_hosts(),
            deep_link_scheme: default_deep_link_scheme(),
            packaged_schemes: default_packaged_schemes(),
            signup_path: default_signup_path(),
        }
    }
}

/// Fixed delays of the callback flow.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CallbackConfig {
    /// Wait before polling for a session established out of band.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
    #[serde(default = "default_success_redirect_delay_ms")]
    pub success_redirect_delay_ms: u64,
    #[serde(default = "default_error_redirect_delay_ms")]
    pub error_redirect_delay_ms: u64,
    #[serde(default = "default_deep_link_fallback_delay_ms")]
    pub deep_link_fallback_delay_ms: u64,
}

impl Default for CallbackConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: default_settle_delay_ms(),
            success_redirect_delay_ms: default_success_redirect_delay_ms(),
            error_redirect_delay_ms: default_error_redirect_delay_ms(),
            deep_link_fallback_delay_ms: default_deep_link_fallback_delay_ms(),
        }
    }
}

impl CallbackConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
    pub fn success_redirect_delay(&self) -> Duration {
        Duration::from_millis(self.success_redirect_delay_ms)
    }
    pub fn error_redirect_delay(&self) -> Duration {
        Duration::from_millis(self.error_redirect_delay_ms)
    }
    pub fn deep_link_fallback_delay(&self) -> Duration {
        Duration::from_millis(self.deep_link_fallback_delay_ms)
    }

    /// All delays zero. Used by tests and dry runs.
    pub fn immediate() -> Self {
        Self {
            settle_delay_ms: 0,
            success_redirect_delay_ms: 0,
            error_redirect_delay_ms: 0,
            deep_link_fallback_delay_ms: 0,
        }
    }
}

/// Post-login backend notification.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NotifyConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Name of the edge function to invoke.
    #[serde(default = "default_notify_function")]
    pub function_name: String,
    /// Role reported for every signed-in user.
    #[serde(default = "default_notify_role")]
    pub role: String,
    #[serde(default = "default_notify_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            function_name: default_notify_function(),
            role: default_notify_role(),
            timeout_secs: default_notify_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FlowType {
    /// Tokens come back in the URL fragment.
    #[default]
    Implicit,
    /// An authorization code comes back and is exchanged with a stored verifier.
    Pkce,
}

impl std::fmt::Display for FlowType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Implicit => write!(f, "implicit"),
            Self::Pkce => write!(f, "pkce"),
        }
    }
}

impl FromStr for FlowType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "implicit" => Ok(Self::Implicit),
            "pkce" => Ok(Self::Pkce),
            _ => Err(format!("Unknown flow type: {s}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    #[default]
    File,
    Memory,
}

impl std::fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File => write!(f, "file"),
            Self::Memory => write!(f, "memory"),
        }
    }
}

impl FromStr for StorageBackend {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "file" => Ok(Self::File),
            "memory" => Ok(Self::Memory),
            _ => Err(format!("Unknown storage backend: {s}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions
// ---------------------------------------------------------------------------

const fn default_true() -> bool {
    true
}
fn default_storage_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("wehand")
        .join("auth")
}
fn default_web_origin() -> String {
    "https://wehand.app".to_string()
}
fn default_web_hosts() -> Vec<String> {
    vec!["wehand.app".to_string(), "www.wehand.app".to_string()]
}
fn default_deep_link_scheme() -> String {
    "wehand".to_string()
}
fn default_packaged_schemes() -> Vec<String> {
    vec!["capacitor".to_string(), "ionic".to_string()]
}
fn default_signup_path() -> String {
    "/signup".to_string()
}
const fn default_settle_delay_ms() -> u64 {
    500
}
const fn default_success_redirect_delay_ms() -> u64 {
    1000
}
const fn default_error_redirect_delay_ms() -> u64 {
    3000
}
const fn default_deep_link_fallback_delay_ms() -> u64 {
    1500
}
fn default_notify_function() -> String {
    "notify-login".to_string()
}
fn default_notify_role() -> String {
    "user".to_string()
}
const fn default_notify_timeout_secs() -> u64 {
    10
}
fn default_log_level() -> String {
    "info".to_string()
}

// ---------------------------------------------------------------------------
// Config loading, env overrides, validation
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a TOML file, then apply environment variable
    /// overrides. Any setting prefixed with `WEHAND_` takes precedence over
    /// the file value and is tracked in `env_overrides`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            toml::from_str::<Config>(&content)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path.display());
            Self::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Check the settings the sign-in flow cannot run without.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.supabase.url.trim().is_empty() {
            anyhow::bail!("supabase.url is not set (WEHAND_SUPABASE_URL)");
        }
        url::Url::parse(&self.supabase.url)
            .map_err(|e| anyhow::anyhow!("supabase.url is not a valid URL: {e}"))?;
        if self.supabase.anon_key.trim().is_empty() {
            anyhow::bail!("supabase.anon_key is not set (WEHAND_SUPABASE_ANON_KEY)");
        }
        url::Url::parse(&self.app.web_origin)
            .map_err(|e| anyhow::anyhow!("app.web_origin is not a valid URL: {e}"))?;
        if self.app.deep_link_scheme.is_empty() {
            anyhow::bail!("app.deep_link_scheme must not be empty");
        }
        Ok(())
    }

    /// Every supported setting has a corresponding `WEHAND_*` env var. When
    /// set, the env var value replaces the file/default value and the key is
    /// recorded in `env_overrides`.
    fn apply_env_overrides(&mut self) {
        let mut ov = EnvOverrides::default();

        macro_rules! env_str {
            ($key:expr, $env:expr, $field:expr) => {
                if let Ok(val) = std::env::var($env) {
                    $field = val;
                    ov.record($key, $env);
                }
            };
        }
        macro_rules! env_bool {
            ($key:expr, $env:expr, $field:expr) => {
                if let Ok(val) = std::env::var($env) {
                    $field = matches!(val.to_lowercase().as_str(), "1" | "true" | "yes" | "on");
                    ov.record($key, $env);
                }
            };
        }
        macro_rules! env_parse {
            ($key:expr, $env:expr, $field:expr) => {
                if let Ok(val) = std::env::var($env) {
                    if let Ok(parsed) = val.parse() {
                        $field = parsed;
                        ov.record($key, $env);
                    }
                }
            };
        }
        macro_rules! env_list {
            ($key:expr, $env:expr, $field:expr) => {
                if let Ok(val) = std::env::var($env) {
                    $field = val
                        .split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect();
                    ov.record($key, $env);
                }
            };
        }

        // -- Supabase --
        env_str!("supabase.url", "WEHAND_SUPABASE_URL", self.supabase.url);
        env_str!("supabase.anon_key", "WEHAND_SUPABASE_ANON_KEY", self.supabase.anon_key);
        env_parse!("supabase.flow_type", "WEHAND_SUPABASE_FLOW_TYPE", self.supabase.flow_type);
        env_parse!(
            "supabase.storage_backend",
            "WEHAND_SUPABASE_STORAGE_BACKEND",
            self.supabase.storage_backend
        );
        if let Ok(val) = std::env::var("WEHAND_SUPABASE_STORAGE_DIR") {
            self.supabase.storage_dir = PathBuf::from(val);
            ov.record("supabase.storage_dir", "WEHAND_SUPABASE_STORAGE_DIR");
        }
        if let Ok(val) = std::env::var("WEHAND_SUPABASE_STORAGE_KEY") {
            self.supabase.storage_key = if val.is_empty() { None } else { Some(val) };
            ov.record("supabase.storage_key", "WEHAND_SUPABASE_STORAGE_KEY");
        }

        // -- App --
        env_str!("app.web_origin", "WEHAND_APP_WEB_ORIGIN", self.app.web_origin);
        env_list!("app.web_hosts", "WEHAND_APP_WEB_HOSTS", self.app.web_hosts);
        env_str!(
            "app.deep_link_scheme",
            "WEHAND_APP_DEEP_LINK_SCHEME",
            self.app.deep_link_scheme
        );
        env_list!(
            "app.packaged_schemes",
            "WEHAND_APP_PACKAGED_SCHEMES",
            self.app.packaged_schemes
        );
        env_str!("app.signup_path", "WEHAND_APP_SIGNUP_PATH", self.app.signup_path);

        // -- Callback --
        env_parse!(
            "callback.settle_delay_ms",
            "WEHAND_CALLBACK_SETTLE_DELAY_MS",
            self.callback.settle_delay_ms
        );
        env_parse!(
            "callback.success_redirect_delay_ms",
            "WEHAND_CALLBACK_SUCCESS_DELAY_MS",
            self.callback.success_redirect_delay_ms
        );
        env_parse!(
            "callback.error_redirect_delay_ms",
            "WEHAND_CALLBACK_ERROR_DELAY_MS",
            self.callback.error_redirect_delay_ms
        );
        env_parse!(
            "callback.deep_link_fallback_delay_ms",
            "WEHAND_CALLBACK_FALLBACK_DELAY_MS",
            self.callback.deep_link_fallback_delay_ms
        );

        // -- Notify --
        env_bool!("notify.enabled", "WEHAND_NOTIFY_ENABLED", self.notify.enabled);
        env_str!("notify.function_name", "WEHAND_NOTIFY_FUNCTION", self.notify.function_name);
        env_str!("notify.role", "WEHAND_NOTIFY_ROLE", self.notify.role);
        env_parse!(
            "notify.timeout_secs",
            "WEHAND_NOTIFY_TIMEOUT_SECS",
            self.notify.timeout_secs
        );

        // -- Logging --
        env_str!("logging.level", "WEHAND_LOG_LEVEL", self.logging.level);
        env_bool!("logging.json", "WEHAND_LOG_JSON", self.logging.json);

        self.env_overrides = ov;
    }
}

// Helper for default storage directory
mod dirs {
    use std::path::PathBuf;

    pub fn data_local_dir() -> Option<PathBuf> {
        std::env::var_os("XDG_DATA_HOME")
            .map(PathBuf::from)
            .or_else(|| {
                std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".local").join("share"))
            })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.app.web_origin, "https://wehand.app");
        assert_eq!(config.app.deep_link_scheme, "wehand");
        assert_eq!(config.app.signup_path, "/signup");
        assert_eq!(config.supabase.flow_type, FlowType::Implicit);
        assert_eq!(config.supabase.storage_backend, StorageBackend::File);
        assert!(config.notify.enabled);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_error_delay_longer_than_success_delay() {
        let cb = CallbackConfig::default();
        assert!(cb.error_redirect_delay() > cb.success_redirect_delay());
    }

    #[test]
    fn test_flow_type_from_str() {
        assert_eq!("pkce".parse::<FlowType>().unwrap(), FlowType::Pkce);
        assert_eq!("IMPLICIT".parse::<FlowType>().unwrap(), FlowType::Implicit);
        assert!("magic".parse::<FlowType>().is_err());
        assert_eq!(FlowType::Pkce.to_string(), "pkce");
    }

    #[test]
    fn test_storage_backend_from_str() {
        assert_eq!("file".parse::<StorageBackend>().unwrap(), StorageBackend::File);
        assert_eq!("memory".parse::<StorageBackend>().unwrap(), StorageBackend::Memory);
        assert!("keyring".parse::<StorageBackend>().is_err());
        assert_eq!(StorageBackend::Memory.to_string(), "memory");
    }

    #[test]
    fn test_effective_storage_key() {
        let mut sb = SupabaseConfig {
            url: "https://abcd1234.supabase.co".to_string(),
            ..Default::default()
        };
        assert_eq!(sb.effective_storage_key(), "sb-abcd1234-auth-token");

        sb.storage_key = Some("custom-key".to_string());
        assert_eq!(sb.effective_storage_key(), "custom-key");

        let unset = SupabaseConfig::default();
        assert_eq!(unset.effective_storage_key(), "sb-local-auth-token");
    }

    #[test]
    fn test_validate() {
        let mut config = Config::default();
        assert!(config.validate().is_err());

        config.supabase.url = "https://abcd1234.supabase.co".to_string();
        assert!(config.validate().is_err());

        config.supabase.anon_key = "anon".to_string();
        assert!(config.validate().is_ok());

        config.app.web_origin = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_overrides_tracking() {
        let mut ov = EnvOverrides::default();
        assert!(!ov.is_overridden("supabase.url"));
        ov.record("supabase.url", "WEHAND_SUPABASE_URL");
        assert!(ov.is_overridden("supabase.url"));
        assert_eq!(ov.env_var_for("supabase.url"), Some("WEHAND_SUPABASE_URL"));
        assert_eq!(ov.all().len(), 1);
    }

    #[test]
    fn test_env_override_applies() {
        // These variables are not read by any other test.
        // SAFETY: no other test touches these keys.
        unsafe {
            std::env::set_var("WEHAND_APP_WEB_HOSTS", "a.example, b.example,,");
            std::env::set_var("WEHAND_CALLBACK_FALLBACK_DELAY_MS", "42");
            std::env::set_var("WEHAND_NOTIFY_TIMEOUT_SECS", "not-a-number");
        }

        let mut config = Config::default();
        config.apply_env_overrides();

        assert_eq!(config.app.web_hosts, vec!["a.example", "b.example"]);
        assert_eq!(config.callback.deep_link_fallback_delay_ms, 42);
        // Unparsable values are ignored and not recorded.
        assert_eq!(config.notify.timeout_secs, 10);
        assert!(config.env_overrides.is_overridden("app.web_hosts"));
        assert!(!config.env_overrides.is_overridden("notify.timeout_secs"));

        unsafe {
            std::env::remove_var("WEHAND_APP_WEB_HOSTS");
            std::env::remove_var("WEHAND_CALLBACK_FALLBACK_DELAY_MS");
            std::env::remove_var("WEHAND_NOTIFY_TIMEOUT_SECS");
        }
    }

    #[test]
    fn test_config_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("missing.toml")).unwrap();
        assert_eq!(config.app.deep_link_scheme, "wehand");
    }

    #[test]
    fn test_config_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wehand.toml");
        std::fs::write(
            &path,
            r#"
[supabase]
url = "https://abcd1234.supabase.co"
anon_key = "anon"
flow_type = "pkce"
storage_backend = "memory"

[callback]
settle_delay_ms = 250

[notify]
function_name = "on-login"
"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.supabase.flow_type, FlowType::Pkce);
        assert_eq!(config.supabase.storage_backend, StorageBackend::Memory);
        assert_eq!(config.callback.settle_delay(), Duration::from_millis(250));
        assert_eq!(config.notify.function_name, "on-login");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_load_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[supabase\nurl = ").unwrap();
        assert!(Config::load(&path).is_err());
    }
}
