use secrecy::Secret;
use service_core::config::{self as core_config, get_env, get_optional_env, is_production};
use service_core::error::AppError;

pub const DEFAULT_BUCKET: &str = "clinical-notes";
pub const DEFAULT_TABLE: &str = "clinical_summaries";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct SummaryConfig {
    pub common: core_config::Config,
    pub backend: Backend,
    pub supabase: SupabaseConfig,
    pub upload: UploadConfig,
    pub otlp_endpoint: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    /// Project base URL, e.g. `https://xyz.supabase.co`. Empty for the memory backend.
    pub url: String,
    pub key: Secret<String>,
    pub table: String,
    pub storage_bucket: String,
}

#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub max_bytes: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Supabase,
    Memory,
}

impl SummaryConfig {
    pub fn load() -> Result<Self, AppError> {
        // Load common config (handles .env and APP__ prefix)
        let common_config = core_config::Config::load()?;
        let backend: Backend = get_env("SUMMARY_BACKEND", Some("supabase"))?
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;
        backend.ensure_allowed(is_production())?;

        let (url, key) = match backend {
            Backend::Supabase => {
                let url = get_optional_env("SUPABASE_URL");
                let key = get_optional_env("SUPABASE_KEY");
                let missing: Vec<&str> = [("SUPABASE_URL", &url), ("SUPABASE_KEY", &key)]
                    .into_iter()
                    .filter(|(_, v)| v.is_none())
                    .map(|(k, _)| k)
                    .collect();
                if !missing.is_empty() {
                    return Err(AppError::ConfigError(anyhow::anyhow!(
                        "Missing required environment variables: {}",
                        missing.join(", ")
                    )));
                }
                (
                    url.unwrap_or_default().trim_end_matches('/').to_string(),
                    key.unwrap_or_default(),
                )
            }
            Backend::Memory => (String::new(), String::new()),
        };

        let max_bytes = get_env(
            "MAX_UPLOAD_BYTES",
            Some(&DEFAULT_MAX_UPLOAD_BYTES.to_string()),
        )?
        .parse()
        .map_err(|e| AppError::ConfigError(anyhow::anyhow!("Invalid MAX_UPLOAD_BYTES: {}", e)))?;

        Ok(SummaryConfig {
            common: common_config,
            backend,
            supabase: SupabaseConfig {
                url,
                key: Secret::new(key),
                table: get_env("SUPABASE_TABLE", Some(DEFAULT_TABLE))?,
                storage_bucket: get_env("SUPABASE_STORAGE_BUCKET", Some(DEFAULT_BUCKET))?,
            },
            upload: UploadConfig { max_bytes },
            otlp_endpoint: get_optional_env("OTLP_ENDPOINT"),
        })
    }

    /// Configuration for in-process backends, used by tests and local runs.
    pub fn in_memory(port: u16) -> Self {
        SummaryConfig {
            common: core_config::Config { port },
            backend: Backend::Memory,
            supabase: SupabaseConfig {
                url: String::new(),
                key: Secret::new(String::new()),
                table: DEFAULT_TABLE.to_string(),
                storage_bucket: DEFAULT_BUCKET.to_string(),
            },
            upload: UploadConfig {
                max_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            },
            otlp_endpoint: None,
        }
    }
}

impl Backend {
    /// Production must run against the hosted datastore.
    pub fn ensure_allowed(self, is_prod: bool) -> Result<(), AppError> {
        if self == Backend::Memory && is_prod {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "SUMMARY_BACKEND=memory is not allowed in production"
            )));
        }
        Ok(())
    }
}

impl std::str::FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "supabase" => Ok(Backend::Supabase),
            "memory" => Ok(Backend::Memory),
            _ => Err(format!("Invalid summary backend: {}", s)),
        }
    }
}
