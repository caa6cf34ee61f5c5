use thiserror::Error;

pub const DEFAULT_AI_GATEWAY_URL: &str = "https://ai.gateway.lovable.dev/v1";
pub const DEFAULT_AI_MODEL: &str = "google/gemini-2.5-flash";
const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is not configured")] Missing(&'static str),
    #[error("invalid value for {name}: {value}")] Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub ai_api_key: String,
    pub ai_base_url: String,
    pub ai_model: String,
    pub supabase_url: String,
    pub supabase_service_role_key: String,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from any variable source; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let require = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));

        let ai_api_key = require("LOVABLE_API_KEY")?;
        let ai_base_url = get("AI_GATEWAY_URL").unwrap_or_else(|| DEFAULT_AI_GATEWAY_URL.to_string());
        let ai_model = get("AI_MODEL").unwrap_or_else(|| DEFAULT_AI_MODEL.to_string());

        let supabase_url = require("SUPABASE_URL")?;
        let supabase_service_role_key = require("SUPABASE_SERVICE_ROLE_KEY")?;

        let port = match get("PORT") {
            Some(v) => v.parse().map_err(|_| ConfigError::Invalid { name: "PORT", value: v })?,
            None => DEFAULT_PORT,
        };

        Ok(Self { ai_api_key, ai_base_url, ai_model, supabase_url, supabase_service_role_key, port })
    }
}
