use std::env;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub default_timezone: String,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, using empty value");
                    String::new()
                }),
            supabase_anon_key: env::var("SUPABASE_ANON_PUBLIC_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_ANON_PUBLIC_KEY not set, using empty value");
                    String::new()
                }),
            default_timezone: env::var("DEFAULT_TIMEZONE")
                .unwrap_or_else(|_| "UTC".to_string()),
            port: match env::var("PORT") {
                Ok(raw) => raw.parse().unwrap_or_else(|_| {
                    warn!("PORT '{}' is not a valid port, using 3000", raw);
                    3000
                }),
                Err(_) => 3000,
            },
        };

        if !config.is_configured() {
            warn!("Supabase not configured - appointments will be kept in memory");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.supabase_url.is_empty() && !self.supabase_anon_key.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_configured_requires_url_and_key() {
        let mut config = AppConfig {
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: String::new(),
            default_timezone: "UTC".to_string(),
            port: 3000,
        };
        assert!(!config.is_configured());

        config.supabase_anon_key = "anon".to_string();
        assert!(config.is_configured());
    }
}
