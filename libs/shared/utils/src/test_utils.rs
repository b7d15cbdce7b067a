use shared_config::AppConfig;

pub struct TestConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub default_timezone: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
            default_timezone: "UTC".to_string(),
        }
    }
}

impl TestConfig {
    /// Config pointed at a mock server, e.g. `MockServer::uri()`.
    pub fn with_supabase_url(url: impl Into<String>) -> Self {
        Self {
            supabase_url: url.into(),
            ..Self::default()
        }
    }

    /// Config without Supabase credentials, which selects the in-memory store.
    pub fn unconfigured() -> Self {
        Self {
            supabase_url: String::new(),
            supabase_anon_key: String::new(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_anon_key: self.supabase_anon_key.clone(),
            default_timezone: self.default_timezone.clone(),
            port: 0,
        }
    }
}
