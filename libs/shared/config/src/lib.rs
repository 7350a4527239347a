use std::env;
use std::str::FromStr;
use tracing::warn;

/// Which persistence implementation the API wires its stores to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Supabase,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "supabase" | "postgrest" => Ok(StorageBackend::Supabase),
            "memory" | "in-memory" => Ok(StorageBackend::Memory),
            other => Err(format!("unknown storage backend: {}", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_service_role_key: String,
    pub supabase_jwt_secret: String,
    pub jwt_audience: Option<String>,
    pub storage_backend: StorageBackend,
    pub server_port: u16,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let storage_backend = env::var("STORAGE_BACKEND")
            .ok()
            .and_then(|raw| {
                raw.parse::<StorageBackend>()
                    .map_err(|e| warn!("{}, falling back to supabase", e))
                    .ok()
            })
            .unwrap_or(StorageBackend::Supabase);

        let server_port = match env::var("SERVER_PORT") {
            Ok(raw) => raw.parse().unwrap_or_else(|_| {
                warn!("SERVER_PORT is not a valid port ({}), using 3000", raw);
                3000
            }),
            Err(_) => 3000,
        };

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
            supabase_service_role_key: env::var("SUPABASE_SERVICE_ROLE_KEY")
                .unwrap_or_default(),
            supabase_jwt_secret: env::var("SUPABASE_JWT_SECRET")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_JWT_SECRET not set, using empty value");
                    String::new()
                }),
            jwt_audience: env::var("JWT_AUDIENCE").ok().filter(|aud| !aud.is_empty()),
            storage_backend,
            server_port,
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        let database_ready = match self.storage_backend {
            StorageBackend::Supabase => {
                !self.supabase_url.is_empty() && !self.supabase_anon_key.is_empty()
            }
            StorageBackend::Memory => true,
        };

        database_ready && !self.supabase_jwt_secret.is_empty()
    }

    /// Key sent as the bearer token to PostgREST. The service role key
    /// bypasses row level security, so it wins when present.
    pub fn database_bearer_key(&self) -> &str {
        if self.supabase_service_role_key.is_empty() {
            &self.supabase_anon_key
        } else {
            &self.supabase_service_role_key
        }
    }
}
