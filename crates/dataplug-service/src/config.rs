//! Service configuration.

use serde::Deserialize;
use std::path::Path;

use dataplug_core::FeeSchedule;

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Address to listen on (default: "0.0.0.0:8080").
    pub listen_addr: String,

    /// Path to `RocksDB` data directory (default: "/data/dataplug").
    pub data_dir: String,

    /// Shared secret for storefront-issued HS256 JWTs.
    pub jwt_secret: Option<String>,

    /// Expected JWT audience (default: "dataplug").
    pub jwt_audience: String,

    /// Admin API key for back-office endpoints.
    pub admin_api_key: Option<String>,

    /// Paystack secret key. Also keys webhook signature verification.
    pub paystack_secret_key: Option<String>,

    /// Paystack API base URL (default: `<https://api.paystack.co>`).
    pub paystack_base_url: String,

    /// Frontend URL for checkout redirects.
    pub frontend_url: String,

    /// CORS allowed origins.
    pub cors_origins: Vec<String>,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,

    /// Request timeout in seconds.
    pub request_timeout_seconds: u64,

    /// Timeout for outbound gateway calls in seconds.
    pub gateway_timeout_seconds: u64,

    /// Minimum deposit amount in pesewas (default: 100 = GHS 1).
    pub deposit_min_pesewas: i64,

    /// Maximum deposit amount in pesewas (default: `500_000` = GHS 5000).
    pub deposit_max_pesewas: i64,

    /// Gateway surcharge schedule applied at initiation.
    pub fees: FeeSchedule,

    /// Age after which a processing claim is considered abandoned.
    pub claim_stale_seconds: i64,

    /// How often the background reaper sweeps, in seconds.
    pub reaper_interval_seconds: u64,

    /// Age after which an unpaid Pending deposit is cancelled, in hours.
    pub pending_expiry_hours: i64,
}

/// Paystack secrets file structure.
#[derive(Debug, Deserialize)]
struct PaystackSecrets {
    secret_key: String,
    #[serde(default)]
    base_url: Option<String>,
}

impl ServiceConfig {
    /// Load configuration from environment variables and secrets files.
    #[must_use]
    pub fn from_env() -> Self {
        // Try to load Paystack secrets from file first, then fall back to env vars
        let (paystack_secret_key, paystack_base_url) = load_paystack_secrets();

        Self {
            listen_addr: std::env::var("LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".into()),
            data_dir: std::env::var("DATA_DIR").unwrap_or_else(|_| "/data/dataplug".into()),
            jwt_secret: std::env::var("JWT_SECRET").ok(),
            jwt_audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "dataplug".into()),
            admin_api_key: std::env::var("ADMIN_API_KEY").ok(),
            paystack_secret_key,
            paystack_base_url: paystack_base_url
                .unwrap_or_else(|| "https://api.paystack.co".into()),
            frontend_url: std::env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".into()),
            cors_origins: std::env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "*".into())
                .split(',')
                .map(|s| s.trim().to_string())
                .collect(),
            max_body_bytes: std::env::var("MAX_BODY_BYTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1024 * 1024), // 1MB
            request_timeout_seconds: std::env::var("REQUEST_TIMEOUT_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
            gateway_timeout_seconds: std::env::var("GATEWAY_TIMEOUT_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
            deposit_min_pesewas: std::env::var("DEPOSIT_MIN_PESEWAS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(100),
            deposit_max_pesewas: std::env::var("DEPOSIT_MAX_PESEWAS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(500_000),
            fees: FeeSchedule::default(),
            claim_stale_seconds: std::env::var("CLAIM_STALE_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(300),
            reaper_interval_seconds: std::env::var("REAPER_INTERVAL_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(300),
            pending_expiry_hours: std::env::var("PENDING_EXPIRY_HOURS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(24),
        }
    }
}

/// Load Paystack secrets from file or environment.
fn load_paystack_secrets() -> (Option<String>, Option<String>) {
    // Try multiple paths for the secrets file
    let secret_paths = [
        ".secrets/paystack.json",
        "dataplug/.secrets/paystack.json",
        "dataplug/service/.secrets/paystack.json",
        "../.secrets/paystack.json",
    ];

    for path in &secret_paths {
        if let Ok(secrets) = load_secrets_file::<PaystackSecrets>(path) {
            tracing::info!(path = %path, "Loaded Paystack secrets from file");
            return (Some(secrets.secret_key), secrets.base_url);
        }
    }

    // Fall back to environment variables
    tracing::debug!("Paystack secrets file not found, using environment variables");
    (
        std::env::var("PAYSTACK_SECRET_KEY").ok(),
        std::env::var("PAYSTACK_BASE_URL").ok(),
    )
}

/// Load secrets from a JSON file.
fn load_secrets_file<T: serde::de::DeserializeOwned>(path: &str) -> Result<T, std::io::Error> {
    let path = Path::new(path);
    if !path.exists() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Secrets file not found",
        ));
    }
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".into(),
            data_dir: "/data/dataplug".into(),
            jwt_secret: None,
            jwt_audience: "dataplug".into(),
            admin_api_key: None,
            paystack_secret_key: None,
            paystack_base_url: "https://api.paystack.co".into(),
            frontend_url: "http://localhost:3000".into(),
            cors_origins: vec!["*".into()],
            max_body_bytes: 1024 * 1024,
            request_timeout_seconds: 30,
            gateway_timeout_seconds: 30,
            deposit_min_pesewas: 100,
            deposit_max_pesewas: 500_000,
            fees: FeeSchedule::default(),
            claim_stale_seconds: 300,
            reaper_interval_seconds: 300,
            pending_expiry_hours: 24,
        }
    }
}
