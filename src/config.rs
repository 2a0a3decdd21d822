use anyhow::Result;
use serde::Deserialize;
use std::env;

pub const MEMORY_DATABASE_URL: &str = "memory://";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub api_version: String,
    pub upload_dir: String,
    pub public_upload_url: String,
    pub max_file_size: usize,
    pub default_storage_limit_gb: f64,
    pub jwt_secret: String,
    pub jwt_expires_in_hours: i64,
    pub image_max_dimension: u32,
    pub image_quality: u8,
    pub recent_limit_max: usize,
    pub cors_allow_any: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Config {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgresql://localhost/stackit".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()?,
            api_version: env::var("API_VERSION")
                .unwrap_or_else(|_| "v1".to_string()),
            upload_dir: env::var("UPLOAD_DIR")
                .unwrap_or_else(|_| "./uploads".to_string()),
            public_upload_url: env::var("PUBLIC_UPLOAD_URL")
                .unwrap_or_else(|_| "/uploads".to_string()),
            max_file_size: env::var("MAX_FILE_SIZE")
                .unwrap_or_else(|_| "52428800".to_string()) // 50MB
                .parse()?,
            default_storage_limit_gb: env::var("DEFAULT_STORAGE_LIMIT_GB")
                .unwrap_or_else(|_| "15".to_string())
                .parse()?,
            jwt_secret: env::var("JWT_SECRET")
                .unwrap_or_else(|_| "your-secret-key-change-in-production".to_string()),
            jwt_expires_in_hours: env::var("JWT_EXPIRES_IN_HOURS")
                .unwrap_or_else(|_| "168".to_string()) // 7 days
                .parse()?,
            image_max_dimension: env::var("IMAGE_MAX_DIMENSION")
                .unwrap_or_else(|_| "1920".to_string())
                .parse()?,
            image_quality: env::var("IMAGE_QUALITY")
                .unwrap_or_else(|_| "85".to_string())
                .parse()?,
            recent_limit_max: env::var("RECENT_LIMIT_MAX")
                .unwrap_or_else(|_| "100".to_string())
                .parse()?,
            cors_allow_any: env::var("CORS_ALLOW_ANY")
                .unwrap_or_else(|_| "true".to_string())
                .parse()?,
        })
    }

    pub fn uses_memory_store(&self) -> bool {
        self.database_url == MEMORY_DATABASE_URL
    }

    pub fn api_prefix(&self) -> String {
        format!("/api/{}", self.api_version)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database_url: MEMORY_DATABASE_URL.to_string(),
            port: 3000,
            api_version: "v1".to_string(),
            upload_dir: "./uploads".to_string(),
            public_upload_url: "/uploads".to_string(),
            max_file_size: 50 * 1024 * 1024,
            default_storage_limit_gb: 15.0,
            jwt_secret: "your-secret-key-change-in-production".to_string(),
            jwt_expires_in_hours: 168,
            image_max_dimension: 1920,
            image_quality: 85,
            recent_limit_max: 100,
            cors_allow_any: true,
        }
    }
}
