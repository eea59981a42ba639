use std::env;
use std::path::PathBuf;

/// Runtime configuration, read once at startup.
///
/// The signing secret and the public base URL have development defaults only
/// and must be overridden in any real deployment.
#[derive(Clone, Debug)]
pub struct Config {
    /// Shared secret for certificate signing (`CERT_SECRET_KEY`).
    pub secret_key: String,
    /// Public base URL used to build verification links (`BASE_URL`).
    pub base_url: String,
    /// Root directory for session uploads, signature images and generated
    /// output (`CERT_BASE_DIR`).
    pub base_dir: PathBuf,
    /// SQLite database holding issued certificates (`CERT_DB_PATH`).
    pub db_path: PathBuf,
    pub host: String,
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            secret_key: "udemy-123".to_string(),
            base_url: "https://certifyfast.onrender.com".to_string(),
            base_dir: env::temp_dir().join("certifyfast"),
            db_path: PathBuf::from("certifyfast.sqlite"),
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            secret_key: env::var("CERT_SECRET_KEY").unwrap_or(default.secret_key),
            base_url: env::var("BASE_URL").unwrap_or(default.base_url),
            base_dir: env::var("CERT_BASE_DIR")
                .map(PathBuf::from)
                .unwrap_or(default.base_dir),
            db_path: env::var("CERT_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or(default.db_path),
            host: env::var("HOST").unwrap_or(default.host),
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.port),
        }
    }

    pub fn uploads_dir(&self) -> PathBuf {
        self.base_dir.join("uploads")
    }

    pub fn signatures_dir(&self) -> PathBuf {
        self.base_dir.join("signatures")
    }

    pub fn output_dir(&self) -> PathBuf {
        self.base_dir.join("output")
    }

    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(self.uploads_dir())?;
        std::fs::create_dir_all(self.signatures_dir())?;
        std::fs::create_dir_all(self.output_dir())?;
        Ok(())
    }

    /// Public link a certificate holder follows to confirm authenticity.
    pub fn verification_url(&self, cert_id: &str) -> String {
        format!("{}/verify/{}", self.base_url.trim_end_matches('/'), cert_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verification_url_strips_trailing_slash() {
        let mut cfg = Config::default();
        cfg.base_url = "https://example.com/".to_string();
        assert_eq!(
            cfg.verification_url("abc123"),
            "https://example.com/verify/abc123"
        );
    }
}
