use std::{env, path::PathBuf, time::Duration};

/// Process settings read from the environment at startup.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub port: u16,
    pub db_path: PathBuf,
    /// Interval of the scheduled-publication sweep; `None` leaves publishing
    /// of due articles to `POST /api/admin/publish-due`.
    pub sweep_every: Option<Duration>,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("PORT")
            .ok()
            .and_then(|value| value.trim().parse::<u16>().ok())
            .unwrap_or(3000);
        let db_path = env::var("HLC_DB_PATH")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("data/hlc.sqlite3"));
        let sweep_every = env::var("HLC_SCHEDULE_SWEEP_SECS")
            .ok()
            .and_then(|value| value.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(|secs| Duration::from_secs(secs.max(5)));

        Self {
            bind_addr,
            port,
            db_path,
            sweep_every,
        }
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}
