use std::{env, net::SocketAddr, path::PathBuf};

use anyhow::Result;

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub db_path: PathBuf,
    pub source_csv: PathBuf,
    pub page_size: u32,
    pub max_page_size: u32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let bind_raw =
            env::var("CATALOG_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
        let bind_addr = parse_bind_addr(&bind_raw);

        let db_path = PathBuf::from(
            env::var("CATALOG_DB_PATH").unwrap_or_else(|_| "Metacritic.db".to_string()),
        );

        let source_csv = PathBuf::from(
            env::var("CATALOG_SOURCE_CSV").unwrap_or_else(|_| "tv_shows.csv".to_string()),
        );

        let max_page_size = env::var("CATALOG_MAX_PAGE_SIZE")
            .ok()
            .and_then(|v| v.trim().parse::<u32>().ok())
            .filter(|v| *v > 0)
            .unwrap_or(500);

        let page_size = env::var("CATALOG_PAGE_SIZE")
            .ok()
            .and_then(|v| v.trim().parse::<u32>().ok())
            .filter(|v| *v > 0)
            .unwrap_or(50)
            .min(max_page_size);

        Ok(Self {
            bind_addr,
            db_path,
            source_csv,
            page_size,
            max_page_size,
        })
    }
}

fn parse_bind_addr(raw: &str) -> SocketAddr {
    raw.trim()
        .trim_matches('"')
        .trim_matches('\'')
        .parse::<SocketAddr>()
        .unwrap_or_else(|_| SocketAddr::from(([0, 0, 0, 0], 8080)))
}
