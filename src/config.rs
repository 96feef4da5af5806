use std::net::SocketAddr;

use anyhow::Context;

#[derive(Clone, Debug)]
pub struct Config {
    pub addr: SocketAddr,
    pub seed_sample: bool,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port: u16 =
            std::env::var("PORT").unwrap_or_else(|_| "4000".to_string()).parse().context("PORT")?;

        let seed_sample = std::env::var("SEED_SAMPLE").ok().map_or(true, |s| parse_flag(&s));

        Ok(Self { addr: format!("{host}:{port}").parse().context("HOST/PORT")?, seed_sample })
    }
}

fn parse_flag(raw: &str) -> bool {
    !matches!(raw.trim().to_ascii_lowercase().as_str(), "0" | "false" | "no" | "off")
}
