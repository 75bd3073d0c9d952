use clap::Parser;

/// Unagi match-up prediction service
#[derive(Parser, Debug, Clone)]
#[command(name = "unagi", version, about)]
pub struct Config {
    /// API listen address
    #[arg(long, env = "LISTEN_ADDR", default_value = "0.0.0.0:8080")]
    pub listen_addr: String,

    /// football-data.org API base URL
    #[arg(
        long,
        env = "FOOTBALL_DATA_URL",
        default_value = "https://api.football-data.org/v4"
    )]
    pub football_data_url: String,

    /// football-data.org token, sent as `X-Auth-Token` on every upstream call
    #[arg(long, env = "FOOTBALL_DATA_TOKEN", hide_env_values = true)]
    pub football_data_token: Option<String>,

    /// Decimal odds shown for team A
    #[arg(long, env = "ODDS_HOME", default_value = "1.80")]
    pub odds_home: f64,

    /// Decimal odds shown for team B
    #[arg(long, env = "ODDS_AWAY", default_value = "2.20")]
    pub odds_away: f64,

    /// Lower bound of the simulated loading duration (seconds)
    #[arg(long, env = "LOADING_MIN_SECS", default_value = "3.0")]
    pub loading_min_secs: f64,

    /// Upper bound of the simulated loading duration (seconds)
    #[arg(long, env = "LOADING_MAX_SECS", default_value = "4.0")]
    pub loading_max_secs: f64,

    /// Competition codes used to derive opponents from today's fixtures
    /// (comma separated, e.g. "PD,PL"). Empty means the static pairing rule.
    #[arg(long, env = "COMPETITIONS", value_delimiter = ',')]
    pub competitions: Vec<String>,

    /// Idle time after which a pairing session expires (seconds)
    #[arg(long, env = "SESSION_TTL_SECS", default_value = "1800")]
    pub session_ttl_secs: u64,

    /// Timeout for outbound HTTP requests (seconds)
    #[arg(long, env = "HTTP_TIMEOUT_SECS", default_value = "10")]
    pub http_timeout_secs: u64,
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        match self.football_data_token.as_deref() {
            None | Some("") => anyhow::bail!(
                "FOOTBALL_DATA_TOKEN is required. Get one at https://www.football-data.org/client/register"
            ),
            Some(_) => {}
        }
        // NaN slips through every ordered comparison below
        if !self.odds_home.is_finite() || !self.odds_away.is_finite() {
            anyhow::bail!("decimal odds must be finite numbers");
        }
        if self.odds_home <= 1.0 || self.odds_away <= 1.0 {
            anyhow::bail!("decimal odds must be greater than 1.0");
        }
        if !self.loading_min_secs.is_finite() || !self.loading_max_secs.is_finite() {
            anyhow::bail!("loading bounds must be finite numbers");
        }
        if self.loading_min_secs <= 0.0 {
            anyhow::bail!("loading_min_secs must be positive");
        }
        if self.loading_max_secs < self.loading_min_secs {
            anyhow::bail!("loading_max_secs must not be lower than loading_min_secs");
        }
        if self.session_ttl_secs == 0 {
            anyhow::bail!("session_ttl_secs must be positive");
        }
        if self.http_timeout_secs == 0 {
            anyhow::bail!("http_timeout_secs must be positive");
        }
        Ok(())
    }

    pub fn token(&self) -> &str {
        self.football_data_token.as_deref().unwrap_or_default()
    }

    /// Competition codes with blanks dropped.
    pub fn competition_codes(&self) -> Vec<String> {
        self.competitions
            .iter()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect()
    }
}
