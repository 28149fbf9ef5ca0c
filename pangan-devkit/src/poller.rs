/*!
Client de polling façon dashboard

Reproduit le comportement du dashboard web : GET périodique sur
/api/sensor-data, chaque réponse étant indépendante des précédentes.
*/

use anyhow::{bail, Context, Result};
use serde_json::Value;
use std::time::Duration;

/// Intervalle de rafraîchissement du dashboard
pub const DASHBOARD_INTERVAL: Duration = Duration::from_secs(5);

/// Une réponse reçue : code HTTP + corps JSON
#[derive(Debug, Clone)]
pub struct Poll {
    pub status: u16,
    pub body: Value,
}

pub struct DashboardPoller {
    client: reqwest::Client,
    base_url: String,
    interval: Duration,
}

impl DashboardPoller {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            interval: DASHBOARD_INTERVAL,
        })
    }

    /// Intervalle personnalisé (tests rapides)
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// GET arbitraire, retourne le corps JSON quel que soit le code
    pub async fn get_json(&self, path: &str) -> Result<Poll> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("GET {url} failed"))?;
        let status = resp.status().as_u16();
        let body = resp.json::<Value>().await.with_context(|| format!("GET {url}: body is not JSON"))?;
        Ok(Poll { status, body })
    }

    /// Un cycle de rafraîchissement du dashboard
    pub async fn fetch_sensor_data(&self) -> Result<Poll> {
        self.get_json("/api/sensor-data").await
    }

    /// `count` cycles espacés de l'intervalle configuré
    pub async fn poll(&self, count: usize) -> Result<Vec<Poll>> {
        if count == 0 {
            bail!("poll count must be > 0");
        }

        let mut ticker = tokio::time::interval(self.interval);
        let mut polls = Vec::with_capacity(count);
        for i in 0..count {
            ticker.tick().await;
            let poll = self.fetch_sensor_data().await?;
            tracing::debug!("poll #{} -> HTTP {}", i + 1, poll.status);
            polls.push(poll);
        }
        Ok(polls)
    }
}
