/*!
Test Harness pour l'API Pangan

Combine le client de polling et les contrats:
- Chargement automatique des contrats HTTP
- Validation de chaque réponse contre le contrat de sa route
- Statistiques sur les réponses reçues
*/

use crate::contract_helpers::ContractLoader;
use crate::poller::{DashboardPoller, Poll};
use anyhow::{anyhow, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

const SENSOR_DATA_ROUTE: &str = "GET /api/sensor-data";

pub struct TestHarness {
    pub poller: DashboardPoller,
    pub contract_loader: ContractLoader,
    polls: Vec<Poll>,
}

#[derive(Debug, Default)]
pub struct PollStats {
    pub total: usize,
    pub by_status: HashMap<String, usize>, // statut de fraîcheur courant -> nb
    pub http_errors: usize,
}

impl TestHarness {
    pub fn new(base_url: &str, contracts_dir: impl AsRef<Path>) -> Result<Self> {
        tracing_subscriber::fmt().with_test_writer().try_init().ok();

        Ok(Self {
            poller: DashboardPoller::new(base_url)?,
            contract_loader: ContractLoader::new(contracts_dir),
            polls: Vec::new(),
        })
    }

    pub fn with_contracts(mut self) -> Result<Self> {
        let count = self.contract_loader.load_http_contracts()?;
        tracing::info!("Loaded {count} contracts for testing");
        Ok(self)
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.poller = self.poller.with_interval(interval);
        self
    }

    /// Poll `count` fois et garde les réponses pour les assertions
    pub async fn poll(&mut self, count: usize) -> Result<&[Poll]> {
        let polls = self.poller.poll(count).await?;
        self.polls.extend(polls);
        Ok(&self.polls)
    }

    /// Valide une réponse contre le contrat de /api/sensor-data
    pub fn assert_matches_contract(&self, body: &Value) -> Result<()> {
        let contract = self
            .contract_loader
            .contract_for_route(SENSOR_DATA_ROUTE)
            .ok_or_else(|| anyhow!("no contract for {SENSOR_DATA_ROUTE}"))?;
        contract
            .validate(body)
            .map_err(|errors| anyhow!("contract {} violated:\n  {}", contract.key(), errors.join("\n  ")))
    }

    /// Toutes les réponses reçues sont des 200 conformes au contrat
    pub fn assert_all_valid(&self) -> Result<()> {
        if self.polls.is_empty() {
            return Err(anyhow!("no polls recorded"));
        }
        for (i, poll) in self.polls.iter().enumerate() {
            if poll.status != 200 {
                return Err(anyhow!("poll #{} returned HTTP {}", i + 1, poll.status));
            }
            self.assert_matches_contract(&poll.body)?;
        }
        Ok(())
    }

    pub fn polls(&self) -> &[Poll] {
        &self.polls
    }

    pub fn get_stats(&self) -> PollStats {
        let mut stats = PollStats { total: self.polls.len(), ..PollStats::default() };
        for poll in &self.polls {
            if poll.status != 200 {
                stats.http_errors += 1;
                continue;
            }
            if let Some(status) = poll.body["current"]["status"].as_str() {
                *stats.by_status.entry(status.to_string()).or_insert(0) += 1;
            }
        }
        stats
    }
}
