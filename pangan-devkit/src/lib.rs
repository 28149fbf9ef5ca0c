/*!
# Pangan DevKit - Utilitaires de test pour l'API capteurs

Bibliothèque facilitant les tests du kernel avec:
- Chargement et validation des contrats JSON
- Client de polling reproduisant le dashboard
- Harness combinant les deux
*/

pub mod contract_helpers;
pub mod poller;
pub mod test_utils;

pub use contract_helpers::{Contract, ContractLoader};
pub use poller::{DashboardPoller, Poll, DASHBOARD_INTERVAL};
pub use test_utils::{PollStats, TestHarness};
