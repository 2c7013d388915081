use serde::Serialize;
use sigpair_algo::{AlgorithmRegistry, TestOutcome};
use sigpair_transport::Transport;
use tracing::info;

use crate::error::Result;
use crate::handshake::{synchronize, HandshakeConfig, HandshakeReport};
use crate::peer::Peer;
use crate::roundtrip::{run_catalogue, RoundTripConfig, TestRole};

/// Everything one session needs besides the peer and catalogue.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub handshake: HandshakeConfig,
    pub round_trip: RoundTripConfig,
    /// Run the catalogue a second time with roles exchanged. Default: true.
    pub swap_roles: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            handshake: HandshakeConfig::default(),
            round_trip: RoundTripConfig::default(),
            swap_roles: true,
        }
    }
}

/// One handshake plus one pass over the catalogue.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub role: TestRole,
    pub handshake: HandshakeReport,
    pub outcomes: Vec<TestOutcome>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub runs: Vec<RunReport>,
}

impl SessionReport {
    pub fn outcomes(&self) -> impl Iterator<Item = &TestOutcome> {
        self.runs.iter().flat_map(|run| run.outcomes.iter())
    }

    pub fn passed(&self) -> usize {
        self.outcomes().filter(|o| o.passed).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes().filter(|o| !o.passed).count()
    }

    pub fn all_passed(&self) -> bool {
        self.failed() == 0
    }
}

/// Handshake and catalogue, once per role.
#[derive(Debug, Clone)]
pub struct Session {
    registry: AlgorithmRegistry,
    config: SessionConfig,
}

impl Session {
    pub fn new(registry: AlgorithmRegistry, config: SessionConfig) -> Self {
        Self { registry, config }
    }

    pub fn registry(&self) -> &AlgorithmRegistry {
        &self.registry
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Run starting in `role`; with `swap_roles` a second run follows in the
    /// other role, with its own handshake.
    pub fn run<T: Transport>(&self, peer: &mut Peer<T>, role: TestRole) -> Result<SessionReport> {
        let mut roles = vec![role];
        if self.config.swap_roles {
            roles.push(role.swapped());
        }

        let mut runs = Vec::with_capacity(roles.len());
        for role in roles {
            info!(%role, algorithms = self.registry.len(), "starting run");
            let handshake = synchronize(peer, role.handshake_role(), &self.config.handshake)?;
            let outcomes = run_catalogue(peer, &self.registry, role, &self.config.round_trip)?;
            let passed = outcomes.iter().filter(|o| o.passed).count();
            info!(%role, passed, total = outcomes.len(), "run finished");
            runs.push(RunReport {
                role,
                handshake,
                outcomes,
            });
        }
        Ok(SessionReport { runs })
    }
}
