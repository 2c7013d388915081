use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use clap::{Args, Subcommand, ValueEnum};
use sigpair_algo::envelope::LENGTH_PREFIX;
use sigpair_algo::{default_registry, AlgorithmRegistry};
use sigpair_frame::{InboxCloser, MAX_PAYLOAD};
use sigpair_peer::{
    HandshakeConfig, Peer, RoundTripConfig, Session, SessionConfig, TestRole, ACK, FAILED, READY,
};
use sigpair_transport::{Endpoint, IpcStream};

use crate::exit::{
    algorithm_error, peer_error, CliError, CliResult, SUCCESS, TESTS_FAILED, USAGE,
};
use crate::output::{print_session, OutputFormat};

pub mod algorithms;
pub mod connect;
pub mod listen;
pub mod selftest;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Accept one peer and run the signature session.
    Listen(ListenArgs),
    /// Connect to a listening peer and run the signature session.
    Connect(ConnectArgs),
    /// Sign and verify every algorithm locally, without a peer.
    Selftest(SelftestArgs),
    /// List the algorithm catalogue.
    Algorithms(AlgorithmsArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Listen(args) => listen::run(args, format),
        Command::Connect(args) => connect::run(args, format),
        Command::Selftest(args) => selftest::run(args, format),
        Command::Algorithms(args) => algorithms::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum RoleArg {
    Signer,
    Verifier,
}

impl From<RoleArg> for TestRole {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::Signer => TestRole::Signer,
            RoleArg::Verifier => TestRole::Verifier,
        }
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct CatalogueArgs {
    /// Restrict the catalogue to these algorithms (comma-separated names).
    #[arg(long, value_delimiter = ',', env = "SIGPAIR_ALGORITHMS")]
    pub algorithms: Option<Vec<String>>,
}

impl CatalogueArgs {
    pub fn registry(&self) -> CliResult<AlgorithmRegistry> {
        let registry = default_registry();
        match &self.algorithms {
            Some(names) => registry
                .filtered(names)
                .map_err(|err| algorithm_error("--algorithms", err)),
            None => Ok(registry),
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct SessionArgs {
    /// Role for the first run.
    #[arg(long, value_enum, env = "SIGPAIR_ROLE")]
    pub role: RoleArg,
    #[command(flatten)]
    pub catalogue: CatalogueArgs,
    /// Run one direction only instead of swapping roles afterwards.
    #[arg(long)]
    pub no_swap: bool,
    /// Message the signer signs.
    #[arg(long, env = "SIGPAIR_MESSAGE")]
    pub message: Option<String>,
    /// Interval between `ready` messages (e.g. 2s, 500ms).
    #[arg(long, default_value = "2s", env = "SIGPAIR_RETRY_INTERVAL")]
    pub retry_interval: String,
    /// How long the initiator waits for an acknowledgement per `ready`.
    #[arg(long, default_value = "3s", env = "SIGPAIR_POLL_TIMEOUT")]
    pub poll_timeout: String,
    /// Pause after the handshake before the first algorithm.
    #[arg(long, default_value = "1s", env = "SIGPAIR_SETTLE_DELAY")]
    pub settle_delay: String,
    /// Give up the handshake after this many `ready` attempts.
    #[arg(long, env = "SIGPAIR_MAX_ATTEMPTS")]
    pub max_attempts: Option<u32>,
    /// Verifier poll interval for keys and envelopes.
    #[arg(long, default_value = "1s", env = "SIGPAIR_RECEIVE_TIMEOUT")]
    pub receive_timeout: String,
    /// How long the signer waits for the echoed message.
    #[arg(long, default_value = "1s", env = "SIGPAIR_CONFIRM_TIMEOUT")]
    pub confirm_timeout: String,
    /// Verifier gives up an algorithm after this many empty polls.
    #[arg(long, env = "SIGPAIR_MAX_RECEIVE_ATTEMPTS")]
    pub max_receive_attempts: Option<u32>,
}

impl SessionArgs {
    /// Catalogue and session settings, validated before any link is opened.
    pub fn resolve(&self) -> CliResult<(AlgorithmRegistry, SessionConfig)> {
        let registry = self.catalogue.registry()?;
        let config = self.session_config(&registry)?;
        Ok((registry, config))
    }

    fn session_config(&self, registry: &AlgorithmRegistry) -> CliResult<SessionConfig> {
        let mut round_trip = RoundTripConfig {
            receive_timeout: parse_duration(&self.receive_timeout)?,
            confirm_timeout: parse_duration(&self.confirm_timeout)?,
            max_receive_attempts: self.max_receive_attempts,
            ..RoundTripConfig::default()
        };
        if let Some(message) = &self.message {
            round_trip.message = message_bytes(message, registry)?;
        }
        Ok(SessionConfig {
            handshake: HandshakeConfig {
                retry_interval: parse_duration(&self.retry_interval)?,
                poll_timeout: parse_duration(&self.poll_timeout)?,
                settle_delay: parse_duration(&self.settle_delay)?,
                max_attempts: self.max_attempts,
            },
            round_trip,
            swap_roles: !self.no_swap,
        })
    }
}

/// Longest message whose envelope fits in one frame for every algorithm in
/// `registry`.
fn max_message_len(registry: &AlgorithmRegistry) -> usize {
    let widest = registry
        .iter()
        .map(|a| a.descriptor().signature_len)
        .max()
        .unwrap_or(0);
    MAX_PAYLOAD
        .saturating_sub(LENGTH_PREFIX + widest)
        .min(usize::from(u16::MAX))
}

fn message_bytes(message: &str, registry: &AlgorithmRegistry) -> CliResult<Bytes> {
    if [READY, ACK, FAILED].contains(&message.as_bytes()) {
        return Err(CliError::new(
            USAGE,
            format!("--message must not be the control word '{message}'"),
        ));
    }
    let len = message.len();
    let max = max_message_len(registry);
    if len > max {
        return Err(CliError::new(
            USAGE,
            format!("--message is {len} bytes, max {max} for the selected algorithms"),
        ));
    }
    Ok(Bytes::copy_from_slice(message.as_bytes()))
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    /// Endpoint to bind: a socket path, unix:///path, or tcp://host:port.
    pub endpoint: Endpoint,
    #[command(flatten)]
    pub session: SessionArgs,
}

#[derive(Args, Debug)]
pub struct ConnectArgs {
    /// Endpoint to connect to: a socket path, unix:///path, or tcp://host:port.
    pub endpoint: Endpoint,
    #[command(flatten)]
    pub session: SessionArgs,
    /// Keep retrying the connection for this long (e.g. 30s).
    #[arg(long, default_value = "30s", env = "SIGPAIR_CONNECT_TIMEOUT")]
    pub connect_timeout: String,
}

#[derive(Args, Debug)]
pub struct SelftestArgs {
    #[command(flatten)]
    pub catalogue: CatalogueArgs,
    /// Message to sign.
    #[arg(long, default_value = "Test message for DSA")]
    pub message: String,
}

#[derive(Args, Debug)]
pub struct AlgorithmsArgs {
    #[command(flatten)]
    pub catalogue: CatalogueArgs,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Ctrl-C closes the current peer's inbox, which ends a blocked handshake or
/// round trip with a disconnect. Before a peer exists it exits outright.
#[derive(Clone, Default)]
pub struct Interrupt {
    closer: Arc<Mutex<Option<InboxCloser>>>,
}

impl Interrupt {
    pub fn install() -> CliResult<Self> {
        let interrupt = Self::default();
        let handle = interrupt.closer.clone();
        ctrlc::set_handler(move || {
            let closer = match handle.lock() {
                Ok(guard) => guard.clone(),
                Err(poisoned) => poisoned.into_inner().clone(),
            };
            match closer {
                Some(closer) => {
                    tracing::warn!("interrupted; closing session");
                    closer.close();
                }
                None => std::process::exit(130),
            }
        })
        .map_err(|err| {
            CliError::new(
                crate::exit::INTERNAL,
                format!("signal handler setup failed: {err}"),
            )
        })?;
        Ok(interrupt)
    }

    pub fn watch(&self, closer: InboxCloser) {
        let mut slot = match self.closer.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *slot = Some(closer);
    }
}

/// Run the session on a connected peer and print the report.
pub fn run_session(
    mut peer: Peer<IpcStream>,
    session: Session,
    role: RoleArg,
    interrupt: &Interrupt,
    format: OutputFormat,
) -> CliResult<i32> {
    interrupt.watch(peer.closer());

    let result = session.run(&mut peer, role.into());
    let peer_id = peer.id().to_string();
    if let Some(delivery) = peer.shutdown() {
        tracing::debug!(
            bytes_read = delivery.bytes_read,
            frames = delivery.frames_delivered,
            dropped = delivery.frames_dropped,
            "delivery finished"
        );
    }

    let report = result.map_err(|err| peer_error("session failed", err))?;
    print_session(&report, &peer_id, format);
    if report.all_passed() {
        Ok(SUCCESS)
    } else {
        Ok(TESTS_FAILED)
    }
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, millis) = if let Some(num) = input.strip_suffix("ms") {
        (num, true)
    } else if let Some(num) = input.strip_suffix('s') {
        (num, false)
    } else {
        (input, false)
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    if millis {
        Ok(Duration::from_millis(value))
    } else {
        Ok(Duration::from_secs(value))
    }
}
