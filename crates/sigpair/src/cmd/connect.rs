use sigpair_peer::{connect_with_retry, PeerConfig, Session};
use tracing::info;

use crate::cmd::{parse_duration, run_session, ConnectArgs, Interrupt};
use crate::exit::{peer_error, CliResult};
use crate::output::OutputFormat;

pub fn run(args: ConnectArgs, format: OutputFormat) -> CliResult<i32> {
    let timeout = parse_duration(&args.connect_timeout)?;
    let (registry, config) = args.session.resolve()?;
    let interrupt = Interrupt::install()?;

    info!(endpoint = %args.endpoint, role = ?args.session.role, "connecting");
    let peer = connect_with_retry(
        &args.endpoint,
        &PeerConfig::default(),
        config.handshake.retry_interval.min(timeout),
        Some(timeout),
    )
    .map_err(|err| peer_error("connect failed", err))?;

    let session = Session::new(registry, config);
    run_session(peer, session, args.session.role, &interrupt, format)
}
