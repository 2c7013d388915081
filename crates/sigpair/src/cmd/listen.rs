use sigpair_peer::{PeerListener, Session};
use tracing::info;

use crate::cmd::{run_session, Interrupt, ListenArgs};
use crate::exit::{peer_error, CliResult};
use crate::output::OutputFormat;

pub fn run(args: ListenArgs, format: OutputFormat) -> CliResult<i32> {
    let (registry, config) = args.session.resolve()?;
    let listener =
        PeerListener::bind(&args.endpoint).map_err(|err| peer_error("bind failed", err))?;
    let interrupt = Interrupt::install()?;

    info!(endpoint = %listener.endpoint(), role = ?args.session.role, "waiting for peer");
    let peer = listener
        .accept()
        .map_err(|err| peer_error("accept failed", err))?;

    let session = Session::new(registry, config);
    run_session(peer, session, args.session.role, &interrupt, format)
}
