mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(
    name = "sigpair",
    version,
    about = "Two-device signature interoperability tester"
)]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true, env = "SIGPAIR_FORMAT")]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(
        long,
        value_name = "LEVEL",
        default_value = "info",
        global = true,
        env = "SIGPAIR_LOG_LEVEL"
    )]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd::RoleArg;

    #[test]
    fn parses_listen_subcommand() {
        let cli = Cli::try_parse_from([
            "sigpair",
            "listen",
            "/tmp/sigpair.sock",
            "--role",
            "signer",
            "--algorithms",
            "ED25519,ML_DSA_44",
        ])
        .expect("listen args should parse");

        match cli.command {
            Command::Listen(args) => {
                assert_eq!(args.session.role, RoleArg::Signer);
                assert_eq!(
                    args.session.catalogue.algorithms,
                    Some(vec!["ED25519".to_string(), "ML_DSA_44".to_string()])
                );
                assert!(!args.session.no_swap);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn connect_accepts_tcp_endpoint() {
        let cli = Cli::try_parse_from([
            "sigpair",
            "connect",
            "tcp://127.0.0.1:7000",
            "--role",
            "verifier",
            "--no-swap",
        ])
        .expect("connect args should parse");
        assert!(matches!(cli.command, Command::Connect(_)));
    }

    #[test]
    fn role_is_required() {
        let err = Cli::try_parse_from(["sigpair", "listen", "/tmp/sigpair.sock"])
            .expect_err("missing role should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn rejects_bad_endpoint() {
        let err = Cli::try_parse_from(["sigpair", "connect", "tcp://nohost", "--role", "signer"])
            .expect_err("endpoint without port should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }
}
