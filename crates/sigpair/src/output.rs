use std::io::IsTerminal;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use sigpair_algo::{AlgorithmDescriptor, TestOutcome};
use sigpair_peer::SessionReport;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct SessionOutput<'a> {
    peer_id: &'a str,
    passed: usize,
    failed: usize,
    #[serde(flatten)]
    report: &'a SessionReport,
    timestamp: String,
}

#[derive(Serialize)]
struct SelfTestOutput<'a> {
    passed: usize,
    failed: usize,
    outcomes: &'a [TestOutcome],
    timestamp: String,
}

#[derive(Serialize)]
struct CatalogueOutput<'a> {
    algorithms: &'a [AlgorithmDescriptor],
}

pub fn print_session(report: &SessionReport, peer_id: &str, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&SessionOutput {
            peer_id,
            passed: report.passed(),
            failed: report.failed(),
            report,
            timestamp: now_unix_seconds(),
        }),
        OutputFormat::Table => {
            let mut table = outcome_table(vec!["ROLE", "ID", "ALGORITHM", "RESULT", "REASON"]);
            for run in &report.runs {
                for outcome in &run.outcomes {
                    let mut row = vec![run.role.to_string()];
                    row.extend(outcome_cells(outcome));
                    table.add_row(row);
                }
            }
            println!("{table}");
            println!(
                "peer={} passed={} failed={}",
                peer_id,
                report.passed(),
                report.failed()
            );
        }
        OutputFormat::Pretty => {
            for run in &report.runs {
                println!(
                    "run role={} handshake_attempts={} discarded={} elapsed_ms={}",
                    run.role,
                    run.handshake.attempts,
                    run.handshake.discarded,
                    run.handshake.elapsed_ms
                );
                for outcome in &run.outcomes {
                    println!("  {}", pretty_outcome(outcome));
                }
            }
            println!(
                "peer={} passed={} failed={}",
                peer_id,
                report.passed(),
                report.failed()
            );
        }
    }
}

pub fn print_outcomes(outcomes: &[TestOutcome], format: OutputFormat) {
    let passed = outcomes.iter().filter(|o| o.passed).count();
    let failed = outcomes.len() - passed;
    match format {
        OutputFormat::Json => print_json(&SelfTestOutput {
            passed,
            failed,
            outcomes,
            timestamp: now_unix_seconds(),
        }),
        OutputFormat::Table => {
            let mut table = outcome_table(vec!["ID", "ALGORITHM", "RESULT", "REASON"]);
            for outcome in outcomes {
                table.add_row(outcome_cells(outcome));
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for outcome in outcomes {
                println!("{}", pretty_outcome(outcome));
            }
            println!("passed={passed} failed={failed}");
        }
    }
}

pub fn print_catalogue(descriptors: &[AlgorithmDescriptor], format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&CatalogueOutput {
            algorithms: descriptors,
        }),
        OutputFormat::Table => {
            let mut table =
                outcome_table(vec!["ID", "NAME", "PUBLIC KEY", "SECRET KEY", "SIGNATURE"]);
            for d in descriptors {
                table.add_row(vec![
                    d.id.to_string(),
                    d.name.to_string(),
                    d.public_key_len.to_string(),
                    d.secret_key_len.to_string(),
                    d.signature_len.to_string(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for d in descriptors {
                println!(
                    "{} id={} pk={} sk={} sig={}",
                    d.name, d.id, d.public_key_len, d.secret_key_len, d.signature_len
                );
            }
        }
    }
}

fn outcome_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn outcome_cells(outcome: &TestOutcome) -> Vec<String> {
    vec![
        outcome.algorithm_id.to_string(),
        outcome.algorithm.to_string(),
        result_label(outcome).to_string(),
        outcome
            .failure_reason
            .map(|r| r.to_string())
            .unwrap_or_default(),
    ]
}

fn pretty_outcome(outcome: &TestOutcome) -> String {
    let line = format!(
        "{} ({}) {}",
        outcome.algorithm,
        outcome.algorithm_id,
        result_label(outcome)
    );
    match outcome.failure_reason {
        Some(reason) => format!("{line} reason={reason}"),
        None => line,
    }
}

fn result_label(outcome: &TestOutcome) -> &'static str {
    if outcome.passed {
        "PASS"
    } else {
        "FAIL"
    }
}

fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
