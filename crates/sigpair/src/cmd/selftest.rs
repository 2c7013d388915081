use sigpair_algo::self_test_all;

use crate::cmd::SelftestArgs;
use crate::exit::{CliResult, SUCCESS, TESTS_FAILED};
use crate::output::{print_outcomes, OutputFormat};

pub fn run(args: SelftestArgs, format: OutputFormat) -> CliResult<i32> {
    let registry = args.catalogue.registry()?;
    let outcomes = self_test_all(&registry, args.message.as_bytes());
    print_outcomes(&outcomes, format);

    if outcomes.iter().all(|o| o.passed) {
        Ok(SUCCESS)
    } else {
        Ok(TESTS_FAILED)
    }
}
