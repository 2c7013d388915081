use crate::cmd::AlgorithmsArgs;
use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_catalogue, OutputFormat};

pub fn run(args: AlgorithmsArgs, format: OutputFormat) -> CliResult<i32> {
    let registry = args.catalogue.registry()?;
    print_catalogue(&registry.descriptors(), format);
    Ok(SUCCESS)
}
