use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("sigpair {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: sigpair");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "target: {}",
        option_env!("SIGPAIR_BUILD_TARGET").unwrap_or("unknown")
    );
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!("git_hash: {}", option_env!("GIT_HASH").unwrap_or("unknown"));
    println!(
        "features: mldsa={}, async={}, cli=true",
        cfg!(feature = "mldsa"),
        cfg!(feature = "async")
    );
    let names: Vec<&str> = sigpair_algo::default_registry()
        .iter()
        .map(|a| a.descriptor().name)
        .collect();
    println!("algorithms: {}", names.join(","));

    Ok(SUCCESS)
}
