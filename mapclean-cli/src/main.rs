use clap::Parser;
use mapclean_cli::{run, Args};

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut logger = env_logger::Builder::from_default_env();
    let env_filter_set = std::env::var_os(env_logger::DEFAULT_FILTER_ENV).is_some();
    if let Some(level) = args.log_level_override(env_filter_set) {
        logger.filter_level(level);
    }
    logger.init();

    run(&args)?;
    Ok(())
}
