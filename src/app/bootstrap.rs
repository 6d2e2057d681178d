use crate::app::commands;
use crate::cli::{Cli, Commands};
use crate::config::Config;
use crate::error::Result;
use crate::fetch::YahooProvider;

/// Entry point used by `main`: build the provider and dispatch the subcommand.
pub fn run(cli: Cli) -> Result<()> {
    let config = Config::builtin();
    let provider = YahooProvider::new(config.provider)?;

    match cli.command {
        Commands::History {
            ref range,
            combined,
            rows,
        } => commands::history(&provider, range, combined, rows),
        Commands::Info { ref symbol } => commands::info(&provider, symbol),
        Commands::Chart {
            ref range,
            ref output_dir,
        } => commands::chart(&provider, range, output_dir),
        Commands::Demo { ref output_dir } => commands::demo(&provider, output_dir),
    }
}
