mod commands;
mod terminal;

use commands::{CommandLine, Commands, enumerate, probe, run, tools};
use submergex_common::config::CommandRegistry;
use terminal::{logging, print};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let commands = CommandLine::parse_args();

    logging::init_logging(commands.verbose, commands.quiet);
    print::banner(commands.quiet);

    let mut cfg = commands.config();
    let registry: CommandRegistry = commands.registry()?;

    match &commands.command {
        Commands::Enumerate(args) => {
            args.apply(&mut cfg);
            enumerate::enumerate(args, &registry, &cfg).await
        }
        Commands::Probe {
            file,
            domain,
            probe: args,
        } => {
            args.apply(&mut cfg);
            probe::probe(file, domain.as_deref(), args, &registry, &cfg).await
        }
        Commands::Run { enumerate, probe } => {
            enumerate.apply(&mut cfg);
            probe.apply(&mut cfg);
            run::run(enumerate, probe, &registry, &cfg).await
        }
        Commands::Tools => tools::tools(&registry, &cfg).await,
    }
}
