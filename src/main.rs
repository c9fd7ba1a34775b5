use caparoc_reggen::commands;
use clap::Parser as _;
use tracing_subscriber::filter::targets::Targets;
use tracing_subscriber::{layer::SubscriberExt as _, util::SubscriberInitExt as _};

const LOG_FILTER_VAR: &str = "CAPAROC_REGGEN_LOG";

#[derive(clap::Parser)]
#[clap(version, about, author, args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(flatten)]
    generate: commands::generate::Args,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Generate the C++ register header from the register table (the default).
    Generate(commands::generate::Args),
    List(commands::list::Args),
    Info(commands::info::Args),
}

fn end<E: std::error::Error>(r: Result<(), E>) {
    std::process::exit(match r {
        Ok(_) => 0,
        Err(e) => {
            eprintln!("error: {e}");
            let mut cause = e.source();
            while let Some(e) = cause {
                eprintln!("  because: {e}");
                cause = e.source();
            }
            1
        }
    });
}

fn log_filter() -> Targets {
    let Ok(description) = std::env::var(LOG_FILTER_VAR) else {
        return Targets::new();
    };
    description.parse::<Targets>().unwrap_or_else(|e| {
        eprintln!("warning: ignoring {LOG_FILTER_VAR}: {e}");
        Targets::new()
    })
}

fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(log_filter())
        .init();
    let cli = Cli::parse();
    match cli.command {
        None => end(commands::generate::run(cli.generate)),
        Some(Commands::Generate(args)) => end(commands::generate::run(args)),
        Some(Commands::List(args)) => end(commands::list::run(args)),
        Some(Commands::Info(args)) => end(commands::info::run(args)),
    }
}
