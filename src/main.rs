use anyhow::Result;
use clap::Parser;
use impsort::cli::{AppContext, Cli, Commands};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Build a context once, pass everywhere
    let ctx = AppContext {
        quiet: cli.quiet,
        no_color: cli.no_color,
        dry_run: cli.dry_run,
        verbose: cli.verbose,
    };

    init_tracing(&ctx);

    match cli.command {
        Commands::Format(args) => {
            let summary = impsort::format_run(args, &ctx)?;
            let code = summary.exit_code();
            if code != 0 {
                std::process::exit(code);
            }
            Ok(())
        }
        Commands::Init(args) => impsort::infra::config::init(args, &ctx),
        Commands::Completions(args) => impsort::completion::run(args, &ctx),
    }
}

/// Stderr logging; `RUST_LOG` wins over the `--verbose` default.
fn init_tracing(ctx: &AppContext) {
    let default = if ctx.verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(!ctx.no_color)
        .with_target(false)
        .init();
}
