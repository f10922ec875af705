use clap::Parser;
use declmap::cli::{Cli, Command};
use declmap::commands::{
    CommandContext, cmd_compat, cmd_deps, cmd_init, cmd_interface, cmd_mcp, cmd_ordinal, cmd_xref,
};
use declmap::style;
use std::io;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            style::error(&format!("Failed to start async runtime: {}", e));
            std::process::exit(1);
        }
    };

    std::process::exit(runtime.block_on(run(cli)));
}

async fn run(cli: Cli) -> i32 {
    match cli.command.clone() {
        // Init must work before any config exists.
        Command::Init => cmd_init(&cli.root),
        command => match CommandContext::new(&cli) {
            Ok(ctx) => dispatch(ctx, command).await,
            Err(code) => code,
        },
    }
}

async fn dispatch(ctx: CommandContext, command: Command) -> i32 {
    match command {
        Command::Interface(args) => cmd_interface(&ctx, args).await,
        Command::Ordinal(args) => cmd_ordinal(&ctx, args).await,
        Command::Deps(args) => cmd_deps(&ctx, args).await,
        Command::Compat(args) => cmd_compat(&ctx, args).await,
        Command::Xref(args) => cmd_xref(&ctx, args).await,
        Command::Mcp => cmd_mcp(ctx.project).await,
        Command::Init => cmd_init(ctx.project.root()),
    }
}

/// Logs go to stderr so stdout carries only reports and the MCP transport.
/// `DECLMAP_LOG` takes precedence over `--verbose`.
fn init_tracing(verbose: bool) {
    let default = if verbose { "declmap=debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("DECLMAP_LOG").unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}
