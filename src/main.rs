use std::path::PathBuf;

use clap::{
    CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};

use withings_collector::{cli, config, types::AuthOptions};

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  author=env!("CARGO_PKG_AUTHORS"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    /// Env file holding credentials and tokens (default: local data dir)
    #[clap(long, global = true, value_name = "PATH")]
    env_file: Option<PathBuf>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Authorize with the Withings API and store the tokens
    Auth(AuthArgs),

    /// Exchange the stored refresh token for new tokens
    Refresh,

    /// Show which configuration keys are set
    Info,

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(Parser, Debug, Clone)]
pub struct AuthArgs {
    /// Catch the redirect with a local listener instead of pasting it
    #[clap(long)]
    listen: bool,

    /// Do not try to open the authorization URL in a browser
    #[clap(long)]
    no_browser: bool,

    /// Comma separated scopes (default: WITHINGS_SCOPE or user.metrics,user.activity)
    #[clap(long)]
    scope: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let env_path = config::env_path(cli.env_file);

    match cli.command {
        Command::Auth(opt) => {
            let options = AuthOptions {
                scope: opt.scope,
                open_browser: !opt.no_browser,
                listen: opt.listen,
            };
            cli::auth(env_path, options).await;
        }
        Command::Refresh => cli::refresh(env_path).await,
        Command::Info => cli::info(env_path).await,
        Command::Completions(opt) => {
            let mut cmd = Cli::command_for_update();
            let name = cmd.get_name().to_string();
            generate(opt.shell, &mut cmd, name, &mut std::io::stdout())
        }
    }
}
