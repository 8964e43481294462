use std::path::PathBuf;

use clap::{
    CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};

use spotlikes::{cli, config, error, warning};

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
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Search for an artist
    Search(SearchOptions),

    /// Get all liked songs
    Likes(LikesOptions),

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(Parser, Debug, Clone)]
pub struct SearchOptions {
    /// Artist name to look up
    pub artist_name: String,
}

#[derive(Parser, Debug, Clone)]
pub struct LikesOptions {
    /// Where to write the JSON list of track names
    #[clap(long)]
    pub output: Option<PathBuf>,
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

#[tokio::main]
async fn main() {
    if let Err(e) = config::load_env().await {
        warning!("Cannot load environment. Err: {}", e);
    }

    let args = Cli::parse();

    if let Command::Completions(opt) = &args.command {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        generate(opt.shell, &mut cmd, name, &mut std::io::stdout());
        return;
    }

    let mut config = match config::Config::from_env() {
        Ok(config) => config,
        Err(e) => error!("{}", e),
    };

    match args.command {
        Command::Search(opt) => {
            if let Err(e) = cli::search(&config, &opt.artist_name).await {
                error!("Cannot search for artist. Err: {}", e);
            }
        }
        Command::Likes(opt) => {
            if let Some(output) = opt.output {
                config.output = output;
            }
            if let Err(e) = cli::likes(&config).await {
                error!("Cannot fetch liked songs. Err: {}", e);
            }
        }
        Command::Completions(_) => {}
    }
}
