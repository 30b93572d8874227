use clap::{
    CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};

use plmatch::{cli, config, error, logging, pipeline::Pipeline};

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
    /// Compare two playlists, links or exported files
    Compare(CompareOptions),

    /// List the tracks of one playlist or exported file
    Fetch(FetchOptions),

    /// Show the canonical form of a playlist link
    Resolve(ResolveOptions),

    /// Run the HTTP dialog server
    Serve(ServeOptions),

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(Parser, Debug, Clone)]
pub struct CompareOptions {
    /// First playlist: a link, an embed snippet or a path to a .txt export
    first: String,

    /// Second playlist
    second: String,

    /// Only print the summary, not the shared tracks
    #[clap(long)]
    no_matches: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct FetchOptions {
    /// A link, an embed snippet or a path to a .txt export
    reference: String,
}

#[derive(Parser, Debug, Clone)]
pub struct ResolveOptions {
    /// Text containing a playlist link
    text: String,
}

#[derive(Parser, Debug, Clone)]
pub struct ServeOptions {
    /// Address to bind, overrides SERVER_ADDRESS
    #[clap(long)]
    addr: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

#[tokio::main]
async fn main() {
    if let Err(e) = config::load_env().await {
        error!("Cannot load environment. Err: {}", e);
    }
    logging::init_logging(logging::DEFAULT_DIRECTIVE);

    let cli = Cli::parse();

    if let Command::Completions(opt) = &cli.command {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        generate(opt.shell, &mut cmd, name, &mut std::io::stdout());
        return;
    }

    let pipeline = match Pipeline::new(config::Config::from_env()) {
        Ok(pipeline) => pipeline,
        Err(e) => error!("Cannot build the HTTP client. Err: {}", e),
    };

    match cli.command {
        Command::Compare(opt) => {
            cli::compare(&pipeline, opt.first, opt.second, !opt.no_matches).await
        }
        Command::Fetch(opt) => cli::fetch(&pipeline, opt.reference).await,
        Command::Resolve(opt) => cli::resolve(&pipeline, opt.text).await,
        Command::Serve(opt) => cli::serve(pipeline, opt.addr).await,
        Command::Completions(_) => {}
    }
}
