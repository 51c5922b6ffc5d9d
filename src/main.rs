mod app;
mod browser;
mod cache;
mod chapters;
mod config;
mod constants;
mod expand;
mod input;
mod logging;
mod page;
mod pipeline;
mod presenter;
mod theme;
mod timestamp;
mod ui;
mod youtube;

use anyhow::{Context, Result, anyhow};
use clap::{CommandFactory, Parser, Subcommand};
use ratatui::{
  DefaultTerminal,
  crossterm::event::{self, Event, KeyEventKind},
};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use app::{App, SharedPipeline};
use browser::BrowserSession;
use cache::{FileStore, Store};
use config::Config;
use constants::Timing;
use page::{HtmlSnapshot, PageSession};
use pipeline::{Admission, ChapterPipeline, Origin, Request};
use presenter::View;
use youtube::PageIdentity;

// --- CLI ---

#[derive(Parser, Debug)]
#[command(author, version = env!("CARGO_PKG_VERSION"), about, long_about = None)]
struct Args {
  #[command(subcommand)]
  command: Command,

  /// Print chapters to stdout instead of opening the interactive list
  #[arg(short, long, global = true)]
  print: bool,

  /// Run on a detected page without asking first
  #[arg(short, long, global = true)]
  yes: bool,

  /// DevTools endpoint of a running browser (e.g. http://127.0.0.1:9222)
  #[arg(long, global = true, env = "CHROMIUM_REMOTE_DEBUGGING_URL")]
  remote: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Extract chapters from the active tab of a running browser
  Active,
  /// Extract chapters from a video link or id
  Link { target: String },
  /// Extract chapters from a saved HTML page
  File {
    path: PathBuf,
    /// Address to cache the result under (default: the page's canonical link)
    #[arg(long)]
    url: Option<String>,
  },
  /// Print shell completions
  Completions { shell: clap_complete::Shell },
}

// --- Entry points ---

/// Identity, session and timing for one request, however it was obtained.
struct Prepared {
  request: Request,
  session: Box<dyn PageSession>,
  timing: Timing,
}

async fn prepare(command: Command, remote: Option<String>) -> Result<Prepared> {
  match command {
    Command::Active => {
      let remote = remote.ok_or_else(|| {
        anyhow!(
          "Active tab detection needs a running browser. Start Chrome with --remote-debugging-port=9222 and pass \
           --remote http://127.0.0.1:9222 (or set CHROMIUM_REMOTE_DEBUGGING_URL)."
        )
      })?;
      let (session, identity) = BrowserSession::active_tab(&remote).await.context("Could not read the active tab")?;
      Ok(Prepared {
        request: Request { identity, origin: Origin::ActiveTab },
        session: Box::new(session),
        timing: Timing::from_constants(),
      })
    }
    Command::Link { target } => {
      let identity = youtube::resolve_link(&target)?;
      let session = BrowserSession::for_link(&identity, remote);
      Ok(Prepared {
        request: Request { identity, origin: Origin::Link },
        session: Box::new(session),
        timing: Timing::from_constants(),
      })
    }
    Command::File { path, url } => {
      let html = std::fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))?;
      let address = url.or_else(|| page::snapshot_address(&html)).unwrap_or_else(|| page::file_address(&path));
      Ok(Prepared {
        request: Request { identity: PageIdentity::new(address), origin: Origin::Snapshot },
        session: Box::new(HtmlSnapshot::new(html)),
        timing: Timing::immediate(),
      })
    }
    Command::Completions { .. } => Err(anyhow!("Completions do not open a page")),
  }
}

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();

  if let Command::Completions { shell } = args.command {
    clap_complete::generate(shell, &mut Args::command(), env!("CARGO_PKG_NAME"), &mut std::io::stdout());
    return Ok(());
  }

  let (log_path, _log_guard) = logging::init()?;
  let config = Config::load();
  let remote = args.remote.clone().or_else(|| config.remote_debugging_url.clone());
  info!(log = %log_path.display(), command = ?args.command, "ytchapters starting");

  let prepared = prepare(args.command, remote).await?;
  let store = FileStore::open_default().context("Failed to open the chapter cache")?;
  info!(cache = %store.path().display(), "cache opened");
  let store: Box<dyn Store> = Box::new(store);
  let pipeline: SharedPipeline = Arc::new(ChapterPipeline::new(store, prepared.timing));

  if args.print {
    return run_plain(prepared.request, prepared.session, &pipeline, args.yes).await;
  }

  let default_hook = std::panic::take_hook();
  std::panic::set_hook(Box::new(move |info| {
    ratatui::restore();
    default_hook(info);
  }));

  let mut app = App::new(prepared.request, prepared.session, pipeline, config);
  app.start();
  if args.yes {
    app.confirm(true);
  }

  let mut terminal = ratatui::init();
  let result = run(&mut terminal, &mut app);
  ratatui::restore();
  app.release_session().await;
  result
}

fn run(terminal: &mut DefaultTerminal, app: &mut App) -> Result<()> {
  loop {
    app.check_pending();
    app.expire_messages();

    terminal.draw(|frame| ui::ui(frame, app))?;

    if event::poll(Duration::from_millis(100))? {
      match event::read()? {
        Event::Key(key) if key.kind == KeyEventKind::Press => {
          input::handle_key_event(app, key);
        }
        _ => {}
      }
    }

    if app.should_quit {
      return Ok(());
    }
  }
}

/// `--print`: same pipeline, stdin for the confirmation gate, stdout for the view.
async fn run_plain(
  request: Request,
  mut session: Box<dyn PageSession>,
  pipeline: &SharedPipeline,
  assume_yes: bool,
) -> Result<()> {
  let view = match pipeline.admit(&request) {
    Admission::Cached(result) => presenter::present(&result),
    Admission::Unsupported => View::message(presenter::NOT_YOUTUBE),
    Admission::Confirm if !assume_yes && !ask(presenter::CONFIRM)? => View::message(presenter::CANCELLED),
    Admission::Confirm | Admission::Run => {
      eprintln!("{}", presenter::RUNNING);
      match pipeline.extract(&request.identity, session.as_mut()).await {
        Ok(result) => presenter::present(&result),
        Err(e) => View::error(e),
      }
    }
  };
  session.release().await;

  let mut stdout = std::io::stdout().lock();
  for line in view.to_lines() {
    writeln!(stdout, "{}", line)?;
  }
  Ok(())
}

fn ask(prompt: &str) -> Result<bool> {
  eprint!("{} [y/N] ", prompt);
  std::io::stderr().flush()?;
  let mut answer = String::new();
  std::io::stdin().lock().read_line(&mut answer).context("Failed to read answer")?;
  Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}
