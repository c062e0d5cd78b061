//! navfm: a line-driven directory navigator.
//!
//! This binary wires the core [`Navigator`] to stdin/stdout: every line is
//! parsed into a command, executed, and answered with the resulting
//! listing. Logs go to stderr, filtered by `NAVFM_LOG`.

mod input;
mod render;

use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::SystemTime;

use anyhow::{anyhow, Context};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use navfm_core::event::{Command, Event};
use navfm_core::fs::roots::{list_roots, spawn_root_poller};
use navfm_core::icon::{IconCache, IconResolver};
use navfm_core::nav::state::LoadOutcome;
use navfm_core::{resolve, Config, CoreError, DriveRoot, NativeHost, Navigator};

use crate::input::{parse_line, Input, HELP};

#[derive(Parser, Debug)]
#[command(name = "navfm", version, about = "Navigate directories from the terminal")]
struct Args {
    /// Directory to open (defaults to the working directory)
    path: Option<String>,

    /// Settings file (defaults to $NAVFM_CONFIG, then ~/.config/navfm/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print listings and roots as JSON
    #[arg(long)]
    json: bool,
}

/// Where to look for settings when no `--config` is given.
fn default_config_path(env_override: Option<OsString>, home: Option<PathBuf>) -> Option<PathBuf> {
    match env_override {
        Some(path) if !path.is_empty() => Some(PathBuf::from(path)),
        _ => home.map(|home| home.join(".config").join("navfm").join("config.toml")),
    }
}

/// Loads settings. An explicit path must exist; the default location may
/// be missing, in which case defaults apply.
fn load_config(explicit: Option<&Path>) -> anyhow::Result<Config> {
    if let Some(path) = explicit {
        return Config::load(path).with_context(|| format!("loading {}", path.display()));
    }
    let home = std::env::var_os("HOME").map(PathBuf::from);
    let Some(path) = default_config_path(std::env::var_os("NAVFM_CONFIG"), home) else {
        return Ok(Config::default());
    };
    match Config::load(&path) {
        Ok(config) => Ok(config),
        Err(CoreError::NotFound(_)) => Ok(Config::default()),
        Err(e) => Err(e).with_context(|| format!("loading {}", path.display())),
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_env("NAVFM_LOG").unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Interactive session state.
struct Session {
    navigator: Arc<Navigator<NativeHost>>,
    icons: IconResolver<NativeHost>,
    icon_cache: IconCache,
    roots: Arc<Mutex<Vec<DriveRoot>>>,
    json: bool,
}

impl Session {
    fn new(
        host: Arc<NativeHost>,
        config: &Config,
        events: Option<UnboundedSender<Event>>,
        json: bool,
    ) -> Self {
        let mut navigator = Navigator::new(Arc::clone(&host), config.view.preferences());
        if let Some(tx) = events {
            navigator = navigator.with_events(tx);
        }
        Self {
            navigator: Arc::new(navigator),
            icons: IconResolver::new(host, &config.icons),
            icon_cache: IconCache::new(),
            roots: Arc::new(Mutex::new(Vec::new())),
            json,
        }
    }

    /// Turns an entry argument into a path: absolute input is used as is,
    /// anything else is taken relative to the current directory.
    fn locate(&self, raw: &str) -> anyhow::Result<PathBuf> {
        if let Ok(path) = resolve(raw) {
            return Ok(path.as_path().to_path_buf());
        }
        let current = self
            .navigator
            .current_path()
            .ok_or_else(|| anyhow!("no directory loaded"))?;
        Ok(resolve(current.join(raw.trim()).as_str())?.as_path().to_path_buf())
    }

    fn print_listing(&self) -> anyhow::Result<()> {
        let entries = self.navigator.visible_entries();
        if self.json {
            println!("{}", serde_json::to_string_pretty(&entries)?);
            return Ok(());
        }
        let state = self.navigator.snapshot();
        if let Some(current) = state.current_path() {
            println!("{}", render::trail(current));
        }
        if let Some(failure) = state.error() {
            println!("  ({})", failure.message);
        }
        let prefs = self.navigator.preferences();
        let now = SystemTime::now();
        for entry in &entries {
            println!("{}", render::entry_line(entry, &prefs, now));
        }
        let search = self.navigator.search();
        if !search.is_empty() {
            println!("  filter: {search}");
        }
        Ok(())
    }

    async fn print_roots(&self) -> anyhow::Result<()> {
        let cached = self.roots.lock().unwrap_or_else(PoisonError::into_inner).clone();
        let roots = if cached.is_empty() {
            list_roots(self.navigator.host().as_ref()).await
        } else {
            cached
        };
        if self.json {
            println!("{}", serde_json::to_string_pretty(&roots)?);
        } else {
            for root in &roots {
                println!("{}", render::root_line(root));
            }
        }
        Ok(())
    }

    async fn print_icon(&self, raw: &str, refresh: bool) -> anyhow::Result<()> {
        let path = self.locate(raw)?;
        let icon = if refresh {
            self.icons.refresh_icon(&self.icon_cache, &path).await
        } else {
            self.icons.cached_icon(&self.icon_cache, &path).await
        };
        match icon {
            Some(icon) => {
                let url = icon.data_url();
                println!("{} ({} bytes, {} cached)", icon.mime, icon.bytes.len(), self.icon_cache.len());
                println!("{}", &url[..url.len().min(96)]);
            }
            None => println!("no icon for {}", path.display()),
        }
        Ok(())
    }

    /// Handles one input. Returns `false` when the session should end.
    async fn handle(&self, input: Input) -> anyhow::Result<bool> {
        match input {
            Input::Quit => return Ok(false),
            Input::Help => println!("{HELP}"),
            Input::List => self.print_listing()?,
            Input::Pwd => match self.navigator.current_path() {
                Some(current) => println!("{}", render::trail(&current)),
                None => println!("(nothing loaded)"),
            },
            Input::Roots => self.print_roots().await?,
            Input::Icon(raw) => self.print_icon(&raw, false).await?,
            Input::RefreshIcon(raw) => self.print_icon(&raw, true).await?,
            Input::Rename(from, to) => {
                let path = self.locate(&from)?;
                if self.navigator.execute(Command::Rename(path, to)).await.is_ok() {
                    self.print_listing()?;
                }
            }
            Input::Open(raw) => {
                let path = self.locate(&raw)?;
                // Failures are reported through the event stream.
                let _ = self.navigator.execute(Command::Open(path)).await;
            }
            Input::Core(Command::Navigate(raw)) => {
                let path = self.locate(&raw)?;
                let command = Command::Navigate(path.to_string_lossy().into_owned());
                self.run_core(command).await?;
            }
            Input::Core(command) => self.run_core(command).await?,
        }
        Ok(true)
    }

    async fn run_core(&self, command: Command) -> anyhow::Result<()> {
        match self.navigator.execute(command).await? {
            LoadOutcome::Failed(failure) => {
                eprintln!("cannot open {}: {}", failure.path.display(), failure.message);
            }
            _ => self.print_listing()?,
        }
        Ok(())
    }
}

/// Where the session starts: `arg` when given (relative to `cwd` unless
/// absolute), otherwise `cwd` itself.
fn start_location(arg: Option<String>, cwd: &Path) -> String {
    match arg {
        Some(raw) if resolve(&raw).is_ok() => raw,
        Some(raw) => cwd.join(raw.trim()).to_string_lossy().into_owned(),
        None => cwd.to_string_lossy().into_owned(),
    }
}

async fn report_events(mut rx: UnboundedReceiver<Event>, roots: Arc<Mutex<Vec<DriveRoot>>>) {
    while let Some(event) = rx.recv().await {
        match event {
            Event::RootsChanged(latest) => {
                tracing::debug!(count = latest.len(), "roots refreshed");
                *roots.lock().unwrap_or_else(PoisonError::into_inner) = latest;
            }
            Event::DirectoryLoaded { path, entries } => {
                tracing::debug!(path = %path, count = entries.len(), "directory loaded");
            }
            Event::LoadFailed(failure) => {
                tracing::debug!(path = %failure.path.display(), "load failed");
            }
            Event::Renamed { from, to } => {
                println!("renamed {} -> {}", from.display(), to.display());
            }
            Event::OperationFailed { operation, error } => {
                eprintln!("{operation} failed: {error}");
            }
            Event::ViewChanged => {}
        }
    }
}

fn prompt() {
    print!("> ");
    let _ = std::io::stdout().flush();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;

    let host = Arc::new(NativeHost::new());
    let (tx, rx) = mpsc::unbounded_channel();
    let session = Session::new(Arc::clone(&host), &config, Some(tx.clone()), args.json);
    tokio::spawn(report_events(rx, Arc::clone(&session.roots)));
    let poller = spawn_root_poller(host, config.drives.poll_interval(), tx);

    let cwd = std::env::current_dir().context("reading the working directory")?;
    let start = start_location(args.path, &cwd);
    session.handle(Input::Core(Command::Navigate(start))).await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    prompt();
    while let Some(line) = lines.next_line().await? {
        match parse_line(&line) {
            Ok(None) => {}
            Ok(Some(input)) => match session.handle(input).await {
                Ok(true) => {}
                Ok(false) => break,
                Err(e) => eprintln!("error: {e:#}"),
            },
            Err(message) => eprintln!("{message}"),
        }
        prompt();
    }

    poller.abort();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn env_override_wins_over_home() {
        let path = default_config_path(
            Some(OsString::from("/etc/navfm.toml")),
            Some(PathBuf::from("/home/me")),
        );
        assert_eq!(path, Some(PathBuf::from("/etc/navfm.toml")));
    }

    #[test]
    fn home_location_is_the_fallback() {
        let path = default_config_path(Some(OsString::new()), Some(PathBuf::from("/home/me")));
        assert_eq!(path, Some(PathBuf::from("/home/me/.config/navfm/config.toml")));
        assert_eq!(default_config_path(None, None), None);
    }

    #[test]
    fn start_location_resolves_relative_argument() {
        let cwd = Path::new("/work");
        assert_eq!(start_location(None, cwd), "/work");
        assert_eq!(start_location(Some("docs".into()), cwd), "/work/docs");
        assert_eq!(start_location(Some("/etc".into()), cwd), "/etc");
    }

    #[tokio::test]
    async fn cd_accepts_names_relative_to_current_directory() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("docs").join("api")).unwrap();
        let session = Session::new(Arc::new(NativeHost::new()), &Config::default(), None, false);
        let start = tmp.path().to_string_lossy().into_owned();
        session.handle(Input::Core(Command::Navigate(start))).await.unwrap();

        let cd = |line: &str| parse_line(line).unwrap().unwrap();
        assert!(session.handle(cd("cd docs")).await.unwrap());
        let here = session.navigator.current_path().unwrap();
        assert!(here.same_location(&tmp.path().join("docs").to_string_lossy()));

        session.handle(cd("cd api/..")).await.unwrap();
        let here = session.navigator.current_path().unwrap();
        assert!(here.same_location(&tmp.path().join("docs").to_string_lossy()));

        session.handle(cd("cd api")).await.unwrap();
        let here = session.navigator.current_path().unwrap();
        assert!(here.same_location(&tmp.path().join("docs").join("api").to_string_lossy()));
    }

    #[test]
    fn explicit_config_must_exist() {
        let tmp = TempDir::new().unwrap();
        assert!(load_config(Some(&tmp.path().join("missing.toml"))).is_err());

        let path = tmp.path().join("navfm.toml");
        fs::write(&path, "[view]\nshow_hidden = true\n").unwrap();
        assert!(load_config(Some(&path)).unwrap().view.show_hidden);
    }
}
