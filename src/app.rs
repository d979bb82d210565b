use std::path::PathBuf;
use std::sync::Arc;

use crate::backend::{
    transfer, ImportMode, LaunchEngine, LaunchWorker, ProfileStore, SettingsStore,
};
use crate::config::AppDirs;
use crate::error::{Error, Result};
use crate::logging;
use crate::model::{Entry, LaunchEvent, Profile, StartMode, Theme};

pub const USAGE: &str = "\
Usage: app-launcher [COMMAND]

Commands:
  --list                         List saved profiles (default)
  --show <name>                  Show the entries of a profile
  --launch <name>                Start every entry of a profile in order
  --add <name> <path> [--delay <secs>] [--mode normal|minimized|maximized] [<path> ...]
                                 Create or replace a profile; options apply to the preceding path
  --remove <name>                Delete a profile
  --theme [light|dark|toggle]    Show or change the theme
  --debug-log on|off             Write a debug log to log.txt in the data directory
  --export <file>                Write all profiles to a JSON file
  --import <file> [--replace]    Merge (or replace) profiles from a JSON file
  --reset                        Move an unreadable launches.json aside and start empty
  --help                         Show this message
";

#[derive(Debug, Clone, PartialEq)]
pub enum ThemeChange {
    Set(Theme),
    Toggle,
}

/// One user request, parsed from the command line.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    List,
    Show(String),
    Launch(String),
    Add(Profile),
    Remove(String),
    Theme(Option<ThemeChange>),
    DebugLog(bool),
    Export(PathBuf),
    Import { path: PathBuf, mode: ImportMode },
    Reset,
    Help,
}

impl Command {
    pub fn parse(args: &[String]) -> std::result::Result<Self, String> {
        let mut it = args.iter().map(String::as_str);
        let Some(flag) = it.next() else {
            return Ok(Command::List);
        };

        let mut value = |what: &str| {
            it.next()
                .map(str::to_string)
                .ok_or_else(|| format!("{} requires {}", flag, what))
        };

        let command = match flag {
            "--list" => Command::List,
            "--show" => Command::Show(value("a profile name")?),
            "--launch" => Command::Launch(value("a profile name")?),
            "--remove" => Command::Remove(value("a profile name")?),
            "--add" => return parse_add(&args[1..]),
            "--theme" => match args.get(1).map(String::as_str) {
                None => Command::Theme(None),
                Some("toggle") => Command::Theme(Some(ThemeChange::Toggle)),
                Some(v) => Command::Theme(Some(ThemeChange::Set(v.parse()?))),
            },
            "--debug-log" => match value("on or off")?.as_str() {
                "on" => Command::DebugLog(true),
                "off" => Command::DebugLog(false),
                other => return Err(format!("--debug-log expects on or off, got '{}'", other)),
            },
            "--export" => Command::Export(value("a file path")?.into()),
            "--import" => {
                let path: PathBuf = value("a file path")?.into();
                let mode = match args.get(2).map(String::as_str) {
                    Some("--replace") => ImportMode::Replace,
                    _ => ImportMode::Merge,
                };
                Command::Import { path, mode }
            }
            "--reset" => Command::Reset,
            "--help" | "-h" => Command::Help,
            other => return Err(format!("unknown command '{}'", other)),
        };

        let consumed = match &command {
            Command::List | Command::Reset | Command::Help | Command::Theme(None) => 1,
            Command::Import {
                mode: ImportMode::Replace,
                ..
            } => 3,
            _ => 2,
        };
        match args.get(consumed) {
            Some(extra) => Err(format!("unexpected argument '{}'", extra)),
            None => Ok(command),
        }
    }
}

fn parse_add(args: &[String]) -> std::result::Result<Command, String> {
    let mut it = args.iter();
    let name = it.next().ok_or("--add requires a profile name")?.clone();
    let mut entries: Vec<Entry> = Vec::new();

    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--delay" | "--mode" => {
                let value = it.next().ok_or_else(|| format!("{} requires a value", arg))?;
                let entry = entries
                    .last_mut()
                    .ok_or_else(|| format!("{} must follow a path", arg))?;
                if arg == "--delay" {
                    entry.delay_seconds = value
                        .parse()
                        .map_err(|_| format!("invalid delay '{}'", value))?;
                } else {
                    entry.start_mode = value.parse::<StartMode>()?;
                }
            }
            path => entries.push(Entry::new(path)),
        }
    }

    Ok(Command::Add(Profile::new(name, entries)))
}

/// Headless front end over the stores and the launch engine.
pub struct LauncherApp {
    dirs: AppDirs,
    settings: SettingsStore,
}

impl LauncherApp {
    pub fn new(dirs: AppDirs) -> Self {
        let settings = SettingsStore::load(dirs.settings_file());
        logging::init(&dirs, settings.settings());
        log::debug!("Data directory: {}", dirs.data_dir().display());
        Self { dirs, settings }
    }

    /// Execute `command` and return the process exit code.
    pub fn run(mut self, command: Command) -> i32 {
        match self.execute(command) {
            Ok(code) => code,
            Err(e) => {
                log::error!("{}", e);
                eprintln!("error: {}", e);
                if e.is_corrupt() {
                    eprintln!("run with --reset to move the file aside and start over");
                }
                1
            }
        }
    }

    fn open_profiles(&self) -> Result<ProfileStore> {
        ProfileStore::open(self.dirs.profiles_file())
    }

    fn execute(&mut self, command: Command) -> Result<i32> {
        match command {
            Command::Help => print!("{}", USAGE),
            Command::List => {
                let store = self.open_profiles()?;
                if store.profiles().is_empty() {
                    println!("No profiles saved in {}", store.path().display());
                }
                for profile in store.profiles() {
                    println!("{}  ({} entries)", profile.name, profile.entries.len());
                }
            }
            Command::Show(name) => {
                let store = self.open_profiles()?;
                let Some(profile) = store.get(&name) else {
                    eprintln!("No profile named '{}'", name);
                    return Ok(1);
                };
                for (i, e) in profile.entries.iter().enumerate() {
                    println!(
                        "{:>2}. {}  delay {}s  {}",
                        i + 1,
                        e.path,
                        e.delay_seconds,
                        e.start_mode
                    );
                }
            }
            Command::Launch(name) => return self.launch(&name),
            Command::Add(profile) => {
                let name = profile.name.clone();
                self.open_profiles()?.add_or_update(profile)?;
                println!("Saved profile '{}'", name);
            }
            Command::Remove(name) => {
                self.open_profiles()?.remove(&name)?;
                println!("Removed profile '{}'", name);
            }
            Command::Theme(change) => {
                let theme = match change {
                    None => self.settings.load_theme(),
                    Some(ThemeChange::Toggle) => {
                        let next = self.settings.load_theme().toggled();
                        self.settings.save_theme(next)?;
                        next
                    }
                    Some(ThemeChange::Set(theme)) => {
                        self.settings.save_theme(theme)?;
                        theme
                    }
                };
                println!("Theme: {}", theme);
            }
            Command::DebugLog(enabled) => {
                self.settings.set_debug_logging(enabled)?;
                println!(
                    "Debug logging {} ({})",
                    if enabled { "on" } else { "off" },
                    self.dirs.log_file().display()
                );
            }
            Command::Export(path) => {
                let store = self.open_profiles()?;
                transfer::export(store.profiles(), &path)?;
                println!("Exported {} profile(s) to {}", store.profiles().len(), path.display());
            }
            Command::Import { path, mode } => {
                let incoming = transfer::import(&path)?;
                let taken = self.open_profiles()?.import(incoming, mode)?;
                println!("Imported {} profile(s)", taken);
            }
            Command::Reset => {
                let mut store = ProfileStore::empty(self.dirs.profiles_file());
                let backup = store.backup_and_reset()?;
                println!("Started with no profiles; previous file kept at {}", backup.display());
            }
        }
        Ok(0)
    }

    fn launch(&self, name: &str) -> Result<i32> {
        let store = self.open_profiles()?;
        let Some(profile) = store.get(name).cloned() else {
            eprintln!("No profile named '{}'", name);
            return Ok(1);
        };

        let engine = Arc::new(LaunchEngine::new());
        let handle = LaunchWorker::spawn(engine, profile)
            .map_err(|e| Error::io(self.dirs.data_dir(), e))?;

        let report = handle.wait_with(|event| match event {
            LaunchEvent::Starting {
                index,
                total,
                path,
                mode,
            } => println!("Launching {}/{}: {} ({})", index + 1, total, path, mode),
            LaunchEvent::Waiting { remaining, .. } => {
                println!("Waiting {}s before next...", remaining.as_secs_f64().ceil())
            }
            LaunchEvent::Failed { message, .. } => eprintln!("{}", message),
            LaunchEvent::Launched { .. } => {}
        });

        let Some(report) = report else {
            eprintln!("Launch of '{}' aborted", name);
            return Ok(1);
        };
        let total = report.outcomes.len();
        println!("{} launched: {}/{} started", name, report.succeeded(), total);
        Ok(if report.all_succeeded() { 0 } else { 1 })
    }
}
