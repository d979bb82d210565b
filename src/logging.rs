use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use env_logger::{Builder, Env, Target, WriteStyle};

use crate::config::AppDirs;
use crate::model::Settings;

const MAX_LOG_BYTES: u64 = 1_000_000;

/// Install the global logger. `RUST_LOG` wins over the defaults; with debug
/// logging enabled, output goes to `log.txt` in the data directory.
pub fn init(dirs: &AppDirs, settings: &Settings) {
    let default_level = if settings.debug_logging { "debug" } else { "info" };
    let mut builder = Builder::from_env(Env::default().default_filter_or(default_level));

    if settings.debug_logging {
        match open_log_file(&dirs.log_file()) {
            Ok(file) => {
                builder
                    .target(Target::Pipe(Box::new(file)))
                    .write_style(WriteStyle::Never);
            }
            Err(e) => eprintln!(
                "cannot open {}: {}, logging to stderr",
                dirs.log_file().display(),
                e
            ),
        }
    }

    if let Err(e) = builder.try_init() {
        eprintln!("logger already initialized: {}", e);
    }
}

/// Open the log for appending, starting over once it passes `MAX_LOG_BYTES`.
fn open_log_file(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let oversized = fs::metadata(path)
        .map(|m| m.len() > MAX_LOG_BYTES)
        .unwrap_or(false);
    if oversized {
        let mut file = File::create(path)?;
        writeln!(file, "log truncated (exceeded {} bytes)", MAX_LOG_BYTES)?;
        return Ok(file);
    }

    OpenOptions::new().create(true).append(true).open(path)
}
