mod atomic;
mod launch_engine;
mod launch_worker;
mod profile_store;
mod settings_store;
mod spawn;
pub mod transfer;

pub use launch_engine::{CancelToken, LaunchEngine};
pub use launch_worker::{LaunchHandle, LaunchWorker, WorkerEvent};
pub use profile_store::ProfileStore;
pub use settings_store::SettingsStore;
pub use spawn::{OsSpawner, Spawner};
pub use transfer::ImportMode;
