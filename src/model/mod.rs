mod outcome;
mod profile;
mod settings;

pub use outcome::{LaunchEvent, LaunchFailure, LaunchOutcome, LaunchReport};
pub use profile::{Entry, Profile, ProfileCollection, StartMode};
pub use settings::{Settings, Theme};
