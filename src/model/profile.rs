use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Window-display hint applied when an entry is started.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StartMode {
    #[default]
    Normal,
    Minimized,
    Maximized,
}

impl std::fmt::Display for StartMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StartMode::Normal => write!(f, "Normal"),
            StartMode::Minimized => write!(f, "Minimized"),
            StartMode::Maximized => write!(f, "Maximized"),
        }
    }
}

impl std::str::FromStr for StartMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "normal" => Ok(StartMode::Normal),
            "minimized" | "min" => Ok(StartMode::Minimized),
            "maximized" | "max" => Ok(StartMode::Maximized),
            other => Err(format!(
                "unknown start mode '{}' (expected normal, minimized or maximized)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub path: String,
    #[serde(default)]
    pub delay_seconds: f64,
    #[serde(default)]
    pub start_mode: StartMode,
}

impl Entry {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            delay_seconds: 0.0,
            start_mode: StartMode::Normal,
        }
    }

    pub fn with_delay(mut self, seconds: f64) -> Self {
        self.delay_seconds = seconds;
        self
    }

    pub fn with_mode(mut self, mode: StartMode) -> Self {
        self.start_mode = mode;
        self
    }

    /// The path with surrounding whitespace and one pair of matching quotes removed.
    pub fn normalized_path(&self) -> &str {
        let trimmed = self.path.trim();
        for quote in ['"', '\''] {
            if let Some(inner) = trimmed
                .strip_prefix(quote)
                .and_then(|rest| rest.strip_suffix(quote))
            {
                return inner.trim();
            }
        }
        trimmed
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    #[serde(default)]
    pub entries: Vec<Entry>,
}

impl Profile {
    pub fn new(name: impl Into<String>, entries: Vec<Entry>) -> Self {
        Self {
            name: name.into(),
            entries,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::InvalidProfile("name must not be empty".into()));
        }
        if self.entries.is_empty() {
            return Err(Error::InvalidProfile(format!(
                "'{}' has no entries",
                self.name
            )));
        }
        for (i, entry) in self.entries.iter().enumerate() {
            if entry.normalized_path().is_empty() {
                return Err(Error::InvalidProfile(format!(
                    "'{}' entry {} has an empty path",
                    self.name,
                    i + 1
                )));
            }
            if !entry.delay_seconds.is_finite() || entry.delay_seconds < 0.0 {
                return Err(Error::InvalidProfile(format!(
                    "'{}' entry {} has invalid delay {}",
                    self.name,
                    i + 1,
                    entry.delay_seconds
                )));
            }
        }
        Ok(())
    }
}

/// Profiles keyed by name, kept in display order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<Profile>", into = "Vec<Profile>")]
pub struct ProfileCollection {
    profiles: Vec<Profile>,
}

impl ProfileCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Profile> {
        self.profiles.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.profiles.iter().map(|p| p.name.as_str())
    }

    pub fn get(&self, name: &str) -> Option<&Profile> {
        self.profiles.iter().find(|p| p.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Replaces the profile with the same name in place, or appends it.
    /// Returns the replaced profile.
    pub fn upsert(&mut self, profile: Profile) -> Option<Profile> {
        match self.profiles.iter_mut().find(|p| p.name == profile.name) {
            Some(slot) => Some(std::mem::replace(slot, profile)),
            None => {
                self.profiles.push(profile);
                None
            }
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<Profile> {
        let pos = self.profiles.iter().position(|p| p.name == name)?;
        Some(self.profiles.remove(pos))
    }

    /// Appends every profile of `other` whose name is not present yet.
    /// Returns how many were added.
    pub fn merge(&mut self, other: ProfileCollection) -> usize {
        let mut added = 0;
        for profile in other.profiles {
            if !self.contains(&profile.name) {
                self.profiles.push(profile);
                added += 1;
            }
        }
        added
    }
}

impl From<Vec<Profile>> for ProfileCollection {
    fn from(list: Vec<Profile>) -> Self {
        let mut collection = ProfileCollection::new();
        for profile in list {
            let name = profile.name.clone();
            if collection.upsert(profile).is_some() {
                log::warn!("Duplicate profile '{}' in document, keeping the later one", name);
            }
        }
        collection
    }
}

impl From<ProfileCollection> for Vec<Profile> {
    fn from(collection: ProfileCollection) -> Self {
        collection.profiles
    }
}

impl<'a> IntoIterator for &'a ProfileCollection {
    type Item = &'a Profile;
    type IntoIter = std::slice::Iter<'a, Profile>;

    fn into_iter(self) -> Self::IntoIter {
        self.profiles.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(name: &str) -> Profile {
        Profile::new(name, vec![Entry::new("/usr/bin/true")])
    }

    #[test]
    fn empty_entries_are_invalid() {
        let err = Profile::new("Work", vec![]).validate().unwrap_err();
        assert!(matches!(err, Error::InvalidProfile(_)));
    }

    #[test]
    fn blank_name_is_invalid() {
        let err = sample("   ").validate().unwrap_err();
        assert!(matches!(err, Error::InvalidProfile(_)));
    }

    #[test]
    fn negative_delay_is_invalid() {
        let profile = Profile::new("Work", vec![Entry::new("a").with_delay(-1.0)]);
        assert!(matches!(profile.validate(), Err(Error::InvalidProfile(_))));

        let profile = Profile::new("Work", vec![Entry::new("a").with_delay(f64::NAN)]);
        assert!(matches!(profile.validate(), Err(Error::InvalidProfile(_))));
    }

    #[test]
    fn normalized_path_strips_quotes_and_whitespace() {
        assert_eq!(Entry::new("  \"C:\\Apps\\x.exe\" ").normalized_path(), "C:\\Apps\\x.exe");
        assert_eq!(Entry::new("'/opt/tool'").normalized_path(), "/opt/tool");
        assert_eq!(Entry::new("\"unbalanced").normalized_path(), "\"unbalanced");
    }

    #[test]
    fn upsert_replaces_in_place() {
        let mut c = ProfileCollection::new();
        c.upsert(sample("a"));
        c.upsert(sample("b"));
        let replaced = c.upsert(Profile::new("a", vec![Entry::new("x"), Entry::new("y")]));

        assert!(replaced.is_some());
        assert_eq!(c.names().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(c.get("a").map(|p| p.entries.len()), Some(2));
    }

    #[test]
    fn names_are_case_sensitive() {
        let mut c = ProfileCollection::new();
        c.upsert(sample("Work"));
        c.upsert(sample("work"));
        assert_eq!(c.len(), 2);
    }

    #[test]
    fn merge_skips_existing_names() {
        let mut c = ProfileCollection::from(vec![sample("a")]);
        let incoming = ProfileCollection::from(vec![
            Profile::new("a", vec![Entry::new("other")]),
            sample("b"),
        ]);

        assert_eq!(c.merge(incoming), 1);
        assert_eq!(c.get("a").map(|p| p.entries[0].path.as_str()), Some("/usr/bin/true"));
        assert!(c.contains("b"));
    }

    #[test]
    fn deserializes_start_mode_and_defaults() {
        let json = r#"[{"name":"Dev","entries":[
            {"path":"code","delay_seconds":2.5,"start_mode":"Maximized"},
            {"path":"term"}
        ]}]"#;
        let c: ProfileCollection = serde_json::from_str(json).unwrap();
        let dev = c.get("Dev").unwrap();

        assert_eq!(dev.entries[0].start_mode, StartMode::Maximized);
        assert_eq!(dev.entries[0].delay_seconds, 2.5);
        assert_eq!(dev.entries[1].start_mode, StartMode::Normal);
        assert_eq!(dev.entries[1].delay_seconds, 0.0);
    }

    #[test]
    fn duplicate_names_in_document_keep_later_definition() {
        let json = r#"[
            {"name":"a","entries":[{"path":"first"}]},
            {"name":"b","entries":[{"path":"b"}]},
            {"name":"a","entries":[{"path":"second"}]}
        ]"#;
        let c: ProfileCollection = serde_json::from_str(json).unwrap();

        assert_eq!(c.names().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(c.get("a").unwrap().entries[0].path, "second");
    }
}
