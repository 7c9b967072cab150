use std::{
    collections::{hash_map, HashMap, HashSet},
    fs::File,
    io::{self, BufRead, BufReader},
    path::{Path, PathBuf},
    time::SystemTime,
};

use log::{debug, trace, warn};

use crate::error::{ControlError, Result};

/// Anything settings can be looked up in by name.
pub trait SettingSource {
    fn setting(&self, name: &str) -> Result<String>;
}

/// A control file on disk. Every lookup re-reads the file.
#[derive(Debug, Clone, Copy)]
pub struct ControlPath<'a>(pub &'a Path);

impl SettingSource for ControlPath<'_> {
    fn setting(&self, name: &str) -> Result<String> {
        read_from_control(self.0, name)
    }
}

/// A non-comment line of a control file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// 1-based line number.
    pub line: usize,
    pub key: String,
    /// `None` when the line has no `|`.
    pub value: Option<String>,
}

impl Entry {
    /// Parses a raw line, returning `None` for lines starting with `#`.
    pub fn parse(line: usize, raw: &str) -> Option<Entry> {
        if raw.starts_with('#') {
            return None;
        }
        let (key, value) = match raw.split_once('|') {
            Some((key, rest)) => (key, Some(clean_value(rest))),
            None => (raw, None),
        };
        Some(Entry {
            line,
            key: key.trim().to_string(),
            value,
        })
    }

    fn value_in(&self, path: &Path) -> Result<&str> {
        self.value
            .as_deref()
            .ok_or_else(|| ControlError::MalformedLine {
                setting: self.key.clone(),
                line: self.line,
                path: path.to_path_buf(),
            })
    }
}

/// Drops a trailing `# comment` and surrounding whitespace.
fn clean_value(raw: &str) -> String {
    raw.split_once('#')
        .map_or(raw, |(value, _comment)| value)
        .trim()
        .to_string()
}

/// Looks up `setting` in the control file at `control_file`.
///
/// The first line whose key matches and which does not start with `#` wins.
pub fn read_from_control(control_file: &Path, setting: &str) -> Result<String> {
    let file =
        File::open(control_file).map_err(|e| ControlError::io(control_file, e))?;

    for (i, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|e| ControlError::io(control_file, e))?;
        let Some(entry) = Entry::parse(i + 1, &line) else {
            continue;
        };
        if entry.key == setting {
            let value = entry.value_in(control_file)?.to_string();
            trace!(
                "{}:{}: {} = '{}'",
                control_file.display(),
                entry.line,
                setting,
                value
            );
            return Ok(value);
        }
    }

    Err(ControlError::SettingNotFound {
        setting: setting.to_string(),
        path: control_file.to_path_buf(),
    })
}

/// A control file parsed into memory.
#[derive(Debug, Clone)]
pub struct ControlFile {
    path: PathBuf,
    entries: Vec<Entry>,
    unreadable: Option<Unreadable>,
}

/// First line that could not be read. Parsing stops there, the same way
/// [`read_from_control`] stops scanning.
#[derive(Debug, Clone)]
struct Unreadable {
    line: usize,
    kind: io::ErrorKind,
    message: String,
}

impl ControlFile {
    pub fn load(path: &Path) -> Result<ControlFile> {
        let file = File::open(path).map_err(|e| ControlError::io(path, e))?;

        let mut entries = Vec::new();
        let mut unreadable = None;
        for (i, line) in BufReader::new(file).lines().enumerate() {
            match line {
                Ok(line) => entries.extend(Entry::parse(i + 1, &line)),
                Err(e) => {
                    warn!("{}:{}: {}", path.display(), i + 1, e);
                    unreadable = Some(Unreadable {
                        line: i + 1,
                        kind: e.kind(),
                        message: e.to_string(),
                    });
                    break;
                }
            }
        }

        debug!("Loaded {} entries from {}", entries.len(), path.display());
        Ok(ControlFile {
            path: path.to_path_buf(),
            entries,
            unreadable,
        })
    }

    /// `path` is only used for error messages.
    pub fn parse(path: &Path, text: &str) -> ControlFile {
        let entries = text
            .lines()
            .enumerate()
            .filter_map(|(i, line)| Entry::parse(i + 1, line))
            .collect();
        ControlFile {
            path: path.to_path_buf(),
            entries,
            unreadable: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Same lookup rules as [`read_from_control`]. A setting that is not found
    /// before an unreadable line reports the read error instead.
    pub fn get(&self, setting: &str) -> Result<&str> {
        let Some(entry) = self.entries.iter().find(|e| e.key == setting) else {
            return Err(match &self.unreadable {
                Some(u) => ControlError::Io {
                    path: self.path.clone(),
                    source: io::Error::new(
                        u.kind,
                        format!("line {}: {}", u.line, u.message),
                    ),
                },
                None => ControlError::SettingNotFound {
                    setting: setting.to_string(),
                    path: self.path.clone(),
                },
            });
        };
        entry.value_in(&self.path)
    }

    /// Well-formed settings in file order. Later duplicates of a key are
    /// shadowed by its first occurrence, and a key whose first occurrence is
    /// malformed is left out.
    pub fn settings(&self) -> impl Iterator<Item = (&str, &str)> {
        let mut seen = HashSet::new();
        self.entries.iter().filter_map(move |e| {
            if !seen.insert(e.key.as_str()) {
                return None;
            }
            e.value.as_deref().map(|v| (e.key.as_str(), v))
        })
    }
}

impl SettingSource for ControlFile {
    fn setting(&self, name: &str) -> Result<String> {
        self.get(name).map(str::to_string)
    }
}

#[derive(Debug)]
struct Cached {
    modified: Option<SystemTime>,
    file: ControlFile,
}

/// Parsed control files keyed by path, reloaded when the file's
/// modification time changes.
#[derive(Debug, Default)]
pub struct ControlCache {
    files: HashMap<PathBuf, Cached>,
}

impl ControlCache {
    pub fn new() -> ControlCache {
        ControlCache::default()
    }

    pub fn get(&mut self, path: &Path) -> Result<&ControlFile> {
        let modified = std::fs::metadata(path)
            .map_err(|e| ControlError::io(path, e))?
            .modified()
            .ok();

        match self.files.entry(path.to_path_buf()) {
            hash_map::Entry::Occupied(occupied) => {
                let cached = occupied.into_mut();
                if cached.modified.is_none() || cached.modified != modified {
                    debug!("Reloading control file {}", path.display());
                    *cached = Cached {
                        modified,
                        file: ControlFile::load(path)?,
                    };
                }
                Ok(&cached.file)
            }
            hash_map::Entry::Vacant(vacant) => {
                debug!("Loading control file {}", path.display());
                let cached = vacant.insert(Cached {
                    modified,
                    file: ControlFile::load(path)?,
                });
                Ok(&cached.file)
            }
        }
    }

    pub fn read(&mut self, path: &Path, setting: &str) -> Result<String> {
        self.get(path)?.setting(setting)
    }

    /// Forgets `path`, forcing the next lookup to re-read it.
    pub fn invalidate(&mut self, path: &Path) {
        self.files.remove(path);
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
