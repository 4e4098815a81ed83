use std::{
    collections::BTreeMap,
    fs::{self, File},
    io::{self, Write},
    path::{Path, PathBuf},
};

use serde_json::Value;

/// A durable key-value medium. Writes have to be complete when `put`
/// returns `Ok`.
pub trait KeyValueBackend: Send {
    fn get(&self, key: &str) -> io::Result<Option<Value>>;
    fn put(&mut self, key: &str, value: Value) -> io::Result<()>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    entries: BTreeMap<String, Value>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueBackend for MemoryBackend {
    fn get(&self, key: &str) -> io::Result<Option<Value>> {
        Ok(self.entries.get(key).cloned())
    }

    fn put(&mut self, key: &str, value: Value) -> io::Result<()> {
        self.entries.insert(key.to_owned(), value);
        Ok(())
    }
}

/// All entries in a single JSON object on disk. Every `put` writes a
/// temporary sibling, syncs it to disk and renames it over the file, so a
/// failed write leaves the previous file in place.
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
    entries: BTreeMap<String, Value>,
}

impl FileBackend {
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = match fs::read(&path) {
            Ok(content) if content.iter().all(u8::is_ascii_whitespace) => {
                BTreeMap::new()
            }
            Ok(content) => serde_json::from_slice(&content)
                .map_err(|why| io::Error::new(io::ErrorKind::InvalidData, why))?,
            Err(why) if why.kind() == io::ErrorKind::NotFound => {
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent)?;
                }
                BTreeMap::new()
            }
            Err(why) => return Err(why),
        };
        log::info!("quota store at {} ({} entries)", path.display(), entries.len());
        Ok(Self { path, entries })
    }

    fn write(&self, entries: &BTreeMap<String, Value>) -> io::Result<()> {
        let content = serde_json::to_vec_pretty(entries)
            .map_err(|why| io::Error::new(io::ErrorKind::InvalidData, why))?;
        let mut temporary = self.path.clone().into_os_string();
        temporary.push(".tmp");
        let temporary = PathBuf::from(temporary);
        let mut file = File::create(&temporary)?;
        file.write_all(&content)?;
        file.sync_all()?;
        fs::rename(&temporary, &self.path)
    }
}

impl KeyValueBackend for FileBackend {
    fn get(&self, key: &str) -> io::Result<Option<Value>> {
        Ok(self.entries.get(key).cloned())
    }

    fn put(&mut self, key: &str, value: Value) -> io::Result<()> {
        let mut entries = self.entries.clone();
        entries.insert(key.to_owned(), value);
        self.write(&entries)?;
        self.entries = entries;
        Ok(())
    }
}
