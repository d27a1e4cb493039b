use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Refresh-rate node exported by the display driver.
pub const MEASURED_FPS: &str = "/sys/module/primary_display/parameters/display_framerate_main";

const READ_BUFFER_BYTES: usize = 512;

/// One sample of the counter, or its absence when the read failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reading {
    Present(String),
    Absent,
}

impl Reading {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Reading::Present(text) => Some(text),
            Reading::Absent => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Reading::Absent)
    }
}

impl From<Option<String>> for Reading {
    fn from(value: Option<String>) -> Self {
        value.map_or(Reading::Absent, Reading::Present)
    }
}

/// Anything that can produce a single reading on demand. Never fails: errors become `Absent`.
pub trait ReadingSource: Send + Sync {
    fn read(&self) -> Reading;
}

/// Reads the first line of a virtual counter file.
#[derive(Debug, Clone)]
pub struct SysfsCounter {
    path: PathBuf,
}

impl SysfsCounter {
    pub fn new() -> Self {
        Self::at(MEASURED_FPS)
    }

    pub fn at(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for SysfsCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReadingSource for SysfsCounter {
    fn read(&self) -> Reading {
        match read_one_line(&self.path) {
            Ok(line) => line.into(),
            Err(err) => {
                log::debug!("read {} failed: {err}", self.path.display());
                Reading::Absent
            }
        }
    }
}

/// Returns `Ok(None)` at EOF so an empty node is treated like a failed read.
fn read_one_line(path: &Path) -> std::io::Result<Option<String>> {
    let file = File::open(path)?;
    let mut reader = BufReader::with_capacity(READ_BUFFER_BYTES, file);
    let mut line = String::new();
    if reader.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    let trimmed = line.trim_end_matches(['\n', '\r']).len();
    line.truncate(trimmed);
    Ok(Some(line))
}

/// Source that replays a fixed script and then reports `Absent`. Used by tests and demos.
#[derive(Default)]
pub struct ScriptedSource {
    script: Mutex<VecDeque<Reading>>,
    reads: AtomicUsize,
}

impl ScriptedSource {
    pub fn new(script: Vec<Reading>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            reads: AtomicUsize::new(0),
        }
    }

    pub fn push(&self, reading: Reading) {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(reading);
        }
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

impl ReadingSource for ScriptedSource {
    fn read(&self) -> Reading {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.script
            .lock()
            .ok()
            .and_then(|mut script| script.pop_front())
            .unwrap_or(Reading::Absent)
    }
}
