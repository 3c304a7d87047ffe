//! The collaborators the interpreter talks to.
//!
//! The core never touches the terminal or the filesystem directly: program
//! sources, interactive input, printed values and data files all go through
//! a [`Devices`] implementation.

use std::collections::{HashMap, VecDeque};
use std::fmt::{self, Display};
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A value reported by `print` or `printFromTo`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Output {
    Integer(i64),
    Text(String),
    Sequence(Vec<i64>),
}

impl Display for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Output::Integer(value) => write!(f, "Integer variable : {value}"),
            Output::Text(value) => write!(f, "String variable: {value}"),
            Output::Sequence(values) => {
                let values: Vec<String> = values.iter().map(i64::to_string).collect();
                write!(f, "{}", values.join(" "))
            }
        }
    }
}

/// I/O collaborators consumed by the simulator.
pub trait Devices: Send {
    /// Returns the whole text of the named instruction source.
    fn open_program(&mut self, name: &str) -> io::Result<String>;

    /// Prompts for the value of `variable` and returns one line, without
    /// its line terminator.
    fn read_input(&mut self, variable: &str) -> io::Result<String>;

    /// Reports a printed value.
    fn print(&mut self, output: Output);

    fn file_exists(&self, name: &str) -> bool;

    /// Returns the first line of a data file, without its line terminator.
    fn read_first_line(&mut self, name: &str) -> io::Result<String>;

    /// Truncates the data file and writes `content` verbatim.
    fn write_file(&mut self, name: &str, content: &str) -> io::Result<()>;
}

/// Devices backed by the host filesystem and the process' stdin/stdout.
///
/// Names are resolved relative to `root`.
#[derive(Debug, Clone)]
pub struct HostDevices {
    root: PathBuf,
}

impl HostDevices {
    pub fn new(root: impl Into<PathBuf>) -> HostDevices {
        HostDevices { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}

impl Default for HostDevices {
    fn default() -> Self {
        HostDevices::new(".")
    }
}

impl Devices for HostDevices {
    fn open_program(&mut self, name: &str) -> io::Result<String> {
        fs::read_to_string(self.path(name))
    }

    fn read_input(&mut self, variable: &str) -> io::Result<String> {
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "Enter the value of {variable}:")?;
        stdout.flush()?;

        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "stdin closed",
            ));
        }
        Ok(strip_line_ending(&line).to_string())
    }

    fn print(&mut self, output: Output) {
        println!("{output}");
    }

    fn file_exists(&self, name: &str) -> bool {
        self.path(name).is_file()
    }

    fn read_first_line(&mut self, name: &str) -> io::Result<String> {
        let reader = BufReader::new(File::open(self.path(name))?);
        match reader.lines().next() {
            Some(line) => Ok(strip_line_ending(&line?).to_string()),
            None => Ok(String::new()),
        }
    }

    fn write_file(&mut self, name: &str, content: &str) -> io::Result<()> {
        fs::write(self.path(name), content)
    }
}

fn strip_line_ending(line: &str) -> &str {
    line.trim_end_matches(['\n', '\r'])
}

#[derive(Debug, Default)]
struct MemoryState {
    files: HashMap<String, String>,
    input: VecDeque<String>,
    output: Vec<Output>,
}

/// In-memory devices with scripted input and captured output.
///
/// Clones share the same state, so a caller can keep a handle while the
/// simulation owns another one.
#[derive(Debug, Clone, Default)]
pub struct MemoryDevices {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryDevices {
    pub fn new() -> MemoryDevices {
        MemoryDevices::default()
    }

    /// Adds (or replaces) a program source or data file.
    pub fn with_file(self, name: impl Into<String>, content: impl Into<String>) -> MemoryDevices {
        self.state().files.insert(name.into(), content.into());
        self
    }

    /// Queues one line of interactive input.
    pub fn with_input(self, line: impl Into<String>) -> MemoryDevices {
        self.state().input.push_back(line.into());
        self
    }

    pub fn file(&self, name: &str) -> Option<String> {
        self.state().files.get(name).cloned()
    }

    /// Returns everything printed so far.
    pub fn output(&self) -> Vec<Output> {
        self.state().output.clone()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn not_found(name: &str) -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, format!("no such file `{name}`"))
}

impl Devices for MemoryDevices {
    fn open_program(&mut self, name: &str) -> io::Result<String> {
        self.file(name).ok_or_else(|| not_found(name))
    }

    fn read_input(&mut self, variable: &str) -> io::Result<String> {
        self.state().input.pop_front().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("no input left for `{variable}`"),
            )
        })
    }

    fn print(&mut self, output: Output) {
        self.state().output.push(output);
    }

    fn file_exists(&self, name: &str) -> bool {
        self.state().files.contains_key(name)
    }

    fn read_first_line(&mut self, name: &str) -> io::Result<String> {
        let content = self.file(name).ok_or_else(|| not_found(name))?;
        Ok(content.lines().next().unwrap_or_default().to_string())
    }

    fn write_file(&mut self, name: &str, content: &str) -> io::Result<()> {
        self.state()
            .files
            .insert(name.to_string(), content.to_string());
        Ok(())
    }
}
