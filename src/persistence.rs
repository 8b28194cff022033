// SPDX-License-Identifier: MIT OR Apache-2.0

//! Append-only log files, one per calendar day.
//!
//! Persistence is off until [`FilePersistence::init`] picks a directory. Every append opens the
//! day's file, writes one line and closes it again, all under one lock, so lines from different
//! threads never interleave. I/O failures are reported on the console under
//! [`LIBRARY_FAULT_TAG`] and otherwise ignored.
//!
//! File layout:
//!
//! ```text
//! <files_dir>/scopedlog_files/2024_05_17_Log.txt
//!
//! 2024/05/17 09:12:03 Session Started
//! 2024/05/17 09:12:03 INFO/[USER 42][Class Worker][Method start] ready
//! ```

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::NaiveDateTime;
use parking_lot::Mutex;

use crate::clock::Clock;
use crate::config::AppContext;
use crate::console::{Console, LIBRARY_FAULT_TAG};
use crate::error::Error;
use crate::level::Level;

/// Name of the directory created under the application's files directory.
pub const LOG_DIR_NAME: &str = "scopedlog_files";

const TIMESTAMP_FORMAT: &str = "%Y/%m/%d %H:%M:%S";
const FILE_NAME_FORMAT: &str = "%Y_%m_%d_Log.txt";

#[derive(Debug)]
struct PersistState {
    min_level: Level,
    dir: Option<PathBuf>,
    session_pending: bool,
}

impl Default for PersistState {
    fn default() -> Self {
        PersistState {
            min_level: Level::Off,
            dir: None,
            session_pending: false,
        }
    }
}

/// Shared persisted-file state.
#[derive(Debug)]
pub struct FilePersistence {
    state: Mutex<PersistState>,
    clock: Arc<dyn Clock>,
    console: Arc<dyn Console>,
}

impl FilePersistence {
    pub fn new(clock: Arc<dyn Clock>, console: Arc<dyn Console>) -> Self {
        FilePersistence {
            state: Mutex::new(PersistState::default()),
            clock,
            console,
        }
    }

    fn report(&self, error: &Error) {
        self.console.write(Level::Error, LIBRARY_FAULT_TAG, &error.to_string());
    }

    /**
    Activates persistence at `min_level` and returns the log directory.

    The directory is chosen once: later calls only change the minimum level.
    */
    pub fn init(&self, app: &AppContext, min_level: Level) -> PathBuf {
        let mut state = self.state.lock();
        state.min_level = min_level;
        if let Some(dir) = &state.dir {
            return dir.clone();
        }
        let dir = self.resolve_dir(app);
        state.dir = Some(dir.clone());
        state.session_pending = true;
        self.console.write(
            Level::Info,
            LIBRARY_FAULT_TAG,
            &format!("persisting logs at {min_level} and above to {}", dir.display()),
        );
        dir
    }

    fn resolve_dir(&self, app: &AppContext) -> PathBuf {
        let private = app.files_dir.join(LOG_DIR_NAME);
        let private_error = match fs::create_dir_all(&private) {
            Ok(()) => return private,
            Err(e) => e,
        };
        self.report(&Error::Io("could not create the private log directory", private_error));
        if let Some(external) = &app.external_files_dir {
            let external = external.join(LOG_DIR_NAME);
            match fs::create_dir_all(&external) {
                Ok(()) => return external,
                Err(e) => {
                    self.report(&Error::Io("could not create the external log directory", e))
                }
            }
        }
        app.files_dir.clone()
    }

    /// Stops persisting without forgetting the directory.
    pub fn deactivate(&self) {
        self.state.lock().min_level = Level::Off;
    }

    #[cfg(test)]
    fn dir(&self) -> Option<PathBuf> {
        self.state.lock().dir.clone()
    }

    #[cfg(test)]
    fn min_level(&self) -> Level {
        self.state.lock().min_level
    }

    /// Whether a message at `level` would be written.
    pub fn accepts(&self, level: Level) -> bool {
        let state = self.state.lock();
        state.dir.is_some() && level.passes(state.min_level)
    }

    /**
    Appends `LEVEL/<text>` to today's file, if persistence accepts `level`.

    `text` is everything after the level: global prefix, local prefix and message.
    */
    pub fn append(&self, level: Level, text: &str) {
        let mut state = self.state.lock();
        if !level.passes(state.min_level) {
            return;
        }
        let Some(dir) = state.dir.clone() else {
            return;
        };
        let now = self.clock.now();
        match write_line(&dir, now, level, text, state.session_pending) {
            Ok(()) => state.session_pending = false,
            Err(e) => self.report(&e),
        }
    }

    /// Regular files in the log directory sorted by name; `None` before [`init`](Self::init).
    pub fn log_files(&self) -> Option<Vec<PathBuf>> {
        let dir = self.state.lock().dir.clone()?;
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) => {
                self.report(&Error::Io("could not list the log directory", e));
                return Some(Vec::new());
            }
        };
        let mut files: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .collect();
        files.sort();
        Some(files)
    }

    /// Forgets the directory and turns persistence off.
    pub fn reset(&self) {
        *self.state.lock() = PersistState::default();
    }
}

/// Path of the file that lines written at `now` go to.
pub fn log_file_path(dir: &Path, now: NaiveDateTime) -> PathBuf {
    dir.join(now.format(FILE_NAME_FORMAT).to_string())
}

fn write_line(
    dir: &Path,
    now: NaiveDateTime,
    level: Level,
    text: &str,
    session_start: bool,
) -> Result<(), Error> {
    let path = log_file_path(dir, now);
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|e| Error::Io("could not open the log file", e))?;
    let timestamp = now.format(TIMESTAMP_FORMAT);
    let mut line = String::new();
    if session_start {
        line.push_str(&format!("{timestamp} Session Started\n"));
    }
    line.push_str(&format!("{timestamp} {}/{text}\n", level.name()));
    file.write_all(line.as_bytes())
        .map_err(|e| Error::Io("could not append to the log file", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::console::InMemoryConsole;
    use chrono::NaiveDate;

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, day)
            .unwrap()
            .and_hms_opt(hour, 4, 5)
            .unwrap()
    }

    fn setup(now: NaiveDateTime) -> (FilePersistence, Arc<FixedClock>, Arc<InMemoryConsole>) {
        let clock = Arc::new(FixedClock::new(now));
        let console = Arc::new(InMemoryConsole::new());
        let persistence = FilePersistence::new(clock.clone(), console.clone());
        (persistence, clock, console)
    }

    #[test]
    fn nothing_is_written_before_init() {
        let (persistence, _, _) = setup(at(17, 9));
        persistence.append(Level::Wtf, "lost");
        assert_eq!(persistence.log_files(), None);
        assert!(!persistence.accepts(Level::Wtf));
    }

    #[test]
    fn first_append_starts_a_session() {
        let dir = tempfile::tempdir().unwrap();
        let (persistence, _, _) = setup(at(17, 9));
        let app = AppContext::new("com.app", dir.path());
        let log_dir = persistence.init(&app, Level::Info);
        assert_eq!(log_dir, dir.path().join(LOG_DIR_NAME));

        persistence.append(Level::Debug, "filtered");
        persistence.append(Level::Info, "[Class Worker] one");
        persistence.append(Level::Error, "[Class Worker] two");

        let contents = fs::read_to_string(log_dir.join("2024_05_17_Log.txt")).unwrap();
        assert_eq!(
            contents,
            "2024/05/17 09:04:05 Session Started\n\
             2024/05/17 09:04:05 INFO/[Class Worker] one\n\
             2024/05/17 09:04:05 ERROR/[Class Worker] two\n"
        );
    }

    #[test]
    fn one_file_per_day() {
        let dir = tempfile::tempdir().unwrap();
        let (persistence, clock, _) = setup(at(17, 23));
        persistence.init(&AppContext::new("com.app", dir.path()), Level::Verbose);
        persistence.append(Level::Info, "late");
        clock.set(at(18, 0));
        persistence.append(Level::Info, "early");

        let files = persistence.log_files().unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|f| f.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["2024_05_17_Log.txt", "2024_05_18_Log.txt"]);
        let second = fs::read_to_string(&files[1]).unwrap();
        assert_eq!(second, "2024/05/18 00:04:05 INFO/early\n");
    }

    #[test]
    fn init_is_idempotent_but_updates_level() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        let (persistence, _, _) = setup(at(17, 9));
        let dir = persistence.init(&AppContext::new("a", first.path()), Level::Error);
        let again = persistence.init(&AppContext::new("b", second.path()), Level::Debug);
        assert_eq!(dir, again);
        assert_eq!(persistence.min_level(), Level::Debug);

        persistence.deactivate();
        assert!(!persistence.accepts(Level::Wtf));
        assert_eq!(persistence.dir(), Some(dir));
    }

    #[test]
    fn falls_back_to_external_then_base_dir() {
        let base = tempfile::tempdir().unwrap();
        let external = tempfile::tempdir().unwrap();
        // A plain file where the directory would go makes creation fail.
        let blocked = base.path().join("blocked");
        fs::write(&blocked, b"").unwrap();

        let (persistence, _, console) = setup(at(17, 9));
        let app = AppContext::new("a", &blocked).with_external_files_dir(external.path());
        assert_eq!(persistence.init(&app, Level::Verbose), external.path().join(LOG_DIR_NAME));
        assert!(console.drain_logs().contains("could not create the private log directory"));

        let (persistence, _, _) = setup(at(17, 9));
        let app = AppContext::new("a", &blocked);
        assert_eq!(persistence.init(&app, Level::Verbose), blocked);
    }

    #[test]
    fn io_failures_are_reported_not_raised() {
        let base = tempfile::tempdir().unwrap();
        let (persistence, _, console) = setup(at(17, 9));
        let dir = persistence.init(&AppContext::new("a", base.path()), Level::Verbose);
        console.drain_lines();
        fs::remove_dir_all(&dir).unwrap();

        persistence.append(Level::Info, "nowhere to go");
        let lines = console.drain_lines();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].level, Level::Error);
        assert_eq!(lines[0].tag, LIBRARY_FAULT_TAG);
        assert!(lines[0].message.starts_with("could not open the log file"));
    }
}
