//! External command execution for compress commands.
//!
//! ```ignore
//! let output = Cmd::shell(&expand_template("uglifyjs %s -c", source))
//!     .filter(&MINIFY_FILTER)
//!     .timeout(Duration::from_secs(30))
//!     .run()?;
//! ```
//!
//! stdout is captured for the caller, stderr is logged through a
//! [`FilterRule`], and a non-zero exit is an error carrying stderr.

use crate::log;
use anyhow::{Context, Result, bail};
use regex::Regex;
use std::{
    borrow::Cow,
    ffi::{OsStr, OsString},
    io::Read,
    path::Path,
    process::{Child, Command, ExitStatus, Output, Stdio},
    sync::OnceLock,
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

/// Placeholder substituted with the shell-escaped source path.
pub const PATH_PLACEHOLDER: &str = "%s";

const POLL_INTERVAL: Duration = Duration::from_millis(10);

// ============================================================================
// Cmd
// ============================================================================

/// A process to run with captured output.
pub struct Cmd {
    program: OsString,
    args: Vec<OsString>,
    timeout: Option<Duration>,
    filter: &'static FilterRule,
}

impl Cmd {
    pub fn new(program: impl AsRef<OsStr>) -> Self {
        Self {
            program: program.as_ref().to_owned(),
            args: Vec::new(),
            timeout: None,
            filter: &EMPTY_FILTER,
        }
    }

    /// A command line run by the platform shell.
    pub fn shell(line: &str) -> Self {
        let (shell, flag) = if cfg!(windows) { ("cmd", "/C") } else { ("sh", "-c") };
        Self::new(shell).arg(flag).arg(line)
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_owned());
        self
    }

    /// Kill the process and fail once `limit` has elapsed.
    pub fn timeout(mut self, limit: Duration) -> Self {
        self.timeout = Some(limit);
        self
    }

    /// Lines of stderr to keep out of the log.
    pub fn filter(mut self, filter: &'static FilterRule) -> Self {
        self.filter = filter;
        self
    }

    /// Run to completion (or timeout) and return the captured output.
    pub fn run(self) -> Result<Output> {
        let name = self.program.to_string_lossy().into_owned();

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("Failed to spawn `{name}`"))?;

        // Both pipes are drained while waiting, a full pipe would stall the child
        let stdout = child.stdout.take().map(read_in_background);
        let stderr = child.stderr.take().map(read_in_background);

        let status = match self.timeout {
            Some(limit) => wait_until(&mut child, limit, &name)?,
            None => child
                .wait()
                .with_context(|| format!("Failed to wait for `{name}`"))?,
        };
        let output = Output {
            status,
            stdout: collect(stdout),
            stderr: collect(stderr),
        };

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !output.status.success() {
            bail!(failure_message(&name, output.status, &stderr, self.filter));
        }
        self.filter.log(&name, &stderr);
        Ok(output)
    }
}

fn read_in_background<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        buf
    })
}

fn collect(reader: Option<JoinHandle<Vec<u8>>>) -> Vec<u8> {
    reader.and_then(|h| h.join().ok()).unwrap_or_default()
}

fn wait_until(child: &mut Child, limit: Duration, name: &str) -> Result<ExitStatus> {
    let deadline = Instant::now() + limit;
    while Instant::now() < deadline {
        let polled = child
            .try_wait()
            .with_context(|| format!("Failed to wait for `{name}`"))?;
        if let Some(status) = polled {
            return Ok(status);
        }
        thread::sleep(POLL_INTERVAL);
    }
    let _ = child.kill();
    let _ = child.wait();
    bail!("Command `{name}` timed out after {:.1}s", limit.as_secs_f64())
}

fn failure_message(name: &str, status: ExitStatus, stderr: &str, filter: &FilterRule) -> String {
    let detail: Vec<_> = stderr
        .lines()
        .map(|line| strip_ansi(line).trim().to_owned())
        .filter(|line| !line.is_empty() && !filter.should_skip(line))
        .collect();

    let mut msg = format!("Command `{name}` failed with {status}");
    if !detail.is_empty() {
        msg.push('\n');
        msg.push_str(&detail.join("\n"));
    }
    msg
}

// ============================================================================
// Shell templates
// ============================================================================

/// Quote a string as a single POSIX shell word.
pub fn shell_quote(s: &str) -> Cow<'_, str> {
    let safe = !s.is_empty()
        && s
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b"-_./=:,+@%".contains(&b));
    if safe {
        return Cow::Borrowed(s);
    }
    Cow::Owned(format!("'{}'", s.replace('\'', r"'\''")))
}

/// Substitute the quoted `path` into a command template.
///
/// Without a [`PATH_PLACEHOLDER`] the path is appended as the last argument.
pub fn expand_template(template: &str, path: &Path) -> String {
    let path = path.to_string_lossy();
    let quoted = shell_quote(&path);
    if template.contains(PATH_PLACEHOLDER) {
        template.replace(PATH_PLACEHOLDER, &quoted)
    } else {
        format!("{} {}", template.trim_end(), quoted)
    }
}

/// First word of a command template (the program to look up on `PATH`).
pub fn template_program(template: &str) -> Option<&str> {
    template.split_whitespace().next()
}

// ============================================================================
// stderr filtering
// ============================================================================

/// Prefixes of stderr lines that are noise for a given tool.
pub struct FilterRule {
    pub skip_prefixes: &'static [&'static str],
}

impl FilterRule {
    pub const fn new(skip_prefixes: &'static [&'static str]) -> Self {
        Self { skip_prefixes }
    }

    fn should_skip(&self, line: &str) -> bool {
        self.skip_prefixes.iter().any(|p| line.starts_with(p))
    }

    /// Log the lines of `output` that are not noise, under `name`.
    pub fn log(&self, name: &str, output: &str) {
        let kept: Vec<_> = output
            .lines()
            .map(strip_ansi)
            .filter(|line| {
                let line = line.trim();
                !line.is_empty() && !self.should_skip(line)
            })
            .collect();
        if !kept.is_empty() {
            log!(name; "{}", kept.join("\n"));
        }
    }
}

/// Keeps every line.
pub const EMPTY_FILTER: FilterRule = FilterRule::new(&[]);

fn strip_ansi(s: &str) -> Cow<'_, str> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"\x1b\[[0-9;]*m").expect("valid ANSI regex"));
    re.replace_all(s, "")
}
