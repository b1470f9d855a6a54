//! Subversion command builders and status parsing
//!
//! Only the commands the deployment needs are modelled. Each builder returns
//! a [`CommandLine`]; running it is the caller's job.

use crate::executor::CommandLine;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

/// Builds `svn` invocations for one user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SvnClient {
    program: String,
    username: String,
}

impl SvnClient {
    /// Creates a client that authenticates as `username`
    #[must_use]
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            program: "svn".to_string(),
            username: username.into(),
        }
    }

    /// Uses a different `svn` executable
    #[must_use]
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    fn command(&self, subcommand: &str) -> CommandLine {
        CommandLine::new(&self.program).arg(subcommand)
    }

    fn auth_args(&self) -> [String; 2] {
        [
            "--force-interactive".to_string(),
            format!("--username={}", self.username),
        ]
    }

    /// `svn co <url> <path>`
    #[must_use]
    pub fn checkout(&self, url: &str, path: &Path) -> CommandLine {
        self.command("co")
            .args(self.auth_args())
            .arg(url)
            .arg(path.to_string_lossy())
    }

    /// `svn resolve --accept working -R .`
    #[must_use]
    pub fn resolve_working(&self) -> CommandLine {
        self.command("resolve")
            .args(["--accept", "working", "-R", "."])
    }

    /// `svn status`
    #[must_use]
    pub fn status(&self) -> CommandLine {
        self.command("status")
    }

    /// `svn add --parents -- <paths>`
    #[must_use]
    pub fn add(&self, paths: &[String]) -> CommandLine {
        self.command("add")
            .args(["--parents", "--"])
            .args(paths.iter().map(|p| escape_peg(p)))
    }

    /// `svn delete -- <paths>`
    #[must_use]
    pub fn delete(&self, paths: &[String]) -> CommandLine {
        self.command("delete")
            .arg("--")
            .args(paths.iter().map(|p| escape_peg(p)))
    }

    /// `svn commit -m <message>`
    #[must_use]
    pub fn commit(&self, message: &str) -> CommandLine {
        self.command("commit")
            .args(self.auth_args())
            .args(["-m", message])
    }

    /// Server-side `svn copy <src> <dest> -m <message>`
    #[must_use]
    pub fn remote_copy(&self, src_url: &str, dest_url: &str, message: &str) -> CommandLine {
        self.command("copy")
            .arg(src_url)
            .arg(dest_url)
            .args(self.auth_args())
            .args(["-m", message])
    }

    /// Working-copy `svn copy <src> <dest>`
    #[must_use]
    pub fn local_copy(&self, src: &str, dest: &str) -> CommandLine {
        self.command("copy").arg(escape_peg(src)).arg(escape_peg(dest))
    }
}

/// Protects paths containing `@` from being read as peg revisions
#[must_use]
pub fn escape_peg(path: &str) -> String {
    if path.contains('@') {
        format!("{path}@")
    } else {
        path.to_string()
    }
}

/// Paths `svn status` reported as untracked (`?`) or missing (`!`)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusChanges {
    /// Present on disk, not under version control
    pub untracked: Vec<String>,
    /// Under version control, absent on disk
    pub missing: Vec<String>,
}

impl StatusChanges {
    /// Returns true if nothing needs to be added or removed
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.untracked.is_empty() && self.missing.is_empty()
    }
}

/// Parses `svn status` output into the paths to add and remove.
///
/// Each line has seven status columns, a space, then the path. Other status
/// codes and tree-conflict detail lines are ignored.
#[must_use]
pub fn parse_status(output: &str) -> StatusChanges {
    static STATUS_LINE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"^(?P<code>[?!]).{6} (?P<path>.+)$").expect("status pattern is valid")
    });

    let mut changes = StatusChanges::default();
    for line in output.lines() {
        let line = line.trim_end_matches('\r');
        let Some(caps) = STATUS_LINE.captures(line) else {
            continue;
        };
        let path = caps["path"].to_string();
        match &caps["code"] {
            "?" => changes.untracked.push(path),
            _ => changes.missing.push(path),
        }
    }
    changes
}
