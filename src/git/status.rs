//! Working-tree change detection.

use crate::error::{Error, Result};
use crate::traits::CommandRunner;

/// Arguments for the porcelain status query.
const STATUS_ARGS: [&str; 2] = ["status", "--porcelain"];

/// Separator git uses between the old and new path of a rename or copy.
const RENAME_ARROW: &str = " -> ";

/// List the paths with pending changes in the working tree.
///
/// Runs `git status --porcelain` once and parses its output.
///
/// # Errors
///
/// Returns an error if git cannot be spawned or exits non-zero.
pub fn changed_files(runner: &dyn CommandRunner) -> Result<Vec<String>> {
    let output = runner.run("git", &STATUS_ARGS, None)?;
    if !output.success() {
        return Err(Error::CommandFailed {
            command: "git status --porcelain".to_string(),
            exit_code: output.exit_code,
            stderr: output.stderr.trim().to_string(),
        });
    }
    Ok(parse_porcelain(&output.stdout))
}

/// List changed paths, treating any failure of the status query as "no changes".
pub fn list_changed_files(runner: &dyn CommandRunner) -> Vec<String> {
    changed_files(runner).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Could not list changed files; assuming none");
        Vec::new()
    })
}

/// Parse `git status --porcelain` (v1) output into changed paths.
///
/// Each line is a two-character status code, a space, then the path. For
/// renames and copies the line reads `old -> new` and the new path is kept.
pub fn parse_porcelain(output: &str) -> Vec<String> {
    output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| {
            let path = line.get(3..)?;
            let path = match path.split_once(RENAME_ARROW) {
                Some((_, new)) => new,
                None => path,
            };
            let path = unquote(path.trim());
            (!path.is_empty()).then_some(path)
        })
        .collect()
}

/// Strip the quotes git adds around paths with unusual characters.
///
/// Non-ASCII bytes arrive as octal `\NNN` escapes and are reassembled
/// before decoding.
fn unquote(path: &str) -> String {
    let Some(inner) = path.strip_prefix('"').and_then(|p| p.strip_suffix('"')) else {
        return path.to_string();
    };

    let mut bytes = Vec::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            push_char(&mut bytes, c);
            continue;
        }
        match chars.next() {
            Some('n') => bytes.push(b'\n'),
            Some('t') => bytes.push(b'\t'),
            Some(d @ '0'..='7') => {
                let mut value = u32::from(d) - u32::from('0');
                for _ in 0..2 {
                    match chars.peek().and_then(|c| c.to_digit(8)) {
                        Some(digit) => {
                            value = value * 8 + digit;
                            chars.next();
                        }
                        None => break,
                    }
                }
                bytes.push(u8::try_from(value).unwrap_or(b'?'));
            }
            Some(other) => push_char(&mut bytes, other),
            None => bytes.push(b'\\'),
        }
    }
    String::from_utf8_lossy(&bytes).into_owned()
}

fn push_char(bytes: &mut Vec<u8>, c: char) {
    let mut buf = [0; 4];
    bytes.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
}
