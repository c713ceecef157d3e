use crate::output::OutputResult;
use chrono::Local;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// Format of the last-updated stamp
pub const STAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Records the completion time of a run, returning the written stamp
pub fn write_last_updated(path: &Path) -> OutputResult<String> {
    let stamp = Local::now().format(STAMP_FORMAT).to_string();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, &stamp)?;
    Ok(stamp)
}

/// Reads the stamp; `None` when no run has completed yet
pub fn read_last_updated(path: &Path) -> OutputResult<Option<String>> {
    match fs::read_to_string(path) {
        Ok(text) => {
            let trimmed = text.trim();
            Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}
