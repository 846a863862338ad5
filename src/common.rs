use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use serde_json::Value;

use crate::document::parse_json_text;
use crate::errors::{CompilerError, CompilerResult};

pub fn write_string_to_file(path: &Path, content: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}

/// Read and parse a JSON file; errors name the path.
pub fn read_json_file(path: &Path) -> CompilerResult<Value> {
    let text = fs::read_to_string(path).map_err(|e| CompilerError::io(path, e))?;
    parse_json_text(&text, &path.display().to_string())
}

/// Serialise `value` to `path`, two-space indented unless `compact`. Returns bytes written.
pub fn write_json_file(path: &Path, value: &Value, compact: bool) -> CompilerResult<usize> {
    let mut content = if compact {
        serde_json::to_string(value)
    } else {
        serde_json::to_string_pretty(value)
    }
    .map_err(|e| CompilerError::parse(path.display().to_string(), e.to_string()))?;
    content.push('\n');

    write_string_to_file(path, &content).map_err(|e| CompilerError::io(path, e))?;
    Ok(content.len())
}
