// script.rs - Script intake from uploads and local files
use crate::error::ScriptError;
use std::path::Path;

const ACCEPTED_EXTENSIONS: [&str; 2] = ["txt", "md"];

/// Whether a file is accepted as a script: `.txt`, `.md`, or any `text/*` content type
pub fn is_supported(filename: Option<&str>, content_type: Option<&str>) -> bool {
    let by_extension = filename
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .map(|ext| ACCEPTED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false);

    let by_content_type = content_type
        .map(|ct| ct.trim().to_ascii_lowercase().starts_with("text/"))
        .unwrap_or(false);

    by_extension || by_content_type
}

/// Decode an uploaded file into script text
pub fn decode_upload(
    filename: Option<&str>,
    content_type: Option<&str>,
    data: Vec<u8>,
) -> Result<String, ScriptError> {
    if !is_supported(filename, content_type) {
        return Err(ScriptError::UnsupportedType(
            filename
                .or(content_type)
                .unwrap_or("unknown")
                .to_string(),
        ));
    }
    Ok(String::from_utf8(data)?)
}

/// Read a local script file fully into memory
pub async fn read_script_file(path: &Path) -> Result<String, ScriptError> {
    let name = path.file_name().and_then(|n| n.to_str());
    // Local files carry no content type; extensionless files are read as plain text
    if path.extension().is_some() && !is_supported(name, None) {
        return Err(ScriptError::UnsupportedType(path.display().to_string()));
    }
    let data = tokio::fs::read(path).await?;
    Ok(String::from_utf8(data)?)
}
