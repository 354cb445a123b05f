use crate::domain::model::Encoding;
use crate::utils::error::{Result, SantaError};

/// Classify an uploaded file by the text after its last `.`. A name without
/// any `.` is taken whole as its extension.
pub fn detect(file_name: &str) -> Result<Encoding> {
    let extension = file_name
        .rsplit('.')
        .next()
        .unwrap_or(file_name)
        .to_lowercase();

    let encoding = match extension.as_str() {
        "csv" => Encoding::Csv,
        "xlsx" => Encoding::Xlsx,
        _ => {
            tracing::debug!("Rejected upload {} (extension '{}')", file_name, extension);
            return Err(SantaError::UnsupportedFormat {
                file_name: file_name.to_string(),
                extension,
            });
        }
    };

    tracing::debug!("Detected {} encoding for {}", encoding, file_name);
    Ok(encoding)
}
