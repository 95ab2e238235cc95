use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use tracing::info;

/// Export formats offered by the backend. The bytes are opaque to this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Pdf,
    Csv,
    Excel,
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path_segment())
    }
}

impl ExportFormat {
    /// Last segment of the export endpoint path.
    pub fn path_segment(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Csv => "csv",
            ExportFormat::Excel => "excel",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Csv => "csv",
            ExportFormat::Excel => "xlsx",
        }
    }
}

/// A downloaded export, ready to be handed to a [`FileSink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFile {
    pub format: ExportFormat,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl ExportedFile {
    /// Default file name when the backend does not suggest one.
    pub fn default_name(order_id: i64, format: ExportFormat) -> String {
        format!("commande-{}.{}", order_id, format.extension())
    }
}

/// Where exported files end up (browser download, directory, ...).
#[async_trait]
pub trait FileSink: Send + Sync {
    async fn save(&self, file: &ExportedFile) -> anyhow::Result<PathBuf>;
}

/// Writes exports into a directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    /// Sink writing into `dir`, created on first save if missing.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl FileSink for DirectorySink {
    async fn save(&self, file: &ExportedFile) -> anyhow::Result<PathBuf> {
        // Keep only the final component of a server-suggested name.
        let name = std::path::Path::new(&file.file_name)
            .file_name()
            .ok_or_else(|| anyhow::anyhow!("Invalid export file name: {}", file.file_name))?;

        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(name);
        tokio::fs::write(&path, &file.bytes).await?;

        info!("Saved {} export to {}", file.format, path.display());
        Ok(path)
    }
}

/// Extracts `filename` from a `Content-Disposition` header value.
pub(crate) fn filename_from_disposition(value: &str) -> Option<String> {
    value.split(';').map(str::trim).find_map(|part| {
        part.strip_prefix("filename=")
            .map(|name| name.trim_matches('"').to_string())
            .filter(|name| !name.is_empty())
    })
}
