use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("No data to chart")]
    EmptySeries,

    #[error("Chart rendering failed: {0}")]
    Chart(String),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
