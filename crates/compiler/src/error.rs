use context_catalog::CatalogError;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CompilerError>;

#[derive(Error, Debug)]
pub enum CompilerError {
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    #[error("Failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
