use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CatalogError>;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Project root not found: {}", .0.display())]
    RootNotFound(PathBuf),

    #[error("Project root is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),
}
