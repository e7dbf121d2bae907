//! Declaration of traits reused across the code.

use std::fmt;
use thiserror::Error;

use crate::filesystem::fatx_error::FATXError;

/// Implementation of the LayoutDisplay trait.
/// It is used to display the layout of a given structure such as a volume.
pub trait LayoutDisplay {
    fn display_layout(&self, indent: u8) -> Result<String, fmt::Error>;
}

/// Renders the directory hierarchy of a volume.
///
/// Rendering reads directory clusters from the image, hence the mutable receiver.
pub trait TreeDisplay {
    fn display_tree(&mut self) -> Result<String, TraitError>;
}

/// Errors raised while rendering through one of the display traits.
#[derive(Error, Debug)]
pub enum TraitError {
    #[error("{0}")]
    FATXError(FATXError),
    #[error("Formatting error: {0}")]
    FmtError(fmt::Error),
}

impl From<FATXError> for TraitError {
    fn from(err: FATXError) -> Self {
        TraitError::FATXError(err)
    }
}

impl From<fmt::Error> for TraitError {
    fn from(err: fmt::Error) -> Self {
        TraitError::FmtError(err)
    }
}
