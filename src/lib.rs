#![doc = include_str!("../README.md")]

pub mod catalog;
pub mod grid;
pub mod model;
pub mod parse;
pub mod prelude;
pub mod resolve;
pub mod selection;

pub use catalog::{build_catalog, ArrayDescriptor, Catalog, ComponentIndex};
pub use catalog::{NamingPolicy, PointArrayInfo, MAGNITUDE_NAME};

pub use grid::{PointArray, UnstructuredGrid};

pub use model::Model;

pub use parse::read_grid;
pub use parse::{scan_component_names, ComponentNames};
pub use parse::ParseError;

pub use resolve::{resolve, ColorDirective, ResolveError, DEFAULT_RANGE};

pub use selection::{InstallOutcome, SelectionChange, SelectionError, SelectionState};

pub use quick_xml::reader::Reader;

/// general purpose error enumeration for possible causes of a failed load.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("An io error occured: `{0}`")]
    Io(#[from] std::io::Error),
    #[error("Error while parsing VTU xml: {0}")]
    Parse(#[from] parse::ParseError),
    #[error("document contains no points and cannot be colored")]
    EmptyGrid,
}

impl Error {
    /// whether this error means the document itself is unusable (it failed
    /// to parse, or it parsed but holds no points), as opposed to the file
    /// simply not being readable.
    pub fn is_invalid_document(&self) -> bool {
        matches!(self, Error::Parse(_) | Error::EmptyGrid)
    }
}
