//! Common traits and types that are useful for working with `vtu-color`

pub use crate::catalog::{build_catalog, ArrayDescriptor, Catalog, NamingPolicy, PointArrayInfo};
pub use crate::grid::{PointArray, UnstructuredGrid};
pub use crate::model::Model;
pub use crate::parse::ComponentNames;
pub use crate::resolve::{resolve, ColorDirective, ResolveError};
pub use crate::selection::{InstallOutcome, SelectionChange, SelectionError, SelectionState};
pub use crate::Error;
