//! loading a vtu document into a grid plus catalog model
//!
//! [`Model::load`] is the one-call entry point: parse the document, reject
//! grids without points, run the independent component-name scan, and
//! build the catalog. A `Model` is immutable once built; loading another
//! file means building another `Model` and dropping this one.

use std::path::Path;

use quick_xml::reader::Reader;

use crate::catalog::{build_catalog, Catalog, ComponentIndex, NamingPolicy, PointArrayInfo};
use crate::grid::UnstructuredGrid;
use crate::parse;
use crate::parse::ComponentNames;
use crate::resolve::{resolve, ColorDirective, ResolveError};
use crate::Error;

/// a successfully loaded document: the grid and the catalog built from it
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    grid: UnstructuredGrid,
    catalog: Catalog,
}

impl Model {
    /// load a vtu file with the default component naming policy
    pub fn load(path: &Path) -> Result<Self, Error> {
        Self::load_with_policy(path, NamingPolicy::default())
    }

    /// Load a vtu file.
    ///
    /// A document that fails to parse or holds no points is rejected and
    /// nothing is installed. A document that parses but exposes no usable
    /// point-data arrays loads fine with an empty catalog; installing that
    /// catalog is what surfaces the "nothing to color" condition to the
    /// caller.
    pub fn load_with_policy(path: &Path, policy: NamingPolicy) -> Result<Self, Error> {
        let grid = parse::read_grid(path)?;

        if grid.num_points() == 0 {
            return Err(Error::EmptyGrid);
        }

        // second pass over the raw document for the ComponentName
        // attributes. a file that read fine a moment ago but cannot be
        // reopened just loses its names
        let names = match std::fs::File::open(path) {
            Ok(file) => {
                parse::scan_component_names(Reader::from_reader(std::io::BufReader::new(file)))
            }
            Err(_) => ComponentNames::default(),
        };

        let infos: Vec<PointArrayInfo> = grid
            .point_arrays()
            .iter()
            .map(|array| PointArrayInfo::new(array.name(), array.components()))
            .collect();

        let catalog = build_catalog(&infos, &names, policy);

        log::debug!(
            "loaded `{}`: {} points, {} colorable arrays",
            path.display(),
            grid.num_points(),
            catalog.len()
        );

        Ok(Self { grid, catalog })
    }

    pub fn grid(&self) -> &UnstructuredGrid {
        &self.grid
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// resolve a selection against this model's catalog and grid
    pub fn resolve(
        &self,
        array_index: usize,
        component: ComponentIndex,
    ) -> Result<ColorDirective, ResolveError> {
        resolve(&self.catalog, &self.grid, array_index, component)
    }
}
