//! turning a selection into a renderable color-mapping directive
//!
//! [`resolve`] is the only bridge between the catalog/selection side and a
//! renderer: it re-validates the selection against the live grid, computes
//! the scalar range for the chosen component, and returns a
//! [`ColorDirective`] describing exactly what to apply. It performs no
//! rendering side effects itself and is idempotent for identical inputs.

use crate::catalog::{Catalog, ComponentIndex};
use crate::grid::UnstructuredGrid;

/// scalar range used when the selected array holds no values
pub const DEFAULT_RANGE: (f64, f64) = (0.0, 1.0);

/// Everything a renderer needs to color by the selected component: select
/// the array by `array_name` for point-field coloring, set the active
/// component to [`component.to_render_index()`](`ComponentIndex::to_render_index`)
/// (`-1` meaning "compute magnitude"), set the scalar range to `range`, and
/// show a legend titled `title`.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorDirective {
    pub array_name: String,
    pub component: ComponentIndex,
    /// closed `[min, max]` interval of the selected component's values
    pub range: (f64, f64),
    /// legend title, `"<array name>\n<component display name>"`
    pub title: String,
}

/// why a selection could not be resolved; all of these are recoverable and
/// none of them change any state
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("array index {index} is out of bounds for a catalog of {len} arrays")]
    InvalidArrayIndex { index: usize, len: usize },
    #[error("the loaded grid has no point data to color by")]
    NoPointData,
    #[error("array `{0}` is not available in the loaded point data")]
    ArrayUnavailable(String),
}

/// Resolve an `(array, component)` selection against the catalog and the
/// live grid.
///
/// Validation happens here on every call rather than trusting caller-held
/// state: the array index is checked against the catalog, and the array is
/// looked up by name in the grid so a selection held across a model swap
/// surfaces as [`ResolveError::ArrayUnavailable`] instead of coloring by
/// the wrong data.
pub fn resolve(
    catalog: &Catalog,
    grid: &UnstructuredGrid,
    array_index: usize,
    component: ComponentIndex,
) -> Result<ColorDirective, ResolveError> {
    let descriptor = catalog
        .get(array_index)
        .ok_or(ResolveError::InvalidArrayIndex {
            index: array_index,
            len: catalog.len(),
        })?;

    if !grid.has_point_data() {
        return Err(ResolveError::NoPointData);
    }

    let array = grid
        .find_array(descriptor.name())
        .ok_or_else(|| ResolveError::ArrayUnavailable(descriptor.name().to_string()))?;

    let range = match component {
        ComponentIndex::Magnitude => array.magnitude_range(),
        ComponentIndex::Component(index) => {
            let column = if index >= array.components() {
                log::warn!(
                    "component {index} requested for array `{}` which stores {} components; \
                     using the last component for the range",
                    array.name(),
                    array.components()
                );
                array.components() - 1
            } else {
                index
            };
            array.component_range(column)
        }
    }
    .unwrap_or(DEFAULT_RANGE);

    let title = format!(
        "{}\n{}",
        descriptor.name(),
        descriptor.display_name(component)
    );

    Ok(ColorDirective {
        array_name: descriptor.name().to_string(),
        component,
        range,
        title,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{build_catalog, NamingPolicy, PointArrayInfo};
    use crate::grid::PointArray;
    use crate::parse::ComponentNames;

    fn grid() -> UnstructuredGrid {
        let pressure = PointArray::from_buffer("Pressure", 1, vec![101.3, 99.8, 100.4, 102.0]);
        let velocity = PointArray::from_buffer(
            "Velocity",
            3,
            vec![
                3.0, 4.0, 0.0, //
                0.0, 0.0, 0.0, //
                1.0, 2.0, 2.0, //
                0.0, 3.0, 4.0,
            ],
        );
        UnstructuredGrid::new(4, vec![pressure.unwrap(), velocity.unwrap()])
    }

    fn catalog() -> Catalog {
        let mut names = ComponentNames::default();
        names.insert(
            "Velocity",
            vec![
                Some("U".to_string()),
                Some("V".to_string()),
                Some("W".to_string()),
            ],
        );

        build_catalog(
            &[
                PointArrayInfo::new("Pressure", 1),
                PointArrayInfo::new("Velocity", 3),
            ],
            &names,
            NamingPolicy::default(),
        )
    }

    #[test]
    fn scalar_selection_resolves_range_and_title() {
        let directive = resolve(&catalog(), &grid(), 0, ComponentIndex::Component(0)).unwrap();

        assert_eq!(directive.array_name, "Pressure");
        assert_eq!(directive.range, (99.8, 102.0));
        assert_eq!(directive.title, "Pressure\nValue");
        assert_eq!(directive.component.to_render_index(), 0);
    }

    #[test]
    fn magnitude_selection_resolves_vector_length_range() {
        let directive = resolve(&catalog(), &grid(), 1, ComponentIndex::Magnitude).unwrap();

        assert_eq!(directive.range, (0.0, 5.0));
        assert_eq!(directive.title, "Velocity\nMagnitude");
        assert_eq!(directive.component.to_render_index(), -1);
    }

    #[test]
    fn single_component_selection_resolves_raw_values() {
        let directive = resolve(&catalog(), &grid(), 1, ComponentIndex::Component(1)).unwrap();

        assert_eq!(directive.range, (0.0, 4.0));
        assert_eq!(directive.title, "Velocity\nV");
    }

    #[test]
    fn array_index_at_catalog_length_is_invalid() {
        let catalog = catalog();

        let result = resolve(&catalog, &grid(), catalog.len(), ComponentIndex::Component(0));

        assert_eq!(
            result,
            Err(ResolveError::InvalidArrayIndex { index: 2, len: 2 })
        );
    }

    #[test]
    fn grid_without_point_data_is_reported() {
        let bare = UnstructuredGrid::new(4, Vec::new());

        let result = resolve(&catalog(), &bare, 0, ComponentIndex::Component(0));

        assert_eq!(result, Err(ResolveError::NoPointData));
    }

    #[test]
    fn diverged_catalog_reports_the_missing_array() {
        let stale = build_catalog(
            &[PointArrayInfo::new("Temperature", 1)],
            &ComponentNames::default(),
            NamingPolicy::default(),
        );

        let result = resolve(&stale, &grid(), 0, ComponentIndex::Component(0));

        assert_eq!(
            result,
            Err(ResolveError::ArrayUnavailable("Temperature".to_string()))
        );
    }

    #[test]
    fn empty_array_falls_back_to_the_default_range() {
        let empty = PointArray::from_buffer("Pressure", 1, Vec::new()).unwrap();
        let grid = UnstructuredGrid::new(0, vec![empty]);
        let catalog = build_catalog(
            &[PointArrayInfo::new("Pressure", 1)],
            &ComponentNames::default(),
            NamingPolicy::default(),
        );

        let directive = resolve(&catalog, &grid, 0, ComponentIndex::Component(0)).unwrap();

        assert_eq!(directive.range, DEFAULT_RANGE);
    }

    #[test]
    fn out_of_range_component_clamps_but_keeps_its_title() {
        let directive = resolve(&catalog(), &grid(), 1, ComponentIndex::Component(9)).unwrap();

        // range comes from the last stored component, the name stays honest
        assert_eq!(directive.range, (0.0, 4.0));
        assert_eq!(directive.title, "Velocity\nComponent 9");
    }

    #[test]
    fn resolution_is_idempotent() {
        let catalog = catalog();
        let grid = grid();

        let first = resolve(&catalog, &grid, 1, ComponentIndex::Magnitude).unwrap();
        let second = resolve(&catalog, &grid, 1, ComponentIndex::Magnitude).unwrap();

        assert_eq!(first, second);
    }
}
