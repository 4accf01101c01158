//! in-memory model of a loaded unstructured grid and its point data
//!
//! [`UnstructuredGrid`] is what [`parse`](`crate::parse`) produces from a
//! vtu document: the point count and the point-data arrays in document
//! order. [`PointArray`] owns the numeric values of one array and knows how
//! to compute the scalar ranges the coloring resolver asks for.

use ndarray::Array2;

/// A loaded unstructured grid, reduced to what coloring needs: how many
/// points the mesh has and which point-data arrays it carries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnstructuredGrid {
    num_points: usize,
    point_arrays: Vec<PointArray>,
}

impl UnstructuredGrid {
    pub fn new(num_points: usize, point_arrays: Vec<PointArray>) -> Self {
        Self {
            num_points,
            point_arrays,
        }
    }

    pub fn num_points(&self) -> usize {
        self.num_points
    }

    /// point-data arrays in document order
    pub fn point_arrays(&self) -> &[PointArray] {
        &self.point_arrays
    }

    pub fn has_point_data(&self) -> bool {
        !self.point_arrays.is_empty()
    }

    /// Look up a point-data array by name.
    ///
    /// If the document carried several arrays under the same name, the last
    /// one wins.
    pub fn find_array(&self, name: &str) -> Option<&PointArray> {
        self.point_arrays
            .iter()
            .rev()
            .find(|array| array.name() == name)
    }
}

/// One named point-data array. Values are stored per point, one row per
/// point and one column per component.
#[derive(Debug, Clone, PartialEq)]
pub struct PointArray {
    name: String,
    values: Array2<f64>,
}

/// a flat value buffer whose length does not form whole per-point tuples
#[derive(Debug, thiserror::Error)]
#[error("array `{name}` holds {len} values, which do not divide into tuples of {components} components")]
pub struct ShapeMismatch {
    pub name: String,
    pub components: usize,
    pub len: usize,
}

impl PointArray {
    /// Build an array from the flat buffer a vtu reader produces, with
    /// values interleaved per point: `x0 y0 z0 x1 y1 z1 ...`
    pub fn from_buffer(
        name: impl Into<String>,
        components: usize,
        buffer: Vec<f64>,
    ) -> Result<Self, ShapeMismatch> {
        let name = name.into();
        let len = buffer.len();

        if components == 0 || len % components != 0 {
            return Err(ShapeMismatch {
                name,
                components,
                len,
            });
        }

        let tuples = len / components;
        let values = Array2::from_shape_vec((tuples, components), buffer).map_err(|_| {
            ShapeMismatch {
                name: name.clone(),
                components,
                len,
            }
        })?;

        Ok(Self { name, values })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn components(&self) -> usize {
        self.values.ncols()
    }

    pub fn num_tuples(&self) -> usize {
        self.values.nrows()
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// Closed `[min, max]` range of one raw component's values.
    ///
    /// `None` for an empty array or an out-of-range component index.
    pub fn component_range(&self, component: usize) -> Option<(f64, f64)> {
        if component >= self.components() {
            return None;
        }

        min_max(self.values.column(component).iter().copied())
    }

    /// Closed `[min, max]` range of the per-point euclidean magnitude
    /// across all components. `None` for an empty array.
    pub fn magnitude_range(&self) -> Option<(f64, f64)> {
        min_max(
            self.values
                .rows()
                .into_iter()
                .map(|tuple| tuple.dot(&tuple).sqrt()),
        )
    }
}

fn min_max(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values.fold(None, |acc, value| match acc {
        None => Some((value, value)),
        Some((lo, hi)) => Some((lo.min(value), hi.max(value))),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn velocity() -> PointArray {
        // per-point magnitudes: 5, 0, 3, 5
        PointArray::from_buffer(
            "Velocity",
            3,
            vec![
                3.0, 4.0, 0.0, //
                0.0, 0.0, 0.0, //
                1.0, 2.0, 2.0, //
                0.0, 3.0, 4.0,
            ],
        )
        .unwrap()
    }

    #[test]
    fn component_range_uses_raw_values() {
        let array = velocity();

        assert_eq!(array.component_range(0), Some((0.0, 3.0)));
        assert_eq!(array.component_range(1), Some((0.0, 4.0)));
        assert_eq!(array.component_range(2), Some((0.0, 4.0)));
    }

    #[test]
    fn magnitude_range_is_vector_length() {
        let array = velocity();

        assert_eq!(array.magnitude_range(), Some((0.0, 5.0)));
    }

    #[test]
    fn out_of_range_component_has_no_range() {
        let array = velocity();

        assert_eq!(array.component_range(3), None);
    }

    #[test]
    fn empty_array_has_no_range() {
        let array = PointArray::from_buffer("Empty", 1, Vec::new()).unwrap();

        assert_eq!(array.num_tuples(), 0);
        assert_eq!(array.component_range(0), None);
        assert_eq!(array.magnitude_range(), None);
    }

    #[test]
    fn ragged_buffer_is_rejected() {
        let result = PointArray::from_buffer("Velocity", 3, vec![1.0, 2.0, 3.0, 4.0]);

        assert!(result.is_err());
    }

    #[test]
    fn zero_components_is_rejected() {
        let result = PointArray::from_buffer("Broken", 0, Vec::new());

        assert!(result.is_err());
    }

    #[test]
    fn find_array_prefers_the_last_duplicate() {
        let first = PointArray::from_buffer("Pressure", 1, vec![1.0]).unwrap();
        let second = PointArray::from_buffer("Pressure", 1, vec![2.0]).unwrap();
        let grid = UnstructuredGrid::new(1, vec![first, second.clone()]);

        assert_eq!(grid.find_array("Pressure"), Some(&second));
        assert_eq!(grid.find_array("Velocity"), None);
    }
}
