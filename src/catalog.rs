//! array descriptors, the component catalog, and combo ↔ semantic index
//! translation
//!
//! A [`Catalog`] is built once per loaded document and lists every
//! colorable point-data array as an [`ArrayDescriptor`]: the array name and
//! the ordered component display names a selector shows. Multi-component
//! arrays get a synthetic leading `"Magnitude"` entry, so the flat position
//! in that list (the *combo index*) and the component the coloring system
//! wants (the *semantic* [`ComponentIndex`]) differ by one; the descriptor
//! methods translate between the two in both directions.

use derive_more::Deref;

use crate::parse::ComponentNames;

/// display name of the synthetic magnitude entry. Its presence at the head
/// of a descriptor's display list is what marks the array as offering
/// magnitude coloring.
pub const MAGNITUDE_NAME: &str = "Magnitude";

/// The coloring system's component selector: either the euclidean magnitude
/// across all components, or one raw component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentIndex {
    Magnitude,
    Component(usize),
}

impl ComponentIndex {
    /// the integer convention renderers use: `-1` selects magnitude,
    /// `0..N-1` selects a raw component
    pub fn to_render_index(self) -> i32 {
        match self {
            ComponentIndex::Magnitude => -1,
            ComponentIndex::Component(index) => index as i32,
        }
    }

    /// inverse of [`to_render_index`](`Self::to_render_index`): any
    /// negative index means magnitude
    pub fn from_render_index(index: i32) -> Self {
        if index < 0 {
            ComponentIndex::Magnitude
        } else {
            ComponentIndex::Component(index as usize)
        }
    }
}

/// One colorable point-data array: its name and the ordered list of
/// component display names a selector presents.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayDescriptor {
    name: String,
    components: usize,
    display_names: Vec<String>,
}

impl ArrayDescriptor {
    pub(crate) fn new(name: String, components: usize, display_names: Vec<String>) -> Self {
        Self {
            name,
            components,
            display_names,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// number of scalar components stored per point (1 for a scalar array)
    pub fn components(&self) -> usize {
        self.components
    }

    /// every selectable entry, magnitude first when offered. These are the
    /// items a component selector should display, in combo-index order.
    pub fn display_names(&self) -> &[String] {
        &self.display_names
    }

    /// Whether this array offers magnitude coloring.
    ///
    /// Derived from the display list itself rather than tracked separately,
    /// so it cannot drift from what a selector actually shows.
    pub fn has_magnitude_option(&self) -> bool {
        self.display_names.len() > 1 && self.display_names[0] == MAGNITUDE_NAME
    }

    /// the selection an array starts out with: magnitude when offered,
    /// otherwise the first component
    pub fn initial_component(&self) -> ComponentIndex {
        if self.has_magnitude_option() {
            ComponentIndex::Magnitude
        } else {
            ComponentIndex::Component(0)
        }
    }

    /// translate a flat selector position into the semantic component index
    pub fn combo_to_semantic(&self, combo_index: usize) -> ComponentIndex {
        if self.has_magnitude_option() {
            if combo_index == 0 {
                ComponentIndex::Magnitude
            } else {
                ComponentIndex::Component(combo_index - 1)
            }
        } else {
            ComponentIndex::Component(combo_index)
        }
    }

    /// Translate a semantic component index back into the flat selector
    /// position.
    ///
    /// Asking for the magnitude position on an array with no magnitude
    /// option is a caller error; the result clamps to position 0 and the
    /// call is logged.
    pub fn semantic_to_combo(&self, component: ComponentIndex) -> usize {
        match (self.has_magnitude_option(), component) {
            (true, ComponentIndex::Magnitude) => 0,
            (true, ComponentIndex::Component(index)) => index + 1,
            (false, ComponentIndex::Component(index)) => index,
            (false, ComponentIndex::Magnitude) => {
                log::warn!(
                    "magnitude requested for array `{}` which offers no magnitude option; \
                     falling back to the first component",
                    self.name
                );
                0
            }
        }
    }

    /// Display name for a semantic component index.
    ///
    /// Out-of-range components synthesize a `"Component <i>"` name instead
    /// of failing, mirroring the fallback used when the document named
    /// fewer components than it stored.
    pub fn display_name(&self, component: ComponentIndex) -> String {
        match component {
            ComponentIndex::Magnitude => MAGNITUDE_NAME.to_string(),
            ComponentIndex::Component(index) => {
                let offset = if self.has_magnitude_option() { 1 } else { 0 };
                self.display_names
                    .get(index + offset)
                    .cloned()
                    .unwrap_or_else(|| format!("Component {index}"))
            }
        }
    }
}

/// Every colorable array of one loaded document, in discovery order.
///
/// The order is meaningful: position 0 is the default selection after a
/// load. A catalog is built fresh per document and discarded whole; it is
/// never updated in place.
#[derive(Debug, Clone, Default, PartialEq, Deref)]
pub struct Catalog(Vec<ArrayDescriptor>);

impl From<Vec<ArrayDescriptor>> for Catalog {
    fn from(descriptors: Vec<ArrayDescriptor>) -> Self {
        Self(descriptors)
    }
}

/// Catalog-builder input describing one point-data array as the reader
/// reported it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointArrayInfo {
    pub name: String,
    pub components: usize,
    /// component names the reader itself surfaced, per index. The
    /// streaming document reader surfaces none; a reader with its own
    /// object model may fill these in. Document attributes still win.
    pub native_names: Vec<Option<String>>,
}

impl PointArrayInfo {
    pub fn new(name: impl Into<String>, components: usize) -> Self {
        Self {
            name: name.into(),
            components,
            native_names: Vec::new(),
        }
    }
}

/// Fallback naming for components that neither the document attributes nor
/// the reader named.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NamingPolicy {
    /// `"Value"` for scalar arrays, `"Component <i>"` otherwise
    #[default]
    Numbered,
    /// `X`/`Y`/`Z` for exactly 3-component arrays, numbered otherwise
    Cartesian,
}

impl NamingPolicy {
    fn fallback_name(&self, components: usize, index: usize) -> String {
        match self {
            NamingPolicy::Numbered => numbered_name(components, index),
            NamingPolicy::Cartesian => match (components, index) {
                (3, 0) => "X".to_string(),
                (3, 1) => "Y".to_string(),
                (3, 2) => "Z".to_string(),
                _ => numbered_name(components, index),
            },
        }
    }
}

fn numbered_name(components: usize, index: usize) -> String {
    if components == 1 {
        "Value".to_string()
    } else {
        format!("Component {index}")
    }
}

/// Build the catalog for one loaded document.
///
/// `arrays` come from the grid's point data in discovery order; arrays with
/// an empty name (or no components) cannot be selected by name and are
/// skipped. `attribute_names` is the independent `ComponentName<i>`
/// attribute scan of the same document. Per component the display name is
/// the attribute-sourced name if present, else the reader-native name, else
/// the policy fallback; multi-component arrays additionally get the leading
/// [`MAGNITUDE_NAME`] entry.
pub fn build_catalog(
    arrays: &[PointArrayInfo],
    attribute_names: &ComponentNames,
    policy: NamingPolicy,
) -> Catalog {
    let mut descriptors = Vec::with_capacity(arrays.len());

    for info in arrays {
        if info.name.is_empty() || info.components == 0 {
            continue;
        }

        let mut display_names = Vec::with_capacity(info.components + 1);

        if info.components > 1 {
            display_names.push(MAGNITUDE_NAME.to_string());
        }

        for index in 0..info.components {
            let name = attribute_names
                .get(&info.name, index)
                .map(str::to_string)
                .or_else(|| {
                    info.native_names
                        .get(index)
                        .and_then(|native| native.as_deref())
                        .filter(|native| !native.is_empty())
                        .map(str::to_string)
                })
                .unwrap_or_else(|| policy.fallback_name(info.components, index));
            display_names.push(name);
        }

        descriptors.push(ArrayDescriptor::new(
            info.name.clone(),
            info.components,
            display_names,
        ));
    }

    Catalog(descriptors)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names_for(array: &str, names: &[&str]) -> ComponentNames {
        let mut out = ComponentNames::default();
        out.insert(array, names.iter().map(|n| Some(n.to_string())).collect());
        out
    }

    fn velocity_descriptor() -> ArrayDescriptor {
        let catalog = build_catalog(
            &[PointArrayInfo::new("Velocity", 3)],
            &names_for("Velocity", &["X", "Y", "Z"]),
            NamingPolicy::default(),
        );
        catalog[0].clone()
    }

    fn pressure_descriptor() -> ArrayDescriptor {
        let catalog = build_catalog(
            &[PointArrayInfo::new("Pressure", 1)],
            &ComponentNames::default(),
            NamingPolicy::default(),
        );
        catalog[0].clone()
    }

    #[test]
    fn scalar_array_defaults_to_value() {
        let descriptor = pressure_descriptor();

        assert_eq!(descriptor.display_names(), ["Value"]);
        assert!(!descriptor.has_magnitude_option());
        assert_eq!(descriptor.initial_component(), ComponentIndex::Component(0));
    }

    #[test]
    fn vector_array_gets_magnitude_and_attribute_names() {
        let descriptor = velocity_descriptor();

        assert_eq!(descriptor.display_names(), ["Magnitude", "X", "Y", "Z"]);
        assert!(descriptor.has_magnitude_option());
        assert_eq!(descriptor.combo_to_semantic(0), ComponentIndex::Magnitude);
        assert_eq!(descriptor.combo_to_semantic(1), ComponentIndex::Component(0));
        assert_eq!(descriptor.initial_component(), ComponentIndex::Magnitude);
    }

    #[test]
    fn combo_round_trips_for_every_position() {
        for descriptor in [pressure_descriptor(), velocity_descriptor()] {
            for combo in 0..descriptor.display_names().len() {
                let semantic = descriptor.combo_to_semantic(combo);
                assert_eq!(descriptor.semantic_to_combo(semantic), combo);
            }
        }
    }

    #[test]
    fn semantic_round_trips_for_every_component() {
        let descriptor = velocity_descriptor();

        let mut semantics = vec![ComponentIndex::Magnitude];
        semantics.extend((0..descriptor.components()).map(ComponentIndex::Component));

        for semantic in semantics {
            let combo = descriptor.semantic_to_combo(semantic);
            assert_eq!(descriptor.combo_to_semantic(combo), semantic);
        }
    }

    #[test]
    fn magnitude_without_option_clamps_to_first_combo() {
        let descriptor = pressure_descriptor();

        assert_eq!(descriptor.semantic_to_combo(ComponentIndex::Magnitude), 0);
    }

    #[test]
    fn display_names_resolve_per_semantic_index() {
        let descriptor = velocity_descriptor();

        assert_eq!(
            descriptor.display_name(ComponentIndex::Magnitude),
            "Magnitude"
        );
        assert_eq!(descriptor.display_name(ComponentIndex::Component(0)), "X");
        assert_eq!(descriptor.display_name(ComponentIndex::Component(2)), "Z");
        assert_eq!(
            descriptor.display_name(ComponentIndex::Component(7)),
            "Component 7"
        );
    }

    #[test]
    fn render_index_round_trips() {
        for index in [-1, 0, 2] {
            assert_eq!(
                ComponentIndex::from_render_index(index).to_render_index(),
                index
            );
        }
        assert_eq!(ComponentIndex::Magnitude.to_render_index(), -1);
    }

    #[test]
    fn sparse_attribute_names_fall_back_per_index() {
        let mut names = ComponentNames::default();
        names.insert(
            "Velocity",
            vec![Some("U".to_string()), None, Some("W".to_string())],
        );

        let catalog = build_catalog(
            &[PointArrayInfo::new("Velocity", 3)],
            &names,
            NamingPolicy::default(),
        );

        assert_eq!(
            catalog[0].display_names(),
            ["Magnitude", "U", "Component 1", "W"]
        );
    }

    #[test]
    fn attribute_names_take_priority_over_native_names() {
        let mut info = PointArrayInfo::new("Velocity", 2);
        info.native_names = vec![Some("native 0".to_string()), Some("native 1".to_string())];

        let mut names = ComponentNames::default();
        names.insert("Velocity", vec![Some("attr 0".to_string()), None]);

        let catalog = build_catalog(&[info], &names, NamingPolicy::default());

        assert_eq!(catalog[0].display_names(), ["Magnitude", "attr 0", "native 1"]);
    }

    #[test]
    fn unnamed_arrays_are_skipped() {
        let catalog = build_catalog(
            &[
                PointArrayInfo::new("", 1),
                PointArrayInfo::new("Pressure", 1),
            ],
            &ComponentNames::default(),
            NamingPolicy::default(),
        );

        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog[0].name(), "Pressure");
    }

    #[test]
    fn empty_input_builds_an_empty_catalog() {
        let catalog = build_catalog(&[], &ComponentNames::default(), NamingPolicy::default());

        assert!(catalog.is_empty());
    }

    #[test]
    fn cartesian_policy_names_three_component_arrays() {
        let catalog = build_catalog(
            &[
                PointArrayInfo::new("Velocity", 3),
                PointArrayInfo::new("Stress", 2),
            ],
            &ComponentNames::default(),
            NamingPolicy::Cartesian,
        );

        assert_eq!(catalog[0].display_names(), ["Magnitude", "X", "Y", "Z"]);
        assert_eq!(
            catalog[1].display_names(),
            ["Magnitude", "Component 0", "Component 1"]
        );
    }
}
