//! selection state for the array/component choice
//!
//! [`SelectionState`] owns the catalog of the currently loaded document and
//! the `(array, component)` pair the user picked. Transitions report the
//! new pair as a returned [`SelectionChange`] exactly when it changed —
//! that value is the signal to re-resolve the coloring; transitions that
//! leave the pair as-is report nothing, so a caller never re-resolves
//! redundantly.

use crate::catalog::{ArrayDescriptor, Catalog, ComponentIndex};

/// the new selection after a successful transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionChange {
    pub array_index: usize,
    pub component: ComponentIndex,
}

/// result of installing a freshly built catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallOutcome {
    /// the catalog is live and the initial selection was made
    Installed(SelectionChange),
    /// the document loaded but exposes nothing to color by; the state is
    /// back to "no model" and the caller should fall back to an uncolored
    /// mesh
    NoColorableArrays,
}

/// a rejected selection transition; the state is unchanged
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("no model is currently loaded")]
    NoModel,
    #[error("array index {index} is out of bounds for a catalog of {len} arrays")]
    InvalidIndex { index: usize, len: usize },
}

#[derive(Debug)]
struct Active {
    catalog: Catalog,
    array_index: usize,
    component: ComponentIndex,
}

/// Tracks which array and component of the current catalog is selected.
///
/// Starts out with no model; installing a catalog selects the first array
/// with its initial component (magnitude when offered). The state never
/// holds a selection that is invalid for the installed catalog.
#[derive(Debug, Default)]
pub struct SelectionState {
    active: Option<Active>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_loaded(&self) -> bool {
        self.active.is_some()
    }

    pub fn catalog(&self) -> Option<&Catalog> {
        self.active.as_ref().map(|active| &active.catalog)
    }

    /// the current `(array, component)` pair, if a model is loaded
    pub fn selection(&self) -> Option<SelectionChange> {
        self.active.as_ref().map(|active| SelectionChange {
            array_index: active.array_index,
            component: active.component,
        })
    }

    pub fn current_descriptor(&self) -> Option<&ArrayDescriptor> {
        let active = self.active.as_ref()?;
        active.catalog.get(active.array_index)
    }

    /// the display names a component selector should offer for the
    /// currently selected array, in combo-index order
    pub fn component_options(&self) -> &[String] {
        self.current_descriptor()
            .map(ArrayDescriptor::display_names)
            .unwrap_or(&[])
    }

    /// Install the catalog of a freshly loaded document, replacing
    /// whatever was selected before.
    ///
    /// An empty catalog clears the state instead and reports
    /// [`InstallOutcome::NoColorableArrays`]. Otherwise the selection
    /// resets to the first array and its initial component, and that
    /// selection is always reported — the old selection is meaningless
    /// against the new catalog even if the indices happen to match.
    pub fn install_catalog(&mut self, catalog: Catalog) -> InstallOutcome {
        if catalog.is_empty() {
            self.active = None;
            return InstallOutcome::NoColorableArrays;
        }

        let component = catalog[0].initial_component();
        self.active = Some(Active {
            catalog,
            array_index: 0,
            component,
        });

        InstallOutcome::Installed(SelectionChange {
            array_index: 0,
            component,
        })
    }

    /// Select an array by catalog index, resetting the component to that
    /// array's initial choice.
    pub fn select_array(&mut self, index: usize) -> Result<Option<SelectionChange>, SelectionError> {
        let active = self.active.as_mut().ok_or(SelectionError::NoModel)?;

        let descriptor = active
            .catalog
            .get(index)
            .ok_or(SelectionError::InvalidIndex {
                index,
                len: active.catalog.len(),
            })?;

        let component = descriptor.initial_component();
        if active.array_index == index && active.component == component {
            return Ok(None);
        }

        active.array_index = index;
        active.component = component;

        Ok(Some(SelectionChange {
            array_index: index,
            component,
        }))
    }

    /// Select a component of the current array by its flat selector
    /// position (combo index).
    pub fn select_component(
        &mut self,
        combo_index: usize,
    ) -> Result<Option<SelectionChange>, SelectionError> {
        let active = self.active.as_mut().ok_or(SelectionError::NoModel)?;

        let descriptor = &active.catalog[active.array_index];
        let component = descriptor.combo_to_semantic(combo_index);

        if active.component == component {
            return Ok(None);
        }

        active.component = component;

        Ok(Some(SelectionChange {
            array_index: active.array_index,
            component,
        }))
    }

    /// drop the catalog and selection, returning to the "no model" state
    pub fn clear(&mut self) {
        self.active = None;
    }
}
