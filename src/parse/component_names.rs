//! independent scan of `ComponentName<i>` attributes
//!
//! Some vtu writers attach human readable component names to a `DataArray`
//! element as `ComponentName0`, `ComponentName1`, ... attributes. Those
//! never make it into the parsed grid, so this module walks the raw
//! document a second time and collects them into a typed map keyed by
//! array name, which is exactly the shape the catalog builder consumes.

use std::collections::HashMap;
use std::io::BufRead;

use quick_xml::events::BytesStart;
use quick_xml::events::Event;
use quick_xml::name::QName;
use quick_xml::reader::Reader;

/// Attribute-sourced component names per array, kept at their component
/// index. An entry is `None` when the document named some components of an
/// array but not this one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComponentNames {
    names: HashMap<String, Vec<Option<String>>>,
}

impl ComponentNames {
    /// the name the document gave `array`'s component at `component`, if any
    pub fn get(&self, array: &str, component: usize) -> Option<&str> {
        self.names
            .get(array)?
            .get(component)
            .and_then(|name| name.as_deref())
    }

    /// Record the names for one array. A later insert under the same name
    /// replaces the earlier one, so repeated `DataArray` elements resolve
    /// last-seen-wins, like name lookup in the grid itself.
    pub fn insert(&mut self, array: impl Into<String>, names: Vec<Option<String>>) {
        self.names.insert(array.into(), names);
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Walk a whole document and collect every `ComponentName<i>` attribute.
///
/// The scan is deliberately forgiving: it never fails. Malformed xml or
/// attributes simply end the walk early with whatever was collected up to
/// that point, and arrays without a `Name` or a positive
/// `NumberOfComponents` are ignored.
pub fn scan_component_names<R: BufRead>(mut reader: Reader<R>) -> ComponentNames {
    let mut buffer = Vec::new();
    let mut out = ComponentNames::default();

    loop {
        let done = {
            let event = match reader.read_event_into(&mut buffer) {
                Ok(event) => event,
                Err(_) => break,
            };

            match &event {
                Event::Start(element) | Event::Empty(element)
                    if element.name() == QName(b"DataArray") =>
                {
                    collect_component_names(element, &mut out);
                    false
                }
                Event::Eof => true,
                _ => false,
            }
        };

        if done {
            break;
        }

        buffer.clear();
    }

    out
}

fn collect_component_names(element: &BytesStart<'_>, out: &mut ComponentNames) {
    let mut array_name = None;
    let mut components = 0usize;

    for attribute in element.attributes().filter_map(|x| x.ok()) {
        match attribute.key.as_ref() {
            b"Name" => {
                array_name = String::from_utf8(attribute.value.to_vec())
                    .ok()
                    .filter(|name| !name.is_empty());
            }
            b"NumberOfComponents" => {
                components = std::str::from_utf8(&attribute.value)
                    .ok()
                    .and_then(|value| value.parse().ok())
                    .unwrap_or(0);
            }
            _ => {}
        }
    }

    let array_name = match array_name {
        Some(name) => name,
        None => return,
    };
    if components == 0 {
        return;
    }

    let mut names: Vec<Option<String>> = vec![None; components];
    for (index, slot) in names.iter_mut().enumerate() {
        let key = format!("ComponentName{index}");
        let value = element
            .attributes()
            .filter_map(|x| x.ok())
            .find(|attribute| attribute.key.as_ref() == key.as_bytes())
            .and_then(|attribute| String::from_utf8(attribute.value.to_vec()).ok())
            .filter(|value| !value.is_empty());
        *slot = value;
    }

    // arrays that name nothing stay out of the map entirely
    if names.iter().any(Option::is_some) {
        out.insert(array_name, names);
    }
}
