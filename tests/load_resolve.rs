use std::path::Path;

use vtu_color::catalog::ComponentIndex;
use vtu_color::prelude::*;
use vtu_color::{parse, NamingPolicy, Reader};

#[test]
fn full_load_and_color_resolution() {
    let model = Model::load(Path::new("./static/sample.vtu")).unwrap();

    let catalog = model.catalog();
    assert_eq!(catalog.len(), 2);
    assert_eq!(catalog[0].name(), "Pressure");
    assert_eq!(catalog[0].display_names(), ["Value"]);
    assert_eq!(catalog[1].name(), "Velocity");
    assert_eq!(catalog[1].display_names(), ["Magnitude", "U", "V", "W"]);

    let mut selection = SelectionState::new();

    // Pressure has no magnitude option, so the initial selection is its
    // first (and only) component
    let outcome = selection.install_catalog(catalog.clone());
    assert_eq!(
        outcome,
        InstallOutcome::Installed(SelectionChange {
            array_index: 0,
            component: ComponentIndex::Component(0),
        })
    );

    let directive = model.resolve(0, ComponentIndex::Component(0)).unwrap();
    assert_eq!(directive.title, "Pressure\nValue");
    assert_eq!(directive.range, (99.8, 102.0));
    assert_eq!(directive.component.to_render_index(), 0);

    // switching to Velocity resets the selection to its magnitude
    let change = selection.select_array(1).unwrap().unwrap();
    assert_eq!(change.array_index, 1);
    assert_eq!(change.component, ComponentIndex::Magnitude);

    let directive = model.resolve(change.array_index, change.component).unwrap();
    assert_eq!(directive.title, "Velocity\nMagnitude");
    assert_eq!(directive.range, (0.0, 5.0));
    assert_eq!(directive.component.to_render_index(), -1);

    // combo position 2 of ["Magnitude", "U", "V", "W"] is the V component
    let change = selection.select_component(2).unwrap().unwrap();
    assert_eq!(change.component, ComponentIndex::Component(1));

    let directive = model.resolve(change.array_index, change.component).unwrap();
    assert_eq!(directive.title, "Velocity\nV");
    assert_eq!(directive.range, (0.0, 4.0));
}

#[test]
fn cartesian_policy_applies_only_without_attribute_names() {
    let model =
        Model::load_with_policy(Path::new("./static/sample.vtu"), NamingPolicy::Cartesian)
            .unwrap();

    // the document's ComponentName attributes still win over the policy
    assert_eq!(
        model.catalog()[1].display_names(),
        ["Magnitude", "U", "V", "W"]
    );
}

#[test]
fn documents_without_points_are_rejected() {
    let result = Model::load(Path::new("./static/no_points.vtu"));

    match result {
        Err(error) => assert!(error.is_invalid_document()),
        Ok(_) => panic!("a grid without points must not load"),
    }
}

#[test]
fn missing_files_surface_an_io_error() {
    let result = Model::load(Path::new("./static/does_not_exist.vtu"));

    match result {
        Err(error) => assert!(!error.is_invalid_document()),
        Ok(_) => panic!("a missing file must not load"),
    }
}

#[test]
fn unnamed_arrays_leave_nothing_to_color() {
    let input = r#"
        <VTKFile type="UnstructuredGrid" byte_order="LittleEndian">
        <UnstructuredGrid>
        <Piece NumberOfPoints="2" NumberOfCells="0">
            <PointData>
                <DataArray format="ascii">1.0 2.0</DataArray>
            </PointData>
        </Piece>
        </UnstructuredGrid>
        </VTKFile>
    "#;

    let grid = parse::parse_xml_document(Reader::from_str(input)).unwrap();
    let infos: Vec<PointArrayInfo> = grid
        .point_arrays()
        .iter()
        .map(|array| PointArrayInfo::new(array.name(), array.components()))
        .collect();
    let catalog = build_catalog(&infos, &ComponentNames::default(), NamingPolicy::default());

    let mut selection = SelectionState::new();
    let outcome = selection.install_catalog(catalog);

    assert_eq!(outcome, InstallOutcome::NoColorableArrays);
    assert!(!selection.is_loaded());
}

#[test]
fn selections_held_across_a_model_swap_are_detected() {
    let model = Model::load(Path::new("./static/sample.vtu")).unwrap();

    // a catalog built for some other document
    let stale = build_catalog(
        &[PointArrayInfo::new("Temperature", 1)],
        &ComponentNames::default(),
        NamingPolicy::default(),
    );

    let result = resolve(&stale, model.grid(), 0, ComponentIndex::Component(0));

    assert_eq!(
        result,
        Err(ResolveError::ArrayUnavailable("Temperature".to_string()))
    );
}

#[test]
fn resolving_past_the_catalog_is_rejected() {
    let model = Model::load(Path::new("./static/sample.vtu")).unwrap();
    let len = model.catalog().len();

    let result = model.resolve(len, ComponentIndex::Component(0));

    assert_eq!(
        result,
        Err(ResolveError::InvalidArrayIndex { index: len, len })
    );
}
