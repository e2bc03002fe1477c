//! The Rust output of `rsis-gen` for `generated/rover.toml`, compiled into the test and loaded
//! back through its own reflection entry points.

mod common;

#[allow(dead_code)]
#[path = "generated/rover.rs"]
mod rover;

use std::{
    mem::{offset_of, size_of},
    path::Path,
};

use rsis::{
    loader::Linker,
    schema::{Language, Manifest, Port, PrimitiveType},
    sys::model::{ModelApi, ModelBinding},
    Error, LoaderOptions, MetadataRegistry, Session, Value,
};

fn binding() -> ModelBinding {
    ModelBinding::from_api(ModelApi {
        create_model: rover::rsis_create_model,
        reflect: rover::rsis_reflect,
        metadata: rover::rsis_metadata,
    })
}

struct GeneratedLinker;

impl Linker for GeneratedLinker {
    fn link(&self, _manifest: &Manifest, _binary: &Path) -> Result<ModelBinding, Error> {
        Ok(binding())
    }
}

fn layout(registry: &MetadataRegistry, class: &str) -> Vec<(String, usize)> {
    registry
        .struct_fields("rover", class)
        .unwrap()
        .into_iter()
        .map(|field| (field.name.clone(), field.offset))
        .collect()
}

fn size(registry: &MetadataRegistry, class: &str) -> Option<usize> {
    registry.library("rover").unwrap().class(class).unwrap().size()
}

#[test_log::test]
fn test_reflected_layout() {
    let mut registry = MetadataRegistry::new();
    registry
        .register_reflected("rover", Language::Rust, None, &binding())
        .unwrap();

    assert_eq!(registry.library("rover").unwrap().top(), "Rover");
    assert_eq!(
        registry.struct_names("rover").unwrap(),
        ["Rover", "RoverData", "RoverInputs", "Wheel"]
    );

    assert_eq!(
        layout(&registry, "RoverInputs"),
        [
            ("pos".to_owned(), offset_of!(rover::RoverInputs, pos)),
            ("enabled".to_owned(), offset_of!(rover::RoverInputs, enabled)),
        ]
    );
    assert_eq!(
        layout(&registry, "RoverData"),
        [
            ("mass".to_owned(), offset_of!(rover::RoverData, mass)),
            ("count".to_owned(), offset_of!(rover::RoverData, count)),
            ("matrix".to_owned(), offset_of!(rover::RoverData, matrix)),
            ("type".to_owned(), offset_of!(rover::RoverData, r#type)),
            ("label".to_owned(), offset_of!(rover::RoverData, label)),
        ]
    );
    assert_eq!(
        layout(&registry, "Wheel"),
        [("speed".to_owned(), offset_of!(rover::Wheel, speed))]
    );
    assert_eq!(
        layout(&registry, "Rover"),
        [
            ("inputs".to_owned(), offset_of!(rover::Rover, inputs)),
            ("data".to_owned(), offset_of!(rover::Rover, data)),
            ("wheels".to_owned(), offset_of!(rover::Rover, wheels)),
        ]
    );

    assert_eq!(size(&registry, "RoverInputs"), Some(size_of::<rover::RoverInputs>()));
    assert_eq!(size(&registry, "RoverData"), Some(size_of::<rover::RoverData>()));
    assert_eq!(size(&registry, "Wheel"), Some(size_of::<rover::Wheel>()));
    assert_eq!(size(&registry, "Rover"), Some(size_of::<rover::Rover>()));

    let data = registry.struct_fields("rover", "RoverData").unwrap();
    assert_eq!(data[2].port, Port::signal(PrimitiveType::Float32, vec![2, 2]));
    assert_eq!(data[3].port.primitive(), Some(PrimitiveType::UInt8));
    assert_eq!(data[4].port.primitive(), Some(PrimitiveType::String));

    let top = registry.struct_fields("rover", "Rover").unwrap();
    assert_eq!(top[2].port.class(), Some("Wheel"));
    assert_eq!(top[2].port.dims, [4]);
}

#[test_log::test]
fn test_generated_model_signals() {
    let dir = tempfile::tempdir().unwrap();
    common::write_manifest(dir.path(), "rover", "release", "rust", "");
    let mut session = Session::with_linker(
        LoaderOptions::default().with_search_path(dir.path()),
        GeneratedLinker,
    );
    session.load_library("rover", None, None).unwrap();
    let model = session.create_model("rover", "r1", ["drive"]).unwrap();

    // Defaults from the interface document
    assert_eq!(
        session.get(&model, "data.mass").unwrap().as_scalar::<f64>(),
        Some(35.6)
    );
    assert_eq!(
        session.get(&model, "data.matrix").unwrap(),
        Value::array(vec![2, 2], vec![1.0f32, 2.0, 3.0, 4.0]).unwrap()
    );
    assert_eq!(
        session.get(&model, "data.type").unwrap().as_scalar::<u8>(),
        Some(7)
    );

    session
        .set(&model, "inputs.pos", &Value::from(vec![1.0, 2.0, 3.0]))
        .unwrap();
    session.set(&model, "data.count", &Value::from(-3i32)).unwrap();

    let object = session.model(&model).unwrap().object();
    // SAFETY: `rsis_create_model` hands out a `Box<Rover>` behind the model pointer.
    let state = unsafe { &**(object.as_ptr() as *const Box<rover::Rover>) };
    assert_eq!(state.inputs.pos, [1.0, 2.0, 3.0]);
    assert_eq!(state.data.count, -3);
    assert_eq!(state.data.label, "r-1");
}
