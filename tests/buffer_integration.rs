// Buffer integration tests
//
// End-to-end use of buffers: building, interning, writing through nested
// views and moving data between buffers.

use glam::{Mat4, Vec2, Vec3, Vec4};

use dynamic_cbuffer::buffer::{Buffer, StagedBuffer};
use dynamic_cbuffer::layout::{ElementType, LayoutRegistry, LeafData, LeafType, RawLayout};
use dynamic_cbuffer::schema::SchemaDesc;
use dynamic_cbuffer::LayoutError;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Nested structs, arrays of structs, and arrays of arrays of matrices
fn scene_layout() -> RawLayout {
    let mut lay = RawLayout::new();
    lay.add(ElementType::Struct, "surface");
    lay.key_mut("surface")
        .add(LeafType::Float3, "normal")
        .add(LeafType::Float, "gloss");
    lay.add(LeafType::Float, "exposure").add(ElementType::Array, "arr");

    let template = lay
        .key_mut("arr")
        .set_array(ElementType::Struct, 4)
        .template_mut();
    template
        .add(LeafType::Float3, "tint")
        .add(ElementType::Array, "weights")
        .add(ElementType::Array, "bones")
        .add(LeafType::Bool, "enabled");
    template.key_mut("weights").set_array(LeafType::Float, 6);
    template
        .key_mut("bones")
        .set_array(ElementType::Array, 6)
        .template_mut()
        .set_array(LeafType::Matrix, 4);
    lay
}

#[test]
fn test_nested_round_trip() {
    init_logging();
    let registry = LayoutRegistry::new();
    let mut cb = Buffer::from_raw(&registry, scene_layout());

    cb.key_mut("exposure").set(42.0f32);
    assert_eq!(cb.key("exposure").get::<f32>(), 42.0);

    cb.key_mut("surface").key("gloss").set(420.0f32);
    assert_eq!(cb.key("surface").key("gloss").get::<f32>(), 420.0);

    cb.key_mut("arr").index(2).key("weights").index(5).set(111.0f32);
    assert_eq!(cb.key("arr").index(2).key("weights").index(5).get::<f32>(), 111.0);

    cb.key_mut("surface").key("normal").set(Vec3::new(69.0, 0.0, 0.0));
    assert_eq!(cb.key("surface").key("normal").get::<Vec3>(), Vec3::new(69.0, 0.0, 0.0));

    let bone = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
    cb.key_mut("arr").index(2).key("bones").index(5).index(3).set(bone);
    assert_eq!(cb.key("arr").index(2).key("bones").index(5).index(3).get::<Mat4>(), bone);

    cb.key_mut("arr").index(2).key("enabled").set(true);
    assert!(cb.key("arr").index(2).key("enabled").get::<bool>());
    cb.key_mut("arr").index(2).key("enabled").set(false);
    assert!(!cb.key("arr").index(2).key("enabled").get::<bool>());

    // neighbours untouched
    assert_eq!(cb.key("arr").index(1).key("weights").index(5).get::<f32>(), 0.0);
    assert_eq!(cb.key("arr").index(3).key("bones").index(5).index(3).get::<Mat4>(), Mat4::ZERO);

    assert_eq!(cb.size_in_bytes() % 16, 0);
}

#[test]
fn test_absent_members_are_invalid_not_fatal() {
    init_logging();
    let registry = LayoutRegistry::new();
    let mut cb = Buffer::from_raw(&registry, scene_layout());

    assert!(cb.key("surface").key("normal").is_valid());
    assert!(!cb.key("surface").key("fubar").is_valid());
    assert!(!cb.key("definitelyNotAField").is_valid());

    if let Some(mut normal) = cb.find_mut("surface").and_then(|s| s.find("normal")) {
        normal.set(Vec3::new(69.0, 0.0, 0.0));
    }
    assert_eq!(cb.key("surface").key("normal").get::<Vec3>().x, 69.0);

    assert!(cb.key_mut("surface").key("normal").set_if_valid(Vec3::new(1.0, 2.0, 3.0)));
    assert_eq!(*cb.key("surface").key("normal").leaf_ref::<Vec3>(), Vec3::new(1.0, 2.0, 3.0));
    assert!(!cb.key_mut("surface").key("phubar").set_if_valid(Vec3::new(2.0, 2.0, 7.0)));
}

#[test]
fn test_leaf_reference_writes_through() {
    init_logging();
    let mut lay = RawLayout::new();
    lay.add(ElementType::Struct, "surface");
    lay.key_mut("surface")
        .add(LeafType::Float3, "normal")
        .add(LeafType::Float, "gloss");
    let mut cb = Buffer::from_raw(&LayoutRegistry::new(), lay);

    cb.key_mut("surface").key("gloss").set(696969.6969f32);
    assert_eq!(*cb.key("surface").key("gloss").leaf_ref::<f32>(), 696969.6969);

    *cb.key_mut("surface").key("gloss").leaf_mut::<f32>() = 42.424242;
    assert_eq!(cb.key("surface").key("gloss").get::<f32>(), 42.424242);
}

#[test]
fn test_every_leaf_type_round_trips() {
    init_logging();
    let mut lay = RawLayout::new();
    for leaf in LeafType::ALL {
        lay.add(leaf, format!("v_{}", leaf));
    }
    let mut cb = Buffer::from_raw(&LayoutRegistry::new(), lay);

    let values = [
        LeafData::Float(1.5),
        LeafData::Float2(Vec2::new(1.0, -2.0)),
        LeafData::Float3(Vec3::new(0.1, 0.2, 0.3)),
        LeafData::Float4(Vec4::new(4.0, 3.0, 2.0, 1.0)),
        LeafData::Matrix(Mat4::from_cols_array(&[
            1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 16.0,
        ])),
        LeafData::Bool(true),
        LeafData::Integer(-7),
    ];
    for value in values {
        let name = format!("v_{}", value.leaf_type());
        cb.key_mut(&name).set_value(value);
        assert_eq!(cb.key(&name).value(), value);
    }
    assert_eq!(cb.key("v_integer").get::<i32>(), -7);
    assert_eq!(cb.key("v_float4").get::<Vec4>().x, 4.0);
}

#[test]
fn test_identical_schemas_are_interchangeable() {
    init_logging();
    let registry = LayoutRegistry::new();
    let mut a = Buffer::from_raw(&registry, scene_layout());
    let mut b = Buffer::from_raw(&registry, scene_layout());
    assert!(a.is_compatible(&b));
    assert_eq!(registry.len(), 1);

    let bone = Mat4::from_scale(Vec3::splat(3.0));
    a.key_mut("arr").index(2).key("bones").index(5).index(3).set(bone);
    b.copy_from(&a);
    assert_eq!(b.key("arr").index(2).key("bones").index(5).index(3).get::<Mat4>(), bone);
    assert_eq!(a.data(), b.data());

    a.key_mut("exposure").set(2.0f32);
    b.move_from(a);
    assert_eq!(b.key("exposure").get::<f32>(), 2.0);
}

#[test]
fn test_cooked_layout_shared_by_independent_buffers() {
    init_logging();
    let mut lay = RawLayout::new();
    lay.add(ElementType::Array, "arr");
    lay.key_mut("arr").set_array(LeafType::Float3, 6);
    let cooked = LayoutRegistry::new().intern(&mut lay);
    assert!(lay.is_empty());

    let mut b1 = Buffer::new(&cooked);
    let mut b2 = Buffer::new(&cooked);
    b1.key_mut("arr").index(0).set(Vec3::new(69.0, 0.0, 0.0));
    b2.key_mut("arr").index(0).set(Vec3::new(420.0, 0.0, 0.0));

    assert_eq!(b1.key("arr").index(0).get::<Vec3>().x, 69.0);
    assert_eq!(b2.key("arr").index(0).get::<Vec3>().x, 420.0);
    assert!(b1.is_compatible(&b2));
    assert!(b1.layout().shares_root_with(&cooked));
}

#[test]
fn test_last_index_is_in_bounds() {
    init_logging();
    let mut cb = Buffer::from_raw(&LayoutRegistry::new(), scene_layout());
    cb.key_mut("arr").index(3).key("tint").set(Vec3::ONE);
    assert_eq!(cb.key("arr").index(3).key("tint").get::<Vec3>(), Vec3::ONE);
    assert!(cb.key("arr").try_index(4).is_err());
}

#[test]
#[should_panic(expected = "Array index 4 out of bounds for length 4")]
fn test_index_past_end_is_fatal() {
    let cb = Buffer::from_raw(&LayoutRegistry::new(), scene_layout());
    cb.key("arr").index(4);
}

#[test]
#[should_panic(expected = "element is float3, accessed as float4")]
fn test_reading_with_wrong_type_is_fatal() {
    let cb = Buffer::from_raw(&LayoutRegistry::new(), scene_layout());
    cb.key("surface").key("normal").get::<Vec4>();
}

#[test]
#[should_panic(expected = "Incompatible buffer layouts")]
fn test_copy_between_different_layouts_is_fatal() {
    let registry = LayoutRegistry::new();
    let mut a = Buffer::from_raw(&registry, scene_layout());
    let mut other = RawLayout::new();
    other.add(LeafType::Float, "exposure");
    let b = Buffer::from_raw(&registry, other);
    a.copy_from(&b);
}

#[test]
fn test_schema_file_to_staged_upload() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("blur.toml");
    std::fs::write(
        &path,
        r#"
            [[field]]
            name = "nTaps"
            type = "integer"

            [[field]]
            name = "coefficients"
            type = "array"
            count = 15
            element = { type = "float" }
        "#,
    )
    .unwrap();

    let mut raw = SchemaDesc::from_path(&path).unwrap().to_raw_layout().unwrap();
    let cooked = LayoutRegistry::new().intern(&mut raw);
    let mut staged = StagedBuffer::new(Buffer::new(&cooked));
    assert!(staged.buffer().data().iter().all(|&b| b == 0));

    let mut gpu: Vec<u8> = Vec::new();
    {
        let buf = staged.edit();
        buf.key_mut("nTaps").set(15i32);
        for i in 0..15 {
            buf.key_mut("coefficients").index(i).set(1.0f32 / 15.0);
        }
    }
    assert_eq!(staged.flush(&mut gpu), Ok(true));
    assert_eq!(gpu.len(), 256);
    assert_eq!(&gpu[0..4], &15i32.to_ne_bytes());
    assert_eq!(&gpu[16..20], &(1.0f32 / 15.0).to_ne_bytes());
    assert_eq!(&gpu[240..244], &(1.0f32 / 15.0).to_ne_bytes());
    assert_eq!(staged.flush(&mut gpu), Ok(false));
}

#[test]
fn test_oversized_schema_fails_without_allocating() {
    init_logging();
    let mut lay = RawLayout::new();
    lay.add(LeafType::Integer, "n").add(ElementType::Array, "arr");
    lay.key_mut("arr").set_array(LeafType::Float, usize::MAX / 8);

    let registry = LayoutRegistry::new();
    assert!(matches!(
        Buffer::try_from_raw(&registry, lay),
        Err(LayoutError::LayoutTooLarge)
    ));
    assert!(registry.is_empty());
}
