use hedron::primitive::attribute::{
    Attribute, AttributeComponent, AttributeData, AttributeError, AttributeType,
};

#[test]
fn attribute_length_must_match_width() {
    assert_eq!(
        Attribute::new(AttributeType::Vec3, vec![0.0f32; 7]),
        Err(AttributeError::Width { len: 7, width: 3 })
    );
}

#[test]
fn attribute_sizes() {
    let attr = Attribute::new(AttributeType::Vec2, vec![1u16, 2, 3, 4, 5, 6]).unwrap();
    assert_eq!(attr.component(), AttributeComponent::U16);
    assert_eq!(attr.vertex_count(), 3);
    assert_eq!(attr.byte_length(), Ok(12));
    assert_eq!(attr.get_f32(2, 1), 6.0);
}

#[test]
fn attribute_bounds() {
    let attr = Attribute::new(AttributeType::Vec3, vec![1.0f32, -2.0, 3.0, -1.0, 5.0, 0.0]).unwrap();
    assert_eq!(
        attr.bounds(),
        Some((vec![-1.0, -2.0, 0.0], vec![1.0, 5.0, 3.0]))
    );
    let empty = Attribute::new(AttributeType::Vec3, Vec::<f32>::new()).unwrap();
    assert_eq!(empty.bounds(), None);
}

#[test]
fn data_from_unaligned_bytes() {
    let bytes = [0u8, 1, 0, 2, 0];
    let data = AttributeData::from_bytes(AttributeComponent::U16, &bytes[1..], 2).unwrap();
    assert_eq!(data, AttributeData::U16(vec![1, 2]));
    assert_eq!(AttributeData::from_bytes(AttributeComponent::U16, &bytes, 3), None);
}

#[test]
fn data_macro_reaches_every_variant() {
    let data = AttributeData::zeroed(AttributeComponent::I8, 4);
    let len = hedron::with_attribute_data!(&data, v => v.len());
    assert_eq!(len, 4);
    assert_eq!(data.as_bytes().len(), 4);
}
