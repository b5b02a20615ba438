use super::*;
use serde_json::json;

#[test]
fn from_features_collects_nested_class_labels() {
    let features = json!({
        "length": {"_type": "Value", "dtype": "int64"},
        "type": {
            "_type": "Sequence",
            "feature": {"_type": "ClassLabel", "names": ["ImageElement", "TextElement"]},
        },
        "font": [{"_type": "ClassLabel", "names": ["Montserrat", "Roboto"]}],
        "text_align": {
            "_type": "Sequence",
            "feature": {"_type": "ClassLabel", "names": ["", "left", "center"]},
        },
    });
    let d = SchemaDescriptor::from_features_json(SchemaRevision::V5, &features).unwrap();
    assert_eq!(d.class_labels.len(), 3);
    assert_eq!(d.class_labels["font"], vec!["Montserrat", "Roboto"]);
    assert!(SchemaDescriptor::from_features_json(SchemaRevision::V5, &json!([])).is_err());
}

#[test]
fn decode_replaces_integers_recursively() {
    let d = SchemaDescriptor::new(SchemaRevision::V4)
        .with_class_labels("type", ["imageElement", "textElement"]);
    let mut fields = json!({"type": [1, 0, [1]], "length": 3})
        .as_object()
        .cloned()
        .unwrap();
    d.decode_class_labels(&mut fields).unwrap();
    assert_eq!(fields["type"], json!(["textElement", "imageElement", ["textElement"]]));
    assert_eq!(fields["length"], json!(3));

    let mut bad = json!({"type": [7]}).as_object().cloned().unwrap();
    let err = d.decode_class_labels(&mut bad).unwrap_err();
    assert!(err.to_string().contains("field `type`"));
}

#[test]
fn descriptor_round_trips_through_json() {
    let d = SchemaDescriptor::new(SchemaRevision::V5).with_class_labels("font", ["A"]);
    let v = serde_json::to_value(&d).unwrap();
    assert_eq!(v["revision"], "v5");
    let back: SchemaDescriptor = serde_json::from_value(v).unwrap();
    assert_eq!(back, d);
}
