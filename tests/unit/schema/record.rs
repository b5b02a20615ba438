use super::*;
use serde_json::json;

fn fields(v: Value) -> Map<String, Value> {
    v.as_object().cloned().unwrap()
}

#[test]
fn record_requires_an_object_and_keeps_assets() {
    assert!(Record::from_json(json!([1, 2])).is_err());
    let img = RasterImage::solid(1, 1, [1, 2, 3, 255]).unwrap();
    let rec = Record::from_json(json!({"length": 0}))
        .unwrap()
        .with_asset("a", img.clone());
    assert_eq!(rec.asset("a"), Some(&img));
    assert!(rec.asset("b").is_none());
    assert_eq!(rec.fields()["length"], json!(0));
}

#[test]
fn columns_validate_length_and_shape() {
    let f = fields(json!({"length": 2, "left": [1, 2, 3], "top": [1], "width": "x", "opt": null}));
    let cols = Columns::new(&f).unwrap();
    assert_eq!(cols.length(), 2);
    assert_eq!(cols.column("left").unwrap().len(), 3);

    let err = cols.column("top").unwrap_err();
    assert!(err.to_string().contains("field `top`"));
    assert!(err.to_string().contains("expected 2"));

    assert!(cols.column("width").unwrap_err().to_string().contains("sequence"));
    assert!(cols.column("height").unwrap_err().to_string().contains("missing"));
    assert!(cols.opt_column("opt").unwrap().is_none());

    let f = fields(json!({"length": -1}));
    assert!(Columns::new(&f).is_err());
}

#[test]
fn value_converters_name_element_and_field() {
    assert_eq!(num(&json!(2.5), 0, "x").unwrap(), 2.5);
    assert_eq!(num(&json!("3"), 0, "x").unwrap(), 3.0);
    let err = num(&json!([1]), 4, "font_size").unwrap_err();
    assert_eq!(
        err.field_path().unwrap(),
        &crate::foundation::error::FieldPath::element(4, "font_size")
    );
    assert!(boolean(&json!("true"), 0, "c").unwrap());
    assert!(!boolean(&json!("false"), 0, "c").unwrap());
    assert!(boolean(&json!(1), 0, "c").unwrap());
    assert!(boolean(&json!("maybe"), 0, "c").is_err());
    assert_eq!(opt_string(&Value::Null, 0, "s").unwrap(), None);
}

#[test]
fn per_char_accepts_missing_and_null() {
    let col = vec![json!([true, false]), Value::Null, json!(3)];
    assert_eq!(per_char(Some(col.as_slice()), 0, "font_bold").unwrap().len(), 2);
    assert!(per_char(Some(col.as_slice()), 1, "font_bold").unwrap().is_empty());
    assert!(per_char(None, 0, "font_bold").unwrap().is_empty());
    assert!(per_char(Some(col.as_slice()), 2, "font_bold").is_err());
}
