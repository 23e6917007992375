#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use pwpatch_edit::{Document, NewEntry, key_equals};
use pwpatch_types::path::DocPath;
use serde_yaml::{Mapping, Value};

#[derive(Debug, Arbitrary)]
struct Input {
    keys: Vec<String>,
    anchor: String,
    new_key: String,
}

fuzz_target!(|input: Input| {
    let mut map = Mapping::new();
    for k in &input.keys {
        map.insert(Value::String(k.clone()), Value::Null);
    }
    let mut root = Mapping::new();
    root.insert(Value::String("services".into()), Value::Mapping(map));
    let mut doc = Document::from_value(Value::Mapping(root));

    let path = DocPath::parse("services");
    let entry = || NewEntry::Keyed {
        key: input.new_key.clone(),
        value: Value::Null,
    };
    doc.insert_after_anchor(&path, &key_equals(input.anchor.as_str()), entry())
        .expect("services is a mapping");
    let once = doc.clone();
    doc.insert_after_anchor(&path, &key_equals(input.anchor.as_str()), entry())
        .expect("services is a mapping");
    assert_eq!(doc, once);

    let text = doc.to_yaml_string().expect("emit");
    let back = Document::parse(&text).expect("reparse");
    assert_eq!(back, doc);
});
