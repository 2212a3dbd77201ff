#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|type_: fieldmodel::FieldType| {
    // Rendered types must always parse back to themselves; unions with fewer
    // than two members are the one form the grammar cannot express.
    let text = type_.to_string();
    if let Ok(parsed) = text.parse::<fieldmodel::FieldType>() {
        assert_eq!(type_, parsed, "{}", text);
    }
});
