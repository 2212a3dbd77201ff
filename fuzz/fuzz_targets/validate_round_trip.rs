#![no_main]
use libfuzzer_sys::fuzz_target;

use fieldmodel::{
    to_text, validate, AliasMode, ExtraPolicy, FieldSpec, FieldType, FieldValue, RawInput,
    Schema, SerializeOptions, ValidateOptions,
};

fuzz_target!(|input: (AliasMode, ExtraPolicy, String)| {
    let (alias_mode, extra_policy, text) = input;

    let schema = Schema::builder("Person")
        .field(FieldSpec::new("first_name", FieldType::String).with_alias("firstName"))
        .field(FieldSpec::new(
            "last_name",
            FieldType::optional(FieldType::union(vec![FieldType::Integer, FieldType::String])),
        ))
        .field(FieldSpec::new("age", FieldType::optional(FieldType::Integer)))
        .field(
            FieldSpec::new("date_of_birth", FieldType::optional(FieldType::Date))
                .with_alias("dateOfBirth")
                .with_default(FieldValue::Null),
        )
        .build()
        .unwrap();

    let options = ValidateOptions::new()
        .with_alias_mode(alias_mode)
        .with_extra_policy(extra_policy);

    // We're only interested in inputs that validate in the first place.
    let instance = match validate(&schema, RawInput::Text(&text), &options) {
        Ok(instance) => instance,
        Err(_) => return,
    };

    let by_alias = alias_mode != AliasMode::CanonicalOnly;
    let encoded = to_text(&instance, &SerializeOptions::new().with_by_alias(by_alias)).unwrap();
    let decoded = validate(&schema, RawInput::Text(&encoded), &options).unwrap();
    assert_eq!(instance, decoded);
});
