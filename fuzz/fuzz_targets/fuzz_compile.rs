#![no_main]

use libfuzzer_sys::fuzz_target;

// Arbitrary bytes, parsed as JSON, compiled as a schema, then the same value
// formatted and validated as data against it. No input may panic.
fuzz_target!(|data: &[u8]| {
    if let Ok(value) = serde_json::from_slice::<serde_json::Value>(data) {
        let options = jsonschema_form_core::CompileOptions::default();
        if let Ok(form) = jsonschema_form_core::compile(&value, None, Some(&value), &options) {
            let _ = form.format(&value, &options.format);
            let _ = form.validate(&value);
            let _ = form.materialize().validate();
        }
    }
});
