#![no_main]
#[macro_use]
extern crate libfuzzer_sys;
extern crate tapfmt;

fuzz_target!(|data: &[u8]| {
    if let Ok(m) = tapfmt::Message::from_slice(data) {
        let _ = tapfmt::RecordField(Some(&m)).to_string();
    }
});
