#![no_main]
#[macro_use]
extern crate libfuzzer_sys;
extern crate tapfmt;

use tapfmt::frames::Reader;
use tapfmt::{Options, Pipeline};

// Feeds arbitrary bytes through the frame reader, envelope decoder and
// formatter. Errors are fine, panics are not.
fuzz_target!(|data: &[u8]| {
    let reader = match Reader::new(data) {
        Ok(r) => r,
        Err(_) => return,
    };

    let options = Options { print_id: true };
    for line in Pipeline::with_timezone(reader, options, chrono::Utc) {
        if line.is_err() {
            break;
        }
    }
});
