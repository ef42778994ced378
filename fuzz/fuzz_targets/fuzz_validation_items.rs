// SPDX-License-Identifier: MIT OR Apache-2.0
//! Fuzz `<items>` document reading.
#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(items) = modinput_protocol::read_validation_items(data) {
        // Exercise the accessors a validate callback would use.
        let item = &items.item;
        for (name, _) in item.single_value_parameters() {
            let _ = item.bool_param(name);
            let _ = item.parse::<u64>(name);
        }
        let _ = item.multi_value_parameters().count();
        let _ = format!("{:?}", items.server);
    }
});
