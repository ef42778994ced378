// SPDX-License-Identifier: MIT OR Apache-2.0
//! Fuzz `<input>` document reading.
//!
//! Feeds arbitrary bytes through `read_input_configuration`, verifying:
//! 1. Reading never panics on arbitrary input.
//! 2. Every stanza is reachable by name.
//! 3. A parsed configuration writes and reads back equal.
#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // --- Property 1: never panics ---
    let config = match modinput_protocol::read_input_configuration(data) {
        Ok(c) => c,
        Err(e) => {
            let _ = format!("{e}");
            return;
        }
    };

    // --- Property 2: lookup agrees with order ---
    for stanza in config.stanzas() {
        assert_eq!(config.stanza(stanza.name()), Some(stanza));
    }

    // --- Property 3: written documents read back unchanged ---
    // character references may smuggle in text the writer refuses
    let written = match modinput_protocol::write_input_configuration(Vec::new(), &config) {
        Ok(bytes) => bytes,
        Err(modinput_protocol::ProtocolError::InvalidCharacter { .. }) => return,
        Err(e) => panic!("writing to a Vec failed: {e}"),
    };
    let rt = modinput_protocol::read_input_configuration(&written[..])
        .expect("written configuration must read back");
    assert_eq!(rt, config);
});
