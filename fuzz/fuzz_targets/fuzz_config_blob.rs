//! Fuzz target: stored configuration blob
//!
//! Loads arbitrary bytes as the persisted `DeviceConfig` and checks:
//! - No panics under any byte sequence
//! - Anything `load` accepts passes validation and survives a save / load
//!
//! cargo fuzz run fuzz_config_blob

#![no_main]

use airmon::adapters::nvs::NvsAdapter;
use airmon::app::ports::ConfigPort;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(nvs) = NvsAdapter::new() else {
        return;
    };
    nvs.inject_raw(data);
    let Ok(config) = nvs.load() else {
        return;
    };
    assert!(config.validate().is_ok());
    nvs.save(&config).expect("valid config must save");
    assert_eq!(nvs.load(), Ok(config));
});
