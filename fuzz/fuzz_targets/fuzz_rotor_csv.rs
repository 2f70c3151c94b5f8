#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // The rotor preset loader must reject arbitrary CSV without panicking.
    let _ = spindle_config::RotorTable::from_csv_str(data);
});
