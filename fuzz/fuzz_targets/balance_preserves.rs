#![no_main]
use libfuzzer_sys::fuzz_target;

use taproot::model::run_balance_preserves;

fuzz_target!(|values: Vec<u16>| { run_balance_preserves(values) });
