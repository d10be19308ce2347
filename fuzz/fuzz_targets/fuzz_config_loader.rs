#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|input: (&str, &str)| {
    // Parse errors and validation errors are both fine; panics are not.
    let (doc, interval) = input;
    if let Ok(mut cfg) = hrc_config::load_toml(doc) {
        let _ = cfg.validate();
        let _ = cfg.apply_overrides_from(|k| {
            (k == hrc_config::ENV_POLL_INTERVAL_MS).then(|| interval.to_string())
        });
        let _ = cfg.validate();
    }
});
