//! Fuzz harness for the report-data marker parser in `index.html`.
//!
//! Target: `reportmerge_shell::extract_shell`

#![no_main]

use libfuzzer_sys::fuzz_target;
use reportmerge_shell::{extract_shell, render_shell};

fuzz_target!(|data: &[u8]| {
    let Ok(html) = std::str::from_utf8(data) else {
        return;
    };

    let Ok(shell) = extract_shell(html) else {
        return;
    };

    // Anything that parsed must survive re-rendering its own payload.
    if let Ok(bytes) = shell.decode_payload() {
        let rendered = render_shell(&shell.template, &bytes).expect("render into memory");
        let again = extract_shell(&rendered).expect("rendered shell has a marker");
        assert_eq!(again.decode_payload().expect("payload decodes"), bytes);
    }
});
