//! Property tests for reportmerge-shell

use proptest::prelude::*;
use reportmerge_shell::{ShellTemplate, extract_shell, render_shell};

fn html_text() -> impl Strategy<Value = String> {
    // Shell text that cannot itself contain a marker.
    "[a-zA-Z0-9 <>/=\"\n]{0,64}".prop_filter("no script tags", |s| !s.contains("<script>"))
}

proptest! {
    /// Rendering a payload into any template and extracting it again gives
    /// back the same template and bytes.
    #[test]
    fn prop_render_extract_roundtrip(
        before in html_text(),
        after in html_text(),
        archive in proptest::collection::vec(any::<u8>(), 0..512),
    ) {
        let template = ShellTemplate::new(before, after, "playwrightReportBase64");
        let html = render_shell(&template, &archive).unwrap();
        let shell = extract_shell(&html).unwrap();
        prop_assert_eq!(&shell.template, &template);
        prop_assert_eq!(shell.decode_payload().unwrap(), archive);
    }

    /// The parser never panics, whatever it is fed.
    #[test]
    fn prop_extract_never_panics(html in "\\PC{0,256}") {
        let _ = extract_shell(&html);
    }
}
