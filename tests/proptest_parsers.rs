//! Property-based tests for device description parsers.
//!
//! Ensures parsers don't panic on arbitrary input, including random strings,
//! sectioned-text fragments, and XML-like fragments, and that well-formed
//! sections survive a reconstruction round trip.

use proptest::prelude::*;
use devdesc_tools::parsers::{detect_format, parse_device_str};
use devdesc_tools::reconstruct::reconstruct;

proptest! {
    // 500 cases balances coverage vs speed for parser fuzz tests.
    // Most tests intentionally only assert no-panic (not result correctness)
    // since random input is expected to produce Err in almost all cases.
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn parse_device_str_doesnt_panic(s in "\\PC{0,2000}") {
        // Random input should always return Err, never panic
        let result = parse_device_str(&s);
        prop_assert!(result.is_err(), "Random input should not parse successfully: {:?}", s);
    }

    #[test]
    fn detect_format_doesnt_panic(s in "\\PC{0,2000}") {
        let _ = detect_format(&s);
    }

    #[test]
    fn sectioned_text_doesnt_panic(
        section in "[A-Za-z ]{1,16}",
        key in "[A-Za-z]{1,16}",
        value in "\\PC{0,80}",
    ) {
        // Header plus one entry; the value may contain quotes, comment
        // markers or stray semicolons.
        let input = format!("[{section}]\n{key} = {value};\n");
        let _ = parse_device_str(&input);
        let _ = detect_format(&input);
    }

    #[test]
    fn unterminated_entry_doesnt_panic(
        key in "[A-Za-z]{1,16}",
        value in "[^;\"$]{0,80}",
    ) {
        // No trailing semicolon on the last entry.
        let input = format!("[Device]\n{key} = {value}");
        let _ = parse_device_str(&input);
    }

    #[test]
    fn xml_like_input_doesnt_panic(
        s in prop::string::string_regex(r#"<[a-z]{1,20}>[^<]{0,200}</[a-z]{1,20}>"#).unwrap()
    ) {
        let _ = parse_device_str(&s);
    }

    #[test]
    fn iodd_shaped_input_doesnt_panic(inner in "\\PC{0,300}") {
        // Arbitrary body inside a recognizable root; broken markup must
        // surface as an error, not a panic.
        let input = format!("<?xml version=\"1.0\"?><IODevice>{inner}</IODevice>");
        let _ = parse_device_str(&input);
        let _ = detect_format(&input);
    }

    #[test]
    fn empty_and_whitespace_doesnt_panic(s in "\\s{0,100}") {
        let _ = parse_device_str(&s);
        let _ = detect_format(&s);
    }

    #[test]
    fn comment_heavy_input_doesnt_panic(
        comment in "\\PC{0,100}",
        key in "[A-Za-z]{1,12}",
    ) {
        let input = format!("$ {comment}\n[Device]\n{key} = 1; $ {comment}\n");
        let _ = parse_device_str(&input);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    // Round-trip fidelity over generated identity sections. Values stay in
    // the shapes whose rendering is notation-exact: non-negative hex,
    // decimal integers of any sign, and quote-free quoted text.
    #[test]
    fn generated_identity_section_roundtrips(
        vendor in any::<u32>(),
        product in any::<u16>(),
        major in 0i64..1000,
        name in "[A-Za-z0-9 ]{1,24}",
    ) {
        let input = format!(
            "[Device]\n        VendCode = {vendor};\n        ProdCode = 0x{product:X};\n        MajRev = {major};\n        ProdName = \"{name}\";\n"
        );

        let outcome = parse_device_str(&input).expect("generated section should parse");
        prop_assert!(outcome.diagnostics.is_empty(), "diagnostics: {:?}", outcome.diagnostics);

        let rendered = reconstruct(&outcome.model).expect("reconstruct");
        let reparsed = parse_device_str(&rendered.content).expect("re-parse");
        prop_assert_eq!(&outcome.model, &reparsed.model);
    }

    #[test]
    fn generated_file_section_roundtrips(
        revision_major in 0i64..100,
        revision_minor in 0i64..10,
        description in "[A-Za-z0-9 ]{1,40}",
    ) {
        let input = format!(
            "[File]\n        DescText = \"{description}\";\n        Revision = {revision_major}.{revision_minor};\n"
        );

        let outcome = parse_device_str(&input).expect("generated section should parse");
        let rendered = reconstruct(&outcome.model).expect("reconstruct");
        let reparsed = parse_device_str(&rendered.content).expect("re-parse");
        prop_assert_eq!(&outcome.model, &reparsed.model);
    }
}
