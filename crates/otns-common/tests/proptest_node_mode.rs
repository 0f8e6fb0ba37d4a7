//! Property-based tests for node mode parsing.

use otns_common::NodeMode;
use proptest::prelude::*;

fn mode_string() -> impl Strategy<Value = String> {
    proptest::collection::vec(prop_oneof![Just('r'), Just('s'), Just('d'), Just('n')], 0..8)
        .prop_map(|chars| chars.into_iter().collect())
}

proptest! {
    #[test]
    fn rendered_mode_parses_back(s in mode_string()) {
        let mode = NodeMode::parse(&s);
        prop_assert_eq!(NodeMode::parse(&mode.to_string()), mode);
    }

    #[test]
    fn noise_never_sets_flags(noise in "[a-cefghijklmopqtuvwxyz0-9 -]{0,16}") {
        prop_assert!(NodeMode::parse(&noise).is_empty());
    }

    #[test]
    fn each_flag_char_sets_its_flag(s in mode_string()) {
        let mode = NodeMode::parse(&s);
        prop_assert_eq!(mode.rx_on_when_idle, s.contains('r'));
        prop_assert_eq!(mode.secure_data_requests, s.contains('s'));
        prop_assert_eq!(mode.full_thread_device, s.contains('d'));
        prop_assert_eq!(mode.full_network_data, s.contains('n'));
    }
}
