//! Property-based tests for rust_diag_system using proptest

use proptest::prelude::*;
use rust_diag_system::core::caller::{call_site_prefix, short_file_name, short_function_name};
use rust_diag_system::core::message::format_message;
use rust_diag_system::prelude::*;
use rust_diag_system::RateLimiter;
use std::time::{Duration, Instant};

fn severity() -> impl Strategy<Value = Severity> {
    prop_oneof![
        Just(Severity::Verbose),
        Just(Severity::Debug),
        Just(Severity::Problem),
        Just(Severity::Bug),
        Just(Severity::Fatal),
    ]
}

proptest! {
    /// Formatted text never ends in the newline the caller supplied
    #[test]
    fn test_no_trailing_newline(msg in "[a-zA-Z0-9 =:]{0,40}") {
        let with_newline = format!("{}\n", msg);
        let out = format_message(None, format_args!("{}", with_newline));
        prop_assert_eq!(&out, &msg);
        prop_assert!(!out.ends_with('\n'));
    }

    /// Short file names keep at most two path segments
    #[test]
    fn test_short_file_name_segments(parts in prop::collection::vec("[a-z_]{1,8}", 1..6)) {
        let path = format!("/{}.rs", parts.join("/"));
        let short = short_file_name(&path);
        prop_assert!(short.matches('/').count() <= 1);
        prop_assert!(path.ends_with(short));
    }

    /// Short function names carry no qualification
    #[test]
    fn test_short_function_name_unqualified(parts in prop::collection::vec("[a-z_]{1,8}", 1..5)) {
        let name = parts.join("::");
        let short = short_function_name(&name);
        prop_assert_eq!(short, parts.last().unwrap().as_str());
    }

    /// The call-site prefix always ends with `(): ` for a known caller
    #[test]
    fn test_prefix_shape(line in 1u32..100_000, func in "[a-z_]{1,12}") {
        let caller = Caller::new("/a/b/c.rs", line, Some(&format!("m::{}", func)));
        let prefix = call_site_prefix(Some(&caller));
        prop_assert_eq!(prefix, format!("b/c.rs:{} {}(): ", line, func));
    }

    /// Only Problem, Bug and Fatal mail; only Fatal terminates
    #[test]
    fn test_policy_consistency(s in severity()) {
        let p = s.policy();
        prop_assert!(p.to_stderr);
        prop_assert_eq!(p.to_email, matches!(s, Severity::Problem | Severity::Bug | Severity::Fatal));
        prop_assert_eq!(p.with_stack_trace, matches!(s, Severity::Bug | Severity::Fatal));
        prop_assert_eq!(p.with_call_site, s != Severity::Verbose);
        prop_assert_eq!(p.terminates, s == Severity::Fatal);
    }

    /// Within any window at most one send is allowed per recipient
    #[test]
    fn test_rate_limiter_window(
        window_ms in 1u64..10_000,
        offsets in prop::collection::vec(0u64..30_000, 1..40),
    ) {
        let limiter = RateLimiter::new();
        let window = Duration::from_millis(window_ms);
        let t0 = Instant::now();

        let mut offsets = offsets;
        offsets.sort_unstable();

        let mut allowed: Vec<u64> = Vec::new();
        for off in offsets {
            if limiter.allow_at("ops@example.com", window, t0 + Duration::from_millis(off)) {
                allowed.push(off);
            }
        }

        prop_assert!(!allowed.is_empty());
        for pair in allowed.windows(2) {
            prop_assert!(pair[1] - pair[0] > window_ms);
        }
    }
}
