//! Message formatting

use super::caller::{call_site_prefix, Caller};
use std::fmt::{self, Write};

/// Formats the user message, removes one trailing newline and, when a call
/// site was requested, prepends its `file:line func(): ` prefix.
///
/// `caller` is `None` when no call site was requested and `Some(None)` when one
/// was requested but could not be resolved.
pub fn format_message(caller: Option<Option<&Caller>>, args: fmt::Arguments<'_>) -> String {
    let mut out = match caller {
        Some(c) => call_site_prefix(c),
        None => String::new(),
    };

    match args.as_str() {
        Some(s) => out.push_str(s),
        None => {
            let _ = out.write_fmt(args);
        }
    }

    strip_trailing_newline(&mut out);
    out
}

fn strip_trailing_newline(s: &mut String) {
    if s.ends_with('\n') {
        s.pop();
        if s.ends_with('\r') {
            s.pop();
        }
    }
}
