//! Stack of descriptor names currently being processed.
//!
//! Only recorded with the `debug` feature in a debug build, in which case
//! [`SerialError::custom`](crate::SerialError::custom) appends it to the message.

use alloc::string::{String, ToString};
use core::fmt::Display;

#[cfg(all(debug_assertions, feature = "debug"))]
std::thread_local! {
    static DESCRIPTOR_STACK: core::cell::RefCell<alloc::vec::Vec<String>> =
        const { core::cell::RefCell::new(alloc::vec::Vec::new()) };
}

#[inline]
pub(crate) fn push(name: &str) {
    crate::cfg::debug! {
        DESCRIPTOR_STACK.with_borrow_mut(|stack| stack.push(name.to_string()));
    }
    #[cfg(not(all(debug_assertions, feature = "debug")))]
    let _ = name;
}

#[inline]
pub(crate) fn pop() {
    crate::cfg::debug! {
        DESCRIPTOR_STACK.with_borrow_mut(|stack| stack.pop());
    }
}

/// Renders the descriptors currently being encoded or decoded on this
/// thread, outermost first.
///
/// Empty unless the `debug` feature is enabled in a debug build.
pub fn descriptor_trace() -> String {
    #[cfg(all(debug_assertions, feature = "debug"))]
    {
        use core::fmt::Write;

        DESCRIPTOR_STACK.with_borrow(|stack| {
            let mut out = String::new();
            for (depth, name) in stack.iter().enumerate() {
                let arrow = if depth == 0 { "" } else { " -> " };
                let _ = writeln!(out, "{arrow}`{name}`");
            }
            out
        })
    }
    #[cfg(not(all(debug_assertions, feature = "debug")))]
    String::new()
}

pub(crate) fn message(msg: impl Display) -> String {
    let trace = descriptor_trace();
    if trace.is_empty() {
        msg.to_string()
    } else {
        alloc::format!("{msg} (stack:\n{trace})")
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(all(test, debug_assertions, feature = "debug"))]
mod tests {
    #[test]
    fn message_carries_stack() {
        super::push("demo::Outer");
        super::push("demo::Inner");
        let msg = super::message("boom");
        super::pop();
        super::pop();

        assert!(msg.starts_with("boom (stack:"));
        assert!(msg.contains("`demo::Outer`"));
        assert!(msg.contains(" -> `demo::Inner`"));
        assert_eq!(super::message("plain"), "plain");
    }
}
