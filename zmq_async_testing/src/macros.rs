//! Assertion macros shared by integration tests.

/// Await a send future and panic with contextual diagnostics on failure.
#[macro_export]
macro_rules! send_expect {
    ($fut:expr) => {{
        $fut.await
            .expect(concat!("send failed at ", file!(), ":", line!()))
    }};
    ($fut:expr, $msg:expr) => {{
        let m = ::std::format!("{msg} at {}:{}", file!(), line!(), msg = $msg);
        $fut.await.expect(&m)
    }};
}

/// Await a receive future and panic with contextual diagnostics on failure.
#[macro_export]
macro_rules! recv_expect {
    ($fut:expr) => {{
        $fut.await
            .expect(concat!("recv failed at ", file!(), ":", line!()))
    }};
    ($fut:expr, $msg:expr) => {{
        let m = ::std::format!("{msg} at {}:{}", file!(), line!(), msg = $msg);
        $fut.await.expect(&m)
    }};
}

/// Assert that a multipart message holds exactly the given text parts.
#[macro_export]
macro_rules! assert_parts {
    ($msg:expr, [$($part:expr),* $(,)?]) => {{
        let expected: ::std::vec::Vec<::std::vec::Vec<u8>> =
            ::std::vec![$(::std::convert::AsRef::<[u8]>::as_ref(&$part).to_vec()),*];
        let actual: ::std::vec::Vec<::std::vec::Vec<u8>> =
            $msg.iter().map(|f| f.as_ref().to_vec()).collect();
        assert_eq!(actual, expected, "unexpected message parts");
    }};
}

pub use crate::{assert_parts, recv_expect, send_expect};
