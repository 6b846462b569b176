//! Opaque handles for compositor objects.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

macro_rules! handle_type {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u64);

        impl $name {
            /// Allocates a handle no other object of this kind has used.
            pub fn new_unique() -> Self {
                static NEXT_ID: AtomicU64 = AtomicU64::new(1);
                $name(NEXT_ID.fetch_add(1, Ordering::Relaxed))
            }

            /// Wraps a raw value, e.g. one handed out by a native API.
            pub const fn from_raw(raw: u64) -> Self {
                $name(raw)
            }

            pub const fn raw(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "#{}"), self.0)
            }
        }
    };
}

handle_type!(
    /// An open display connection.
    DisplayHandle,
    "display"
);
handle_type!(
    /// A pixel buffer owned by the compositor.
    BufferHandle,
    "buffer"
);
handle_type!(
    /// A layered element placed on a display.
    ElementHandle,
    "element"
);
