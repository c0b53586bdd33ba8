/// proxy file for when no_std support is enabled. Simply defines aliases for std modules so we don't need to
/// deal with different names elsewhere

pub mod collections {
    pub use hashbrown::HashMap;

    pub mod hash_map {
        pub use hashbrown::hash_map::Entry;
    }
}

pub mod fmt {
    pub use core::fmt::{Display, Formatter, Result};
}

pub mod str {
    pub use core::str::FromStr;
}

pub mod vec {
    pub use alloc::vec::Vec;
}

pub mod string {
    pub use alloc::string::{String, ToString};
}
