//! Firmware version handling.
//!
//! - `codec`: token and dotted-string parsing, rendering
//! - `compare`: numeric, component-wise ordering

mod codec;
mod compare;

pub use codec::{parse, render, FirmwareVersion, VersionToken, PLATFORM, PRODUCT, TOKEN_PREFIX};
pub use compare::{compare, is_outdated, VersionOrdering};
