//! Filter contract, primitive filters, and the per-connection driver.
//!
//! This module provides the `Filter` trait that every decoding strategy
//! implements, the built-in filters for the common wire formats
//! (fixed-size, length-prefixed, delimiter-terminated, begin/end-mark,
//! and sniff-byte switching), and the `FilterDriver` that owns a
//! connection's retained bytes and drives the active filter over them.

pub mod begin_end;
pub mod command;
pub mod contract;
pub mod driver;
pub mod fixed_header;
pub mod fixed_size;
pub mod resolver;
pub mod switch;
pub mod terminator;

pub use begin_end::BeginEndMarkFilter;
pub use command::{CommandPackage, CommandResolver};
pub use contract::{BoxedFilter, Decoded, Filter, FilterState};
pub use driver::FilterDriver;
pub use fixed_header::FixedHeaderFilter;
pub use fixed_size::FixedSizeFilter;
pub use resolver::{HeaderPackageResolver, PackageResolver};
pub use switch::{SwitchBack, SwitcherFilter};
pub use terminator::{MarkSearcher, TerminatorFilter};
