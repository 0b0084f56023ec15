//! Dynamic routing: table, builder, lazy views

pub mod builder;
pub mod table;
pub mod view;

pub use builder::RouteTableBuilder;
pub use table::RouteTable;
pub use view::{ResolvedView, ViewRegistry, ViewResolver};
