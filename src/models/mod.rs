pub mod sheet;
pub mod tenant;
