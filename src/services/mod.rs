pub mod combinator;
pub mod intersection;
pub mod picker;
pub mod providers;

pub use picker::DuplicatePicker;
