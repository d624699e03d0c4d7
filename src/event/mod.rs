pub mod component;
pub mod report;

pub use component::{Component, ComponentKind, type_tag};
pub use report::{EventReport, PropertyBag, RiveEvent};

#[cfg(test)]
#[path = "../../tests/unit/event/report.rs"]
mod tests;
