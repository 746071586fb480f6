pub mod combination;
pub mod component;
pub mod entity;
mod error;
pub mod event;
pub mod index;
pub mod scene;
pub mod system;
pub mod value;

pub use combination::{ArrayCombination, ComponentCombination};
pub use component::{ComponentDescription, ComponentRef};
pub use entity::{Entity, EntityRef};
pub use error::{Error, Result};
pub use event::{Event, EventDescription};
pub use index::Index;
pub use scene::Scene;
pub use system::SystemDescription;
pub use value::{Type, Value};
