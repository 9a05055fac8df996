pub mod body;
pub mod material;
pub mod world;

pub use body::{Body, BodyDef, BodyId, BodyType, SleepState};
pub use material::{ContactMaterial, ContactMaterialId, MaterialId};
pub use world::{SleepMode, World, WorldConfig};
