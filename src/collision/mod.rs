pub mod aabb;
pub mod broadphase;
pub mod collide;
pub mod narrowphase;
pub mod overlap_keeper;
pub mod ray;
pub mod raycast_result;

pub use aabb::Aabb;
pub use broadphase::{Broadphase, BroadphaseKind, NaiveBroadphase, SapBroadphase, aabb_check, can_collide};
pub use collide::{ContactPoint, ShapePose, collide};
pub use narrowphase::{BodyPairKey, CollisionSide, ContactParams, Narrowphase};
pub use overlap_keeper::{OverlapKeeper, ShapePairKey};
pub use ray::{Ray, RayCallback, RayMode};
pub use raycast_result::RaycastResult;
