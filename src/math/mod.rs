pub mod mat22;
pub mod utils;
pub mod vec2;

pub use mat22::Mat22;
pub use utils::{quarter_turn, wrap_angle};
pub use vec2::{Vec2, get_line_segments_intersection, get_line_segments_intersection_fraction};
