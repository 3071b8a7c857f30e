pub mod camera;
pub mod picker;

pub use camera::{Camera, PointerPosition, Ray};
pub use picker::{pick, PickHit, PickReport};
