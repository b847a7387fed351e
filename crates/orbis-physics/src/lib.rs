//! Planet collision: bounded triangle patches of a height-displaced sphere, and
//! their use as rapier colliders.
//!
//! [`PlanetShape`] answers one broad-phase query box at a time through a
//! [`TriangleCallback`]. [`patch_collider`] turns a query into a static rapier
//! trimesh, and [`PlanetPhysicsWorld`] keeps one such patch under every tracked
//! body while pulling dynamic bodies toward the planet center.

mod callback;
mod patch_collider;
mod planet_shape;
mod world;

pub use callback::{TriangleCallback, TriangleCollector};
pub use patch_collider::{PatchError, SURFACE_FRICTION, patch_collider};
pub use planet_shape::{MAX_PATCH_TRIANGLES, PlanetShape};
pub use world::PlanetPhysicsWorld;
