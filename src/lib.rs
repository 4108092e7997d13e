mod engine;
mod level;
mod params;
pub mod sink;
pub mod synth;

pub use engine::Engine;
pub use level::{amplitude_to_db, db_to_amplitude, FLOOR_DB};
pub use params::Params;
pub use sink::Sink;
