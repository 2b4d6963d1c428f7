// Engine module - hand signal extraction, particle behavior and the pieces
// the app loop wires around them

pub mod behavior;
pub mod camera;
pub mod config;
pub mod debug_overlay;
pub mod driver;
pub mod error;
pub mod hand_signal;
pub mod input;
pub mod landmarks;
pub mod particles;
pub mod sim_hand;
pub mod templates;

// Re-export commonly used items
pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use hand_signal::{HandSignal, HandSignalExtractor};
pub use particles::ParticleEngine;
