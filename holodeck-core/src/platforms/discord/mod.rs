pub mod runtime;
pub mod voice;

pub use runtime::{DiscordPlatform, PlatformSeed};
