#[macro_use]
extern crate lazy_static;

#[macro_use]
mod util;

pub mod mixer;
pub mod module;
pub mod period;
pub mod player;

pub use module::{Module, SongData};
pub use period::Period;
pub use player::{FrameInfo, Options, Player, Step};

use thiserror::Error;

pub const DEFAULT_C2SPD : u32 = 8363;
pub const C4_PERIOD     : f64 = 1712.0;
// 8363 * 1712; ST3 itself uses 14317056 (3.579264MHz * 4)
pub const AMIGA_CLOCK   : f64 = DEFAULT_C2SPD as f64 * C4_PERIOD;
pub const MAX_RATE      : u32 = 96000;
pub const MIN_RATE      : u32 = 4000;
pub const MIN_TEMPO     : u8  = 32;
pub const MAX_TEMPO     : u8  = 255;
pub const MAX_VOLUME    : u8  = 64;
pub const MAX_CHANNELS  : usize = 64;
pub const PAN_CENTER    : u8  = 32;
pub const MAX_PAN       : u8  = 64;


#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Format(String),

    #[error("no playable pattern in order list")]
    NoPlayablePattern,
}
