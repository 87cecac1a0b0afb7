//! Coordinate mapping and channel selection shared by the pack and unpack kernels.

pub mod channel;
pub mod coords;

pub use channel::{block_offset, inner_pair, select_channel, Channel};
pub use coords::{
    channel_symbols, coords_type, inner_coord_expr, source_coord_expr, MAX_RANK,
    OUTPUT_COORDS_VAR,
};
