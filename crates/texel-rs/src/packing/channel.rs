//! The 2x2 parity table deciding which channel of a packed texel holds an element.
//!
//! Pack places element `(row, col)` of a block into [`select_channel`]`(row, col)`;
//! unpack reads it back from the same channel. [`block_offset`] is the inverse
//! used when a kernel walks the four channels of one texel.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Channel {
    R,
    G,
    B,
    A,
}

impl Channel {
    pub const ALL: [Channel; 4] = [Channel::R, Channel::G, Channel::B, Channel::A];

    pub fn index(self) -> usize {
        match self {
            Channel::R => 0,
            Channel::G => 1,
            Channel::B => 2,
            Channel::A => 3,
        }
    }

    /// GLSL component name.
    pub fn swizzle(self) -> &'static str {
        match self {
            Channel::R => "r",
            Channel::G => "g",
            Channel::B => "b",
            Channel::A => "a",
        }
    }
}

/// `(row%2, col%2)`: `(0,0) -> R`, `(0,1) -> G`, `(1,0) -> B`, `(1,1) -> A`.
pub fn select_channel(row: usize, col: usize) -> Channel {
    match (row % 2, col % 2) {
        (0, 0) => Channel::R,
        (0, _) => Channel::G,
        (_, 0) => Channel::B,
        _ => Channel::A,
    }
}

/// Row and column offset within the 2x2 block stored in `channel`.
pub fn block_offset(channel: Channel) -> (usize, usize) {
    match channel {
        Channel::R => (0, 0),
        Channel::G => (0, 1),
        Channel::B => (1, 0),
        Channel::A => (1, 1),
    }
}

/// `(row, col)` of the two innermost axes; rank 1 has a constant column of 0.
pub fn inner_pair(coords: &[usize]) -> (usize, usize) {
    match coords {
        [] => (0, 0),
        [row] => (*row, 0),
        [.., row, col] => (*row, *col),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parity_table_is_fixed() {
        assert_eq!(select_channel(0, 0), Channel::R);
        assert_eq!(select_channel(0, 1), Channel::G);
        assert_eq!(select_channel(1, 0), Channel::B);
        assert_eq!(select_channel(1, 1), Channel::A);
        assert_eq!(select_channel(6, 3), Channel::G);
    }

    #[test]
    fn placement_and_extraction_agree() {
        for row in 0..8 {
            for col in 0..8 {
                let channel = select_channel(row, col);
                assert_eq!(block_offset(channel), (row % 2, col % 2));
            }
        }
        for channel in Channel::ALL {
            let (row, col) = block_offset(channel);
            assert_eq!(select_channel(row, col), channel);
        }
    }

    #[test]
    fn rank_one_never_uses_odd_columns() {
        for i in 0..10 {
            let (row, col) = inner_pair(&[i]);
            assert_eq!(col, 0);
            assert!(matches!(select_channel(row, col), Channel::R | Channel::B));
        }
        assert_eq!(inner_pair(&[4, 1, 3]), (1, 3));
    }
}
