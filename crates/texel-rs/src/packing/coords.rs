//! Axis symbols and coordinate expressions used by generated kernels.
//!
//! Everything here is textual: the strings are spliced into kernel source by the
//! kernel builder and have no numeric meaning on the host.

use crate::error::KernelBuildError;

/// Name of the output coordinate variable every generated entry point declares.
pub const OUTPUT_COORDS_VAR: &str = "rc";

const GL_AXES: [&str; 6] = ["x", "y", "z", "w", "u", "v"];

/// Highest rank a coordinate vector can address.
pub const MAX_RANK: usize = GL_AXES.len();

/// Ordered axis symbols, outermost axis first, for a coordinate of `rank` axes.
///
/// Rank 1 coordinates are scalars and use the variable itself; higher ranks use
/// one component per axis. The result always has exactly `rank` entries.
pub fn channel_symbols(rank: usize) -> Result<Vec<String>, KernelBuildError> {
    channel_symbols_for(OUTPUT_COORDS_VAR, rank)
}

pub fn channel_symbols_for(name: &str, rank: usize) -> Result<Vec<String>, KernelBuildError> {
    match rank {
        1 => Ok(vec![name.to_string()]),
        2..=MAX_RANK => Ok(GL_AXES[..rank]
            .iter()
            .map(|axis| format!("{name}.{axis}"))
            .collect()),
        _ => Err(KernelBuildError::UnsupportedRank(rank)),
    }
}

/// Argument list used to sample the packed input at the output's coordinate.
pub fn source_coord_expr(rank: usize, symbols: &[String]) -> String {
    if rank <= 1 {
        return symbols.first().cloned().unwrap_or_default();
    }
    symbols
        .iter()
        .take(rank)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(",")
}

/// GLSL type of the output coordinate for `rank`.
pub fn coords_type(rank: usize) -> &'static str {
    match rank {
        0 | 1 => "int",
        2 => "ivec2",
        3 => "ivec3",
        4 => "ivec4",
        5 => "ivec5",
        _ => "ivec6",
    }
}

/// The `vec2` handed to the channel helper: the two innermost axes, or the
/// single axis paired with a constant zero column for rank 1.
pub fn inner_coord_expr(rank: usize, symbols: &[String]) -> Result<String, KernelBuildError> {
    if symbols.len() != rank {
        return Err(KernelBuildError::ArityMismatch {
            expected: rank,
            got: symbols.len(),
        });
    }
    match symbols {
        [] => Err(KernelBuildError::UnsupportedRank(0)),
        [row] => Ok(format!("vec2({row}, 0)")),
        [.., row, col] => Ok(format!("vec2({row},{col})")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_count_matches_rank() {
        for rank in 1..=MAX_RANK {
            assert_eq!(channel_symbols(rank).unwrap().len(), rank);
        }
        assert_eq!(channel_symbols(3).unwrap(), vec!["rc.x", "rc.y", "rc.z"]);
    }

    #[test]
    fn unsupported_ranks_have_no_symbols() {
        assert_eq!(
            channel_symbols(MAX_RANK + 1),
            Err(KernelBuildError::UnsupportedRank(7))
        );
        assert_eq!(channel_symbols(0), Err(KernelBuildError::UnsupportedRank(0)));
    }

    #[test]
    fn rank_one_source_coord_is_the_symbol() {
        let symbols = channel_symbols(1).unwrap();
        assert_eq!(source_coord_expr(1, &symbols), symbols[0]);
    }

    #[test]
    fn higher_ranks_join_every_symbol() {
        let symbols = channel_symbols(4).unwrap();
        let expr = source_coord_expr(4, &symbols);
        assert_eq!(expr, "rc.x,rc.y,rc.z,rc.w");
        assert_eq!(expr.split(',').count(), 4);
    }

    #[test]
    fn inner_coord_uses_last_two_axes() {
        let rank3 = channel_symbols(3).unwrap();
        assert_eq!(inner_coord_expr(3, &rank3).unwrap(), "vec2(rc.y,rc.z)");
        let rank1 = channel_symbols(1).unwrap();
        assert_eq!(inner_coord_expr(1, &rank1).unwrap(), "vec2(rc, 0)");
    }

    #[test]
    fn inner_coord_rejects_short_symbol_lists() {
        let symbols = channel_symbols(2).unwrap();
        assert_eq!(
            inner_coord_expr(4, &symbols),
            Err(KernelBuildError::ArityMismatch {
                expected: 4,
                got: 2
            })
        );
        assert!(inner_coord_expr(0, &[]).is_err());
    }
}
