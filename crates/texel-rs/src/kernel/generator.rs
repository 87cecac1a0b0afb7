//! Kernel generation for the pack and unpack transforms.
//!
//! Both kernels address the two innermost axes of the tensor; that axis pair is
//! a fixed policy, not a parameter.

use super::{
    check_rank, Bound, CoordExpr, CoordTerm, Helper, InnerCoord, Kernel, KernelBody, KernelBuilder,
    OutputCoords, PackTap, SamplerName,
};
use crate::error::KernelBuildError;
use crate::packing::{block_offset, channel_symbols, source_coord_expr, Channel};
use crate::tensor::Shape;

pub const UNPACK_KERNEL_NAME: &str = "unpack";
pub const PACK_KERNEL_NAME: &str = "pack";

const INPUT_SAMPLER: &str = "A";

/// Builds the unpack kernel from a channel mapping and its source coordinate expression.
pub fn build_unpack_kernel(
    rank: usize,
    symbols: &[String],
    source_coords: &str,
) -> Result<Kernel, KernelBuildError> {
    check_rank(rank)?;
    if symbols.len() != rank {
        return Err(KernelBuildError::ArityMismatch {
            expected: rank,
            got: symbols.len(),
        });
    }
    let source = CoordExpr::parse(source_coords)?;
    let inner = InnerCoord::from_symbols(rank, symbols)?;
    KernelBuilder::new(UNPACK_KERNEL_NAME, rank, OutputCoords::Element)
        .sampler(INPUT_SAMPLER)?
        .helper(Helper::GetChannel)
        .build(KernelBody::Unpack {
            sampler: SamplerName::parse(INPUT_SAMPLER)?,
            source,
            inner,
        })
}

/// Source text of the unpack kernel for `rank`.
///
/// Operators build the kernel with [`build_unpack_kernel`] instead; the program
/// descriptor renders and dumps it.
pub fn generate(
    rank: usize,
    symbols: &[String],
    source_coords: &str,
) -> Result<String, KernelBuildError> {
    Ok(build_unpack_kernel(rank, symbols, source_coords)?.render())
}

/// Unpack kernel for `rank`, using the canonical channel mapping.
pub fn generate_unpack_kernel(rank: usize) -> Result<Kernel, KernelBuildError> {
    let symbols = channel_symbols(rank)?;
    build_unpack_kernel(rank, &symbols, &source_coord_expr(rank, &symbols))
}

/// Pack kernel for a tensor of `shape`.
///
/// Each output texel starts at the origin of its 2x2 block and gathers the up
/// to four elements of that block, each into the channel the parity table
/// assigns it. Reads past an odd edge are skipped and the channel keeps 0.
pub fn generate_pack_kernel(shape: &Shape) -> Result<Kernel, KernelBuildError> {
    let rank = shape.rank();
    check_rank(rank)?;
    let symbols = channel_symbols(rank)?;
    let base = CoordExpr::parse(&source_coord_expr(rank, &symbols))?;
    let dims = shape.dims();

    let mut taps = Vec::with_capacity(Channel::ALL.len());
    for channel in Channel::ALL {
        let (row_offset, col_offset) = block_offset(channel);
        // A rank-1 tensor has no column axis; its column is always 0.
        if rank == 1 && col_offset != 0 {
            continue;
        }
        let (row_axis, col_axis) = if rank == 1 {
            (0, None)
        } else {
            (rank - 2, Some(rank - 1))
        };
        let mut source = base.clone().with_offset(row_axis, row_offset);
        let mut guards = Vec::new();
        if row_offset > 0 {
            guards.push(guard(&symbols[row_axis], row_offset, dims[row_axis])?);
        }
        if let Some(col_axis) = col_axis {
            source = source.with_offset(col_axis, col_offset);
            if col_offset > 0 {
                guards.push(guard(&symbols[col_axis], col_offset, dims[col_axis])?);
            }
        }
        taps.push(PackTap {
            channel,
            source,
            guards,
        });
    }

    KernelBuilder::new(PACK_KERNEL_NAME, rank, OutputCoords::BlockOrigin)
        .sampler(INPUT_SAMPLER)?
        .build(KernelBody::Pack {
            sampler: SamplerName::parse(INPUT_SAMPLER)?,
            taps,
        })
}

fn guard(symbol: &str, offset: usize, limit: usize) -> Result<Bound, KernelBuildError> {
    Ok(Bound {
        term: CoordTerm {
            symbol: super::Symbol::parse(symbol)?,
            offset,
        },
        limit,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packing::{inner_coord_expr, select_channel};

    #[test]
    fn unpack_inner_coord_matches_mapper() {
        for rank in 1..=6 {
            let kernel = generate_unpack_kernel(rank).unwrap();
            let KernelBody::Unpack { inner, source, .. } = kernel.body() else {
                panic!("unpack kernel has unpack body");
            };
            let symbols = channel_symbols(rank).unwrap();
            assert_eq!(inner.to_string(), inner_coord_expr(rank, &symbols).unwrap());
            assert_eq!(source.to_string(), source_coord_expr(rank, &symbols));
        }
    }

    #[test]
    fn generate_rejects_malformed_source_coords() {
        let symbols = channel_symbols(2).unwrap();
        assert!(generate(2, &symbols, "rc.x;rc.y").is_err());
        assert!(generate(2, &symbols, "").is_err());
        assert!(generate(3, &symbols, "rc.x,rc.y").is_err());
        assert_eq!(
            generate_unpack_kernel(7).unwrap_err(),
            KernelBuildError::UnsupportedRank(7)
        );
    }

    #[test]
    fn generated_text_matches_rendered_kernel() {
        for rank in 1..=6 {
            let symbols = channel_symbols(rank).unwrap();
            let text = generate(rank, &symbols, &source_coord_expr(rank, &symbols)).unwrap();
            assert_eq!(text, generate_unpack_kernel(rank).unwrap().render());
        }
    }

    #[test]
    fn pack_taps_follow_parity_table() {
        let kernel = generate_pack_kernel(&Shape::new([3, 5])).unwrap();
        let KernelBody::Pack { taps, .. } = kernel.body() else {
            panic!("pack kernel has pack body");
        };
        assert_eq!(taps.len(), 4);
        for tap in taps {
            let offsets = tap.source.evaluate("rc", &[0, 0]).unwrap();
            assert_eq!(select_channel(offsets[0], offsets[1]), tap.channel);
        }
    }

    #[test]
    fn rank_one_pack_writes_red_and_blue() {
        let kernel = generate_pack_kernel(&Shape::new([5])).unwrap();
        let KernelBody::Pack { taps, .. } = kernel.body() else {
            panic!("pack kernel has pack body");
        };
        let channels: Vec<_> = taps.iter().map(|tap| tap.channel).collect();
        assert_eq!(channels, vec![Channel::R, Channel::B]);
        assert_eq!(taps[1].guards[0].limit, 5);
    }
}
