//! Process environment knobs, each read at most once.

use std::env;
use std::sync::OnceLock;

const MAX_TEXTURE_SIZE_VAR: &str = "TEXEL_RS_MAX_TEXTURE_SIZE";
const DUMP_KERNELS_VAR: &str = "TEXEL_RS_DUMP_KERNELS";

const TRUTHY: [&str; 4] = ["1", "true", "yes", "on"];

fn flag_set(raw: &str) -> bool {
    let raw = raw.trim();
    TRUTHY.iter().any(|word| raw.eq_ignore_ascii_case(word))
}

fn texture_size(raw: &str) -> Option<usize> {
    raw.trim().parse().ok().filter(|&size: &usize| size > 0)
}

pub(crate) fn max_texture_size_override() -> Option<usize> {
    static CELL: OnceLock<Option<usize>> = OnceLock::new();
    *CELL.get_or_init(|| env::var(MAX_TEXTURE_SIZE_VAR).ok().as_deref().and_then(texture_size))
}

pub(crate) fn dump_kernels_enabled() -> bool {
    static CELL: OnceLock<bool> = OnceLock::new();
    *CELL.get_or_init(|| env::var(DUMP_KERNELS_VAR).is_ok_and(|raw| flag_set(&raw)))
}
