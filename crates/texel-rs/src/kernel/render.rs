use std::fmt::Write;

use super::{Helper, InnerCoord, Kernel, KernelBody, PackTap, SamplerName};
use crate::packing::{coords_type, select_channel};

const INDENT: &str = "  ";

pub(super) fn render_kernel(kernel: &Kernel) -> String {
    let mut out = String::new();
    for helper in kernel.helpers() {
        match helper {
            Helper::GetChannel => render_get_channel(&mut out),
        }
        out.push('\n');
    }
    out.push_str("void main() {\n");
    let _ = writeln!(
        out,
        "{INDENT}{} {} = getOutputCoords();",
        coords_type(kernel.rank()),
        kernel.output_var()
    );
    match kernel.body() {
        KernelBody::Unpack {
            sampler,
            source,
            inner,
        } => render_unpack_body(&mut out, *sampler, &source.to_string(), inner),
        KernelBody::Pack { sampler, taps } => render_pack_body(&mut out, *sampler, taps),
    }
    out.push_str("}\n");
    out
}

/// Emits the channel helper from the shared parity table.
fn render_get_channel(out: &mut String) {
    let even_even = select_channel(0, 0).swizzle();
    let even_odd = select_channel(0, 1).swizzle();
    let odd_even = select_channel(1, 0).swizzle();
    let odd_odd = select_channel(1, 1).swizzle();
    let _ = write!(
        out,
        "float getChannel(vec4 frag, vec2 innerDims) {{\n\
         {INDENT}vec2 modCoord = mod(innerDims, 2.);\n\
         {INDENT}return modCoord.x == 0. ?\n\
         {INDENT}{INDENT}(modCoord.y == 0. ? frag.{even_even} : frag.{even_odd}) :\n\
         {INDENT}{INDENT}(modCoord.y == 0. ? frag.{odd_even} : frag.{odd_odd});\n\
         }}\n"
    );
}

fn render_unpack_body(out: &mut String, sampler: SamplerName, source: &str, inner: &InnerCoord) {
    let _ = writeln!(
        out,
        "{INDENT}vec4 packedInput = {}({source});",
        sampler.accessor()
    );
    let _ = writeln!(
        out,
        "{INDENT}outputColor = vec4(getChannel(packedInput, {inner}), 0, 0, 0);"
    );
}

fn render_pack_body(out: &mut String, sampler: SamplerName, taps: &[PackTap]) {
    let _ = writeln!(out, "{INDENT}vec4 result = vec4(0.0);");
    for tap in taps {
        let read = format!(
            "result.{} = {}({});",
            tap.channel.swizzle(),
            sampler.accessor(),
            tap.source
        );
        if tap.guards.is_empty() {
            let _ = writeln!(out, "{INDENT}{read}");
            continue;
        }
        let condition = tap
            .guards
            .iter()
            .map(|guard| format!("{} < {}", guard.term, guard.limit))
            .collect::<Vec<_>>()
            .join(" && ");
        let _ = writeln!(out, "{INDENT}if ({condition}) {{");
        let _ = writeln!(out, "{INDENT}{INDENT}{read}");
        let _ = writeln!(out, "{INDENT}}}");
    }
    let _ = writeln!(out, "{INDENT}outputColor = result;");
}
