use texel_rs::kernel::{generate, generate_pack_kernel, generate_unpack_kernel};
use texel_rs::packing::{channel_symbols, source_coord_expr};
use texel_rs::{KernelBuildError, ProgramDescriptor, Shape, TexelConfig, TextureLayout};

const RANK2_UNPACK: &str = "\
float getChannel(vec4 frag, vec2 innerDims) {
  vec2 modCoord = mod(innerDims, 2.);
  return modCoord.x == 0. ?
    (modCoord.y == 0. ? frag.r : frag.g) :
    (modCoord.y == 0. ? frag.b : frag.a);
}

void main() {
  ivec2 rc = getOutputCoords();
  vec4 packedInput = getA(rc.x,rc.y);
  outputColor = vec4(getChannel(packedInput, vec2(rc.x,rc.y)), 0, 0, 0);
}
";

#[test]
fn rank_two_unpack_source_is_exact() -> anyhow::Result<()> {
    let symbols = channel_symbols(2)?;
    let source = generate(2, &symbols, &source_coord_expr(2, &symbols))?;
    assert_eq!(source, RANK2_UNPACK);
    Ok(())
}

#[test]
fn rank_one_unpack_reads_scalar_coordinate() -> anyhow::Result<()> {
    let source = generate_unpack_kernel(1)?.render();
    assert!(source.contains("  int rc = getOutputCoords();"));
    assert!(source.contains("getA(rc);"));
    assert!(source.contains("getChannel(packedInput, vec2(rc, 0))"));
    Ok(())
}

#[test]
fn unpack_source_addresses_every_axis() -> anyhow::Result<()> {
    let members = ["x", "y", "z", "w", "u", "v"];
    for rank in 2..=6 {
        let source = generate_unpack_kernel(rank)?.render();
        let axes: Vec<String> = members[..rank].iter().map(|m| format!("rc.{m}")).collect();
        assert!(source.contains(&format!("ivec{rank} rc = getOutputCoords();")));
        assert!(source.contains(&format!("getA({});", axes.join(","))));
        let inner = format!("vec2({},{})", axes[rank - 2], axes[rank - 1]);
        assert!(source.contains(&inner), "rank {rank} inner coordinate");
    }
    Ok(())
}

#[test]
fn unsupported_ranks_fail_to_build() {
    assert_eq!(
        generate_unpack_kernel(0).unwrap_err(),
        KernelBuildError::UnsupportedRank(0)
    );
    assert_eq!(
        generate_pack_kernel(&Shape::new([1, 1, 1, 1, 1, 1, 1])).unwrap_err(),
        KernelBuildError::UnsupportedRank(7)
    );
}

#[test]
fn pack_source_guards_odd_edges() -> anyhow::Result<()> {
    let source = generate_pack_kernel(&Shape::new([3, 5]))?.render();
    assert!(source.contains("  ivec2 rc = getOutputCoords();"));
    assert!(source.contains("  result.r = getA(rc.x,rc.y);"));
    assert!(source.contains("  if (rc.y + 1 < 5) {\n    result.g = getA(rc.x,rc.y + 1);\n  }"));
    assert!(source.contains("  if (rc.x + 1 < 3) {\n    result.b = getA(rc.x + 1,rc.y);\n  }"));
    assert!(source.contains("if (rc.x + 1 < 3 && rc.y + 1 < 5) {"));
    assert!(source.ends_with("  outputColor = result;\n}\n"));
    assert!(!source.contains("getChannel"));
    Ok(())
}

#[test]
fn descriptor_serializes_layouts_and_flags() -> anyhow::Result<()> {
    let config = TexelConfig::default();
    let shape = Shape::new([2, 3]);
    let descriptor = ProgramDescriptor::new(
        generate_unpack_kernel(2)?,
        vec![TextureLayout::packed(&shape, &config)?],
        TextureLayout::unpacked(&shape, &config)?,
        true,
        false,
    );
    assert_eq!(descriptor.samplers, vec!["A".to_string()]);

    let json: serde_json::Value = serde_json::from_str(&descriptor.to_json()?)?;
    assert_eq!(json["name"], "unpack");
    assert_eq!(json["is_input_packed"], true);
    assert_eq!(json["is_output_packed"], false);
    assert_eq!(json["output_layout"]["width"], 3);
    assert_eq!(json["output_layout"]["height"], 2);
    assert_eq!(json["input_layouts"][0]["width"], 2);

    let restored: ProgramDescriptor = serde_json::from_str(&descriptor.to_json()?)?;
    assert_eq!(restored.fingerprint(), descriptor.fingerprint());
    Ok(())
}
