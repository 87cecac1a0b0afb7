use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use texel_rs::{
    DType, InferenceHandler, OpResult, PackOperator, Shape, Tensor, TexelConfig,
    TextureOperator, TextureStore, UnpackOperator,
};
use texel_rs_backend_ref_cpu::{HostTextureStore, RefCpuEngine};

fn run_single(
    op: &dyn TextureOperator,
    engine: &RefCpuEngine,
    store: &mut HostTextureStore,
    input: &Tensor,
) -> OpResult<Tensor> {
    let mut handler = InferenceHandler::new(engine, store);
    let mut outputs = op.run(&mut handler, std::slice::from_ref(input))?;
    assert_eq!(outputs.len(), 1);
    Ok(outputs.remove(0))
}

fn random_shape(rng: &mut StdRng, rank: usize) -> Shape {
    Shape::new((0..rank).map(|_| rng.gen_range(1..=5)).collect::<Vec<usize>>())
}

#[test]
fn unpacks_two_by_three() -> anyhow::Result<()> {
    let engine = RefCpuEngine::new();
    let mut store = HostTextureStore::new(TexelConfig::default());
    let values = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0];
    let packed = store.upload_packed(Shape::new([2, 3]), DType::F32, &values)?;
    let packed_layout = store.get_or_create_layout(&packed)?;
    assert_eq!((packed_layout.width, packed_layout.height), (2, 1));

    let out = run_single(&UnpackOperator, &engine, &mut store, &packed)?;
    assert_eq!(out.shape(), &Shape::new([2, 3]));
    let layout = store.get_or_create_layout(&out)?;
    assert!(!layout.is_packed());
    assert_eq!(layout.texel_count(), 6);
    assert_eq!(store.sample(&out, &[1, 2]), Some(5.0));
    assert_eq!(store.sample(&out, &[0, 1]), Some(1.0));
    assert_eq!(store.read_tensor(&out)?, values);
    Ok(())
}

#[test]
fn packs_block_into_rgba() -> anyhow::Result<()> {
    let engine = RefCpuEngine::new();
    let mut store = HostTextureStore::new(TexelConfig::default());
    let input = store.upload(Shape::new([2, 2]), DType::F32, vec![1.0, 2.0, 3.0, 4.0])?;
    let packed = run_single(&PackOperator, &engine, &mut store, &input)?;

    let data = store
        .lookup_texture(packed.data_id())
        .cloned()
        .expect("pack output has a texture");
    assert!(data.layout.is_packed());
    assert_eq!(store.texels(data.texture), Some(&[1.0, 2.0, 3.0, 4.0][..]));
    Ok(())
}

#[test]
fn odd_edges_pad_with_zero() -> anyhow::Result<()> {
    let engine = RefCpuEngine::new();
    let mut store = HostTextureStore::new(TexelConfig::default());
    let input = store.upload(Shape::new([3]), DType::F32, vec![7.0, 8.0, 9.0])?;
    let packed = run_single(&PackOperator, &engine, &mut store, &input)?;

    let data = store
        .lookup_texture(packed.data_id())
        .cloned()
        .expect("pack output has a texture");
    // Rank 1 fills only the red and blue channels.
    assert_eq!(
        store.texels(data.texture),
        Some(&[7.0, 0.0, 8.0, 0.0, 9.0, 0.0, 0.0, 0.0][..])
    );

    let out = run_single(&UnpackOperator, &engine, &mut store, &packed)?;
    assert_eq!(store.read_tensor(&out)?, vec![7.0, 8.0, 9.0]);
    Ok(())
}

#[test]
fn pack_then_unpack_restores_every_rank() -> anyhow::Result<()> {
    let mut rng = StdRng::seed_from_u64(11);
    let engine = RefCpuEngine::new();
    let mut store = HostTextureStore::new(TexelConfig::default());
    for rank in 1..=6 {
        for _ in 0..4 {
            let shape = random_shape(&mut rng, rank);
            let values: Vec<f32> = (0..shape.num_elements()).map(|_| rng.gen()).collect();
            let input = store.upload(shape.clone(), DType::F32, values.clone())?;

            let packed = run_single(&PackOperator, &engine, &mut store, &input)?;
            assert_eq!(store.read_tensor(&packed)?, values, "packed {shape}");

            let out = run_single(&UnpackOperator, &engine, &mut store, &packed)?;
            assert_eq!(out.shape(), &shape);
            assert_eq!(store.read_tensor(&out)?, values, "unpacked {shape}");
        }
    }
    Ok(())
}

#[test]
fn every_unpacked_element_matches_its_packed_channel() -> anyhow::Result<()> {
    let mut rng = StdRng::seed_from_u64(3);
    let engine = RefCpuEngine::new();
    let mut store = HostTextureStore::new(TexelConfig::default());
    let shape = Shape::new([2, 3, 5]);
    let values: Vec<f32> = (0..shape.num_elements())
        .map(|_| rng.gen_range(-4.0..4.0))
        .collect();
    let packed = store.upload_packed(shape.clone(), DType::F32, &values)?;
    let out = run_single(&UnpackOperator, &engine, &mut store, &packed)?;
    for (flat, expected) in values.iter().enumerate() {
        let coords = shape.unravel(flat);
        assert_eq!(store.sample(&packed, &coords), Some(*expected));
        assert_eq!(store.sample(&out, &coords), Some(*expected));
    }
    Ok(())
}

#[test]
fn wrapped_textures_round_trip() -> anyhow::Result<()> {
    let engine = RefCpuEngine::new();
    let mut store = HostTextureStore::new(TexelConfig::new(6));
    let shape = Shape::new([13, 2]);
    let values: Vec<f32> = (0..26).map(|v| v as f32).collect();
    let input = store.upload(shape.clone(), DType::F32, values.clone())?;

    let packed = run_single(&PackOperator, &engine, &mut store, &input)?;
    let packed_layout = store.get_or_create_layout(&packed)?;
    assert_eq!((packed_layout.width, packed_layout.height), (3, 3));

    let out = run_single(&UnpackOperator, &engine, &mut store, &packed)?;
    let layout = store.get_or_create_layout(&out)?;
    assert!(layout.width <= 6 && layout.height <= 6);
    assert_eq!(store.read_tensor(&out)?, values);
    Ok(())
}
