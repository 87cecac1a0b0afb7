use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use texel_rs::kernel::{Helper, KernelBody, OutputCoords};
use texel_rs::packing::select_channel;
use texel_rs::{
    Binding, CompiledKernel, ExecutionEngine, KernelCompileError, OpError, OpResult,
    ProgramDescriptor, TextureLayout, TextureStore,
};
use tracing::{debug, trace};

const GET_CHANNEL_SIGNATURE: &str = "float getChannel(vec4 frag, vec2 innerDims)";

/// Reference engine: validates kernel source, then interprets the typed kernel
/// on the host.
pub struct RefCpuEngine {
    compiled: Mutex<HashMap<u64, Arc<CompiledKernel>>>,
    compiles: AtomicUsize,
}

impl RefCpuEngine {
    pub fn new() -> Self {
        Self {
            compiled: Mutex::new(HashMap::new()),
            compiles: AtomicUsize::new(0),
        }
    }

    /// Number of programs compiled so far; cache hits are not counted.
    pub fn compile_count(&self) -> usize {
        self.compiles.load(Ordering::SeqCst)
    }
}

impl Default for RefCpuEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn check_balanced(source: &str) -> Result<(), String> {
    let mut stack = Vec::new();
    for ch in source.chars() {
        match ch {
            '(' | '{' => stack.push(ch),
            ')' if stack.pop() != Some('(') => return Err("unbalanced `)`".to_string()),
            '}' if stack.pop() != Some('{') => return Err("unbalanced `}`".to_string()),
            _ => {}
        }
    }
    if let Some(open) = stack.last() {
        return Err(format!("unclosed `{open}`"));
    }
    Ok(())
}

/// Checks the source contract an engine relies on when binding a program.
fn validate(descriptor: &ProgramDescriptor) -> Result<(), String> {
    let source = &descriptor.source;
    if !source.contains("void main()") {
        return Err("missing entry point `void main()`".to_string());
    }
    if !source.contains("getOutputCoords()") {
        return Err("entry point never reads its output coordinate".to_string());
    }
    if !source.contains("outputColor =") {
        return Err("entry point never writes `outputColor`".to_string());
    }
    check_balanced(source)?;
    if descriptor.samplers.len() != descriptor.input_layouts.len() {
        return Err(format!(
            "{} samplers declared for {} input layouts",
            descriptor.samplers.len(),
            descriptor.input_layouts.len()
        ));
    }
    for sampler in &descriptor.samplers {
        if !source.contains(&format!("get{sampler}(")) {
            return Err(format!("sampler `{sampler}` is declared but never read"));
        }
    }
    if descriptor.kernel.helpers().contains(&Helper::GetChannel)
        && !source.contains(GET_CHANNEL_SIGNATURE)
    {
        return Err("missing channel helper".to_string());
    }
    if *source != descriptor.kernel.render() {
        return Err("source text does not match its kernel".to_string());
    }
    let inputs_packed = descriptor
        .input_layouts
        .iter()
        .all(TextureLayout::is_packed);
    if inputs_packed != descriptor.is_input_packed
        || descriptor.output_layout.is_packed() != descriptor.is_output_packed
    {
        return Err("packing flags disagree with layouts".to_string());
    }
    Ok(())
}

/// Texel of `layout` covering `coords`, widened to four channels.
fn sample(layout: &TextureLayout, texels: &[f32], coords: &[usize]) -> Option<[f32; 4]> {
    if layout.is_packed() {
        let base = layout.packed_texel_index(coords)? * 4;
        let texel = texels.get(base..base + 4)?;
        Some([texel[0], texel[1], texel[2], texel[3]])
    } else {
        let value = *texels.get(layout.logical_texel_index(coords)?)?;
        Some([value, 0.0, 0.0, 0.0])
    }
}

impl ExecutionEngine for RefCpuEngine {
    fn engine_name(&self) -> &str {
        "ref-cpu"
    }

    fn compile(
        &self,
        descriptor: &ProgramDescriptor,
    ) -> Result<Arc<CompiledKernel>, KernelCompileError> {
        let fingerprint = descriptor.fingerprint();
        let mut compiled = self
            .compiled
            .lock()
            .map_err(|_| KernelCompileError::new(&descriptor.name, "compile cache poisoned"))?;
        if let Some(existing) = compiled.get(&fingerprint) {
            if existing.descriptor == *descriptor {
                return Ok(Arc::clone(existing));
            }
        }
        validate(descriptor).map_err(|message| KernelCompileError::new(&descriptor.name, message))?;
        let kernel = Arc::new(CompiledKernel {
            fingerprint,
            descriptor: descriptor.clone(),
        });
        compiled.insert(fingerprint, Arc::clone(&kernel));
        self.compiles.fetch_add(1, Ordering::SeqCst);
        debug!(kernel = %descriptor.name, fingerprint, "compiled");
        Ok(kernel)
    }

    fn dispatch(
        &self,
        kernel: &CompiledKernel,
        binding: &Binding,
        store: &mut dyn TextureStore,
    ) -> OpResult<()> {
        let descriptor = &kernel.descriptor;
        let program = &descriptor.kernel;
        let [input] = binding.inputs.as_slice() else {
            return Err(OpError::dispatch(format!(
                "{} expects 1 bound input, got {}",
                descriptor.name,
                binding.inputs.len()
            )));
        };
        let input_texels = store
            .texels(input.texture)
            .ok_or_else(|| OpError::dispatch(format!("{} has no storage", input.texture)))?
            .to_vec();
        let out_layout = &binding.output.layout;
        let channels = out_layout.channels.count();
        let var = program.output_var();
        let mut out = vec![0.0; out_layout.storage_len()];

        for texel in 0..out_layout.texel_count() {
            let coords = match program.output_coords() {
                OutputCoords::Element => out_layout.shape.unravel(texel),
                OutputCoords::BlockOrigin => out_layout.block_origin(texel),
            };
            let mut value = [0.0f32; 4];
            match program.body() {
                KernelBody::Unpack { source, inner, .. } => {
                    let packed = source
                        .evaluate(var, &coords)
                        .and_then(|src| sample(&input.layout, &input_texels, &src))
                        .ok_or_else(|| {
                            OpError::dispatch(format!("unpack read out of range at {coords:?}"))
                        })?;
                    let (row, col) = inner.evaluate(var, &coords).ok_or_else(|| {
                        OpError::dispatch(format!("inner coordinate undefined at {coords:?}"))
                    })?;
                    value[0] = packed[select_channel(row, col).index()];
                }
                KernelBody::Pack { taps, .. } => {
                    for tap in taps {
                        if !tap.guards.iter().all(|guard| guard.holds(var, &coords)) {
                            continue;
                        }
                        let read = tap
                            .source
                            .evaluate(var, &coords)
                            .and_then(|src| sample(&input.layout, &input_texels, &src))
                            .ok_or_else(|| {
                                OpError::dispatch(format!("pack read out of range at {coords:?}"))
                            })?;
                        value[tap.channel.index()] = read[0];
                    }
                }
            }
            out[texel * channels..(texel + 1) * channels].copy_from_slice(&value[..channels]);
        }

        let target = store
            .texels_mut(binding.output.texture)
            .ok_or_else(|| OpError::dispatch(format!("{} has no storage", binding.output.texture)))?;
        if target.len() != out.len() {
            return Err(OpError::dispatch(format!(
                "{} holds {} slots, kernel wrote {}",
                binding.output.texture,
                target.len(),
                out.len()
            )));
        }
        target.copy_from_slice(&out);
        trace!(kernel = %descriptor.name, texels = out_layout.texel_count(), "dispatch complete");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::check_balanced;

    #[test]
    fn balance_check_catches_stray_delimiters() {
        assert!(check_balanced("void main() { f(a, (b)); }").is_ok());
        assert!(check_balanced("void main() { f(a; }").is_err());
        assert!(check_balanced("void main() {").is_err());
        assert!(check_balanced(")(").is_err());
    }
}
