use std::collections::BTreeMap;
use std::hash::Hasher;

use serde::{Deserialize, Serialize};
use tracing::trace;

use super::hashing::Fnv1a;
use super::store::TextureData;
use crate::kernel::Kernel;
use crate::layout::TextureLayout;

/// Generated kernel plus everything the engine needs to compile and bind it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramDescriptor {
    pub name: String,
    pub kernel: Kernel,
    pub source: String,
    pub input_layouts: Vec<TextureLayout>,
    pub output_layout: TextureLayout,
    pub samplers: Vec<String>,
    pub is_input_packed: bool,
    pub is_output_packed: bool,
}

impl ProgramDescriptor {
    /// Renders `kernel` and records its sampler declarations.
    pub fn new(
        kernel: Kernel,
        input_layouts: Vec<TextureLayout>,
        output_layout: TextureLayout,
        is_input_packed: bool,
        is_output_packed: bool,
    ) -> Self {
        let source = kernel.render();
        if crate::env::dump_kernels_enabled() {
            trace!(target: "texel_rs::kernel", kernel = kernel.name(), %source, "generated kernel");
        }
        let samplers = kernel.samplers().iter().map(|s| s.to_string()).collect();
        Self {
            name: kernel.name().to_string(),
            kernel,
            source,
            input_layouts,
            output_layout,
            samplers,
            is_input_packed,
            is_output_packed,
        }
    }

    /// Stable key over the source text and layouts, for compile caches.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = Fnv1a::new();
        hasher.write(self.source.as_bytes());
        let layouts = serde_json::to_vec(&(&self.input_layouts, &self.output_layout))
            .unwrap_or_default();
        hasher.write(&layouts);
        hasher.write(&[self.is_input_packed as u8, self.is_output_packed as u8]);
        hasher.finish()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Concrete resources for one dispatch of a program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Binding {
    pub inputs: Vec<TextureData>,
    pub output: TextureData,
    /// Scalar parameters by name. Pack and unpack kernels are fully specialized
    /// at generation time and leave this empty.
    pub uniforms: BTreeMap<String, f32>,
}

impl Binding {
    pub fn new(inputs: Vec<TextureData>, output: TextureData) -> Self {
        Self {
            inputs,
            output,
            uniforms: BTreeMap::new(),
        }
    }
}
