//! Typed kernel programs.
//!
//! Kernels are assembled from validated fragments rather than raw strings: a
//! [`Symbol`] is a checked GLSL identifier, a [`CoordExpr`] is a non-empty list
//! of symbols with optional offsets, and [`KernelBuilder::build`] verifies that
//! every fragment refers to the declared output coordinate and samplers. Only a
//! fully built [`Kernel`] can be rendered to source text.

mod generator;
mod render;

use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::error::KernelBuildError;
use crate::packing::coords::{MAX_RANK, OUTPUT_COORDS_VAR};
use crate::packing::Channel;
use crate::tensor::Coords;

pub use generator::{
    build_unpack_kernel, generate, generate_pack_kernel, generate_unpack_kernel,
    PACK_KERNEL_NAME, UNPACK_KERNEL_NAME,
};

const AXIS_MEMBERS: [&str; MAX_RANK] = ["x", "y", "z", "w", "u", "v"];

fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
}

pub(crate) fn check_rank(rank: usize) -> Result<(), KernelBuildError> {
    if rank == 0 || rank > MAX_RANK {
        return Err(KernelBuildError::UnsupportedRank(rank));
    }
    Ok(())
}

/// A GLSL variable, optionally narrowed to one vector component (`rc.y`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Symbol {
    base: String,
    member: Option<String>,
}

impl Symbol {
    pub fn parse(text: &str) -> Result<Self, KernelBuildError> {
        let text = text.trim();
        let (base, member) = match text.split_once('.') {
            Some((base, member)) => (base, Some(member)),
            None => (text, None),
        };
        if !is_identifier(base) || member.is_some_and(|member| !is_identifier(member)) {
            return Err(KernelBuildError::InvalidIdentifier(text.to_string()));
        }
        Ok(Symbol {
            base: base.to_string(),
            member: member.map(str::to_string),
        })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn member(&self) -> Option<&str> {
        self.member.as_deref()
    }

    /// Axis of the coordinate vector this symbol reads; a bare symbol is axis 0.
    pub fn axis(&self) -> Option<usize> {
        match &self.member {
            None => Some(0),
            Some(member) => AXIS_MEMBERS.iter().position(|axis| axis == member),
        }
    }

    /// Value of this symbol when `var` holds `coords`.
    pub fn resolve(&self, var: &str, coords: &[usize]) -> Option<usize> {
        if self.base != var {
            return None;
        }
        coords.get(self.axis()?).copied()
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.member {
            Some(member) => write!(f, "{}.{}", self.base, member),
            None => write!(f, "{}", self.base),
        }
    }
}

/// Input sampler, read in kernel source through `get<Name>(...)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SamplerName(char);

impl SamplerName {
    pub fn parse(text: &str) -> Result<Self, KernelBuildError> {
        let mut chars = text.chars();
        match (chars.next(), chars.next()) {
            (Some(ch), None) if ch.is_ascii_uppercase() => Ok(SamplerName(ch)),
            _ => Err(KernelBuildError::InvalidSampler(text.to_string())),
        }
    }

    pub fn accessor(self) -> String {
        format!("get{}", self.0)
    }
}

impl fmt::Display for SamplerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One axis of a coordinate expression: `symbol + offset`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CoordTerm {
    pub symbol: Symbol,
    pub offset: usize,
}

impl CoordTerm {
    pub fn evaluate(&self, var: &str, coords: &[usize]) -> Option<usize> {
        Some(self.symbol.resolve(var, coords)? + self.offset)
    }
}

impl fmt::Display for CoordTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.offset == 0 {
            write!(f, "{}", self.symbol)
        } else {
            write!(f, "{} + {}", self.symbol, self.offset)
        }
    }
}

/// Ordered, non-empty list of axis terms addressing a sampler.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CoordExpr {
    terms: Vec<CoordTerm>,
}

impl CoordExpr {
    pub fn new<I>(symbols: I) -> Result<Self, KernelBuildError>
    where
        I: IntoIterator<Item = Symbol>,
    {
        let terms: Vec<CoordTerm> = symbols
            .into_iter()
            .map(|symbol| CoordTerm { symbol, offset: 0 })
            .collect();
        if terms.is_empty() {
            return Err(KernelBuildError::EmptyCoordExpr);
        }
        Ok(CoordExpr { terms })
    }

    /// Parses a comma-joined symbol list such as `rc.x,rc.y`.
    pub fn parse(text: &str) -> Result<Self, KernelBuildError> {
        if text.trim().is_empty() {
            return Err(KernelBuildError::EmptyCoordExpr);
        }
        let symbols = text
            .split(',')
            .map(Symbol::parse)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(symbols)
    }

    /// Adds `offset` to the term at `axis`.
    pub fn with_offset(mut self, axis: usize, offset: usize) -> Self {
        if let Some(term) = self.terms.get_mut(axis) {
            term.offset += offset;
        }
        self
    }

    pub fn terms(&self) -> &[CoordTerm] {
        &self.terms
    }

    pub fn arity(&self) -> usize {
        self.terms.len()
    }

    pub fn evaluate(&self, var: &str, coords: &[usize]) -> Option<Coords> {
        self.terms
            .iter()
            .map(|term| term.evaluate(var, coords))
            .collect::<Option<SmallVec<_>>>()
    }
}

impl fmt::Display for CoordExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, term) in self.terms.iter().enumerate() {
            if idx > 0 {
                write!(f, ",")?;
            }
            write!(f, "{term}")?;
        }
        Ok(())
    }
}

/// Coordinate pair handed to the channel helper.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InnerCoord {
    /// Second-innermost and innermost axes.
    Pair(Symbol, Symbol),
    /// Single axis against a constant zero column.
    Column(Symbol),
}

impl InnerCoord {
    pub fn from_symbols(rank: usize, symbols: &[String]) -> Result<Self, KernelBuildError> {
        if symbols.len() != rank || rank == 0 {
            return Err(KernelBuildError::ArityMismatch {
                expected: rank,
                got: symbols.len(),
            });
        }
        if rank == 1 {
            return Ok(InnerCoord::Column(Symbol::parse(&symbols[0])?));
        }
        Ok(InnerCoord::Pair(
            Symbol::parse(&symbols[rank - 2])?,
            Symbol::parse(&symbols[rank - 1])?,
        ))
    }

    fn symbols(&self) -> SmallVec<[&Symbol; 2]> {
        match self {
            InnerCoord::Pair(row, col) => SmallVec::from_buf([row, col]),
            InnerCoord::Column(row) => SmallVec::from_slice(&[row]),
        }
    }

    /// `(row, col)` at `coords`.
    pub fn evaluate(&self, var: &str, coords: &[usize]) -> Option<(usize, usize)> {
        match self {
            InnerCoord::Pair(row, col) => Some((row.resolve(var, coords)?, col.resolve(var, coords)?)),
            InnerCoord::Column(row) => Some((row.resolve(var, coords)?, 0)),
        }
    }
}

impl fmt::Display for InnerCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InnerCoord::Pair(row, col) => write!(f, "vec2({row},{col})"),
            InnerCoord::Column(row) => write!(f, "vec2({row}, 0)"),
        }
    }
}

/// `term < limit`, guarding a read past the edge of an odd-sized axis.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Bound {
    pub term: CoordTerm,
    pub limit: usize,
}

impl Bound {
    pub fn holds(&self, var: &str, coords: &[usize]) -> bool {
        self.term
            .evaluate(var, coords)
            .is_some_and(|value| value < self.limit)
    }
}

/// One channel written by a pack kernel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PackTap {
    pub channel: Channel,
    pub source: CoordExpr,
    pub guards: Vec<Bound>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Helper {
    /// `float getChannel(vec4 frag, vec2 innerDims)`.
    GetChannel,
}

/// What `getOutputCoords()` yields for each output texel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutputCoords {
    /// Logical coordinates of the single element stored in the texel.
    Element,
    /// Logical coordinates of the top-left element of the texel's 2x2 block.
    BlockOrigin,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KernelBody {
    Unpack {
        sampler: SamplerName,
        source: CoordExpr,
        inner: InnerCoord,
    },
    Pack {
        sampler: SamplerName,
        taps: Vec<PackTap>,
    },
}

impl KernelBody {
    fn sampler(&self) -> SamplerName {
        match self {
            KernelBody::Unpack { sampler, .. } | KernelBody::Pack { sampler, .. } => *sampler,
        }
    }

    fn coord_exprs(&self) -> Vec<&CoordExpr> {
        match self {
            KernelBody::Unpack { source, .. } => vec![source],
            KernelBody::Pack { taps, .. } => taps.iter().map(|tap| &tap.source).collect(),
        }
    }
}

/// A validated kernel specialized to one rank and layout.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Kernel {
    name: String,
    rank: usize,
    output_var: String,
    output_coords: OutputCoords,
    samplers: Vec<SamplerName>,
    helpers: Vec<Helper>,
    body: KernelBody,
}

impl Kernel {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn output_var(&self) -> &str {
        &self.output_var
    }

    pub fn output_coords(&self) -> OutputCoords {
        self.output_coords
    }

    pub fn samplers(&self) -> &[SamplerName] {
        &self.samplers
    }

    pub fn helpers(&self) -> &[Helper] {
        &self.helpers
    }

    pub fn body(&self) -> &KernelBody {
        &self.body
    }

    /// GLSL source of this kernel.
    pub fn render(&self) -> String {
        render::render_kernel(self)
    }
}

pub struct KernelBuilder {
    name: String,
    rank: usize,
    output_coords: OutputCoords,
    samplers: Vec<SamplerName>,
    helpers: Vec<Helper>,
}

impl KernelBuilder {
    pub fn new(name: impl Into<String>, rank: usize, output_coords: OutputCoords) -> Self {
        Self {
            name: name.into(),
            rank,
            output_coords,
            samplers: Vec::new(),
            helpers: Vec::new(),
        }
    }

    pub fn sampler(mut self, name: &str) -> Result<Self, KernelBuildError> {
        let sampler = SamplerName::parse(name)?;
        if !self.samplers.contains(&sampler) {
            self.samplers.push(sampler);
        }
        Ok(self)
    }

    pub fn helper(mut self, helper: Helper) -> Self {
        if !self.helpers.contains(&helper) {
            self.helpers.push(helper);
        }
        self
    }

    pub fn build(self, body: KernelBody) -> Result<Kernel, KernelBuildError> {
        check_rank(self.rank)?;
        let sampler = body.sampler();
        if !self.samplers.contains(&sampler) {
            return Err(KernelBuildError::UndeclaredSampler(sampler.to_string()));
        }
        for expr in body.coord_exprs() {
            if expr.arity() != self.rank {
                return Err(KernelBuildError::ArityMismatch {
                    expected: self.rank,
                    got: expr.arity(),
                });
            }
            for term in expr.terms() {
                self.check_symbol(&term.symbol)?;
            }
        }
        match &body {
            KernelBody::Unpack { inner, .. } => {
                for symbol in inner.symbols() {
                    self.check_symbol(symbol)?;
                }
            }
            KernelBody::Pack { taps, .. } => {
                for guard in taps.iter().flat_map(|tap| &tap.guards) {
                    self.check_symbol(&guard.term.symbol)?;
                }
            }
        }
        Ok(Kernel {
            name: self.name,
            rank: self.rank,
            output_var: OUTPUT_COORDS_VAR.to_string(),
            output_coords: self.output_coords,
            samplers: self.samplers,
            helpers: self.helpers,
            body,
        })
    }

    /// Symbols must read an existing axis of the output coordinate.
    fn check_symbol(&self, symbol: &Symbol) -> Result<(), KernelBuildError> {
        let in_range = symbol.axis().is_some_and(|axis| axis < self.rank);
        let shape_ok = (self.rank == 1) == symbol.member().is_none();
        if symbol.base() != OUTPUT_COORDS_VAR || !in_range || !shape_ok {
            return Err(KernelBuildError::InvalidIdentifier(symbol.to_string()));
        }
        Ok(())
    }
}
