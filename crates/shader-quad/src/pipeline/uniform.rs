//! User-declared uniforms.
//!
//! All uniforms of a pipeline live in one WGSL struct, `QuadUniforms`, bound
//! as `uniforms`. Offsets follow the WGSL uniform address space layout:
//!
//! | declaration      | WGSL type              | align | size   |
//! |------------------|------------------------|-------|--------|
//! | 1 component      | `f32`                  | 4     | 4      |
//! | 2 components     | `vec2<f32>`            | 8     | 8      |
//! | 3 components     | `vec3<f32>`            | 16    | 12     |
//! | 4 components     | `vec4<f32>`            | 16    | 16     |
//! | array of N       | `array<vec4<f32>, N>`  | 16    | 16 * N |
//!
//! Array elements are always padded to `vec4<f32>` because uniform arrays need
//! a 16-byte stride; unused lanes stay zero.

use crate::error::QuadError;

/// Returned by uniform lookups when no uniform has the requested name.
pub const UNIFORM_NOT_FOUND: i32 = -1;

/// Smallest block: WGSL structs cannot be empty, so an unused block carries one `vec4` of padding.
const MIN_WORDS: usize = 4;

/// One declared uniform. Offsets are in 32-bit words.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformDecl {
    name: String,
    n_components: usize,
    array_len: Option<usize>,
    offset: usize,
}

impl UniformDecl {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn n_components(&self) -> usize {
        self.n_components
    }

    pub fn array_len(&self) -> Option<usize> {
        self.array_len
    }

    /// Number of vectors the uniform holds (1 for non-arrays).
    pub fn capacity(&self) -> usize {
        self.array_len.unwrap_or(1)
    }

    /// Byte offset inside the uniform block.
    pub fn byte_offset(&self) -> usize {
        self.offset * 4
    }

    /// WGSL type emitted in `QuadUniforms`.
    pub fn wgsl_type(&self) -> String {
        match (self.array_len, self.n_components) {
            (Some(len), _) => format!("array<vec4<f32>, {len}>"),
            (None, 1) => "f32".to_owned(),
            (None, n) => format!("vec{n}<f32>"),
        }
    }

    fn stride_words(&self) -> usize {
        if self.array_len.is_some() { 4 } else { self.n_components }
    }

    fn size_words(&self) -> usize {
        match self.array_len {
            Some(len) => 4 * len,
            None => self.n_components,
        }
    }

    fn end_words(&self) -> usize {
        self.offset + self.size_words()
    }
}

fn align_words(n_components: usize, is_array: bool) -> usize {
    match (is_array, n_components) {
        (true, _) => 4,
        (false, 1) => 1,
        (false, 2) => 2,
        (false, _) => 4,
    }
}

#[inline]
fn round_up(value: usize, align: usize) -> usize {
    value.div_ceil(align) * align
}

/// Checks `name` against the WGSL identifier grammar (ASCII subset).
fn is_wgsl_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else { return false };
    if !(first.is_ascii_alphabetic() || first == '_') {
        return false;
    }
    name != "_" && !name.starts_with("__") && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Declarations plus the CPU copy of their values.
#[derive(Debug, Clone)]
pub struct UniformBlock {
    decls: Vec<UniformDecl>,
    data: Vec<f32>,
    generation: u64,
}

impl Default for UniformBlock {
    fn default() -> Self {
        Self {
            decls: Vec::new(),
            data: vec![0.0; MIN_WORDS],
            generation: 0,
        }
    }
}

impl UniformBlock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }

    pub fn decls(&self) -> &[UniformDecl] {
        &self.decls
    }

    /// Declares a uniform and returns its location. Values start zeroed.
    pub fn declare(
        &mut self,
        name: &str,
        n_components: usize,
        array_len: Option<usize>,
    ) -> Result<i32, QuadError> {
        if !is_wgsl_identifier(name) {
            return Err(QuadError::InvalidUniformName { name: name.to_owned() });
        }
        if !(1..=4).contains(&n_components) {
            return Err(QuadError::InvalidComponents { n_components });
        }
        if array_len == Some(0) {
            return Err(QuadError::InvalidArrayLength { name: name.to_owned() });
        }
        if self.location(name) != UNIFORM_NOT_FOUND {
            return Err(QuadError::DuplicateUniform { name: name.to_owned() });
        }

        let end = self.decls.last().map_or(0, UniformDecl::end_words);
        let decl = UniformDecl {
            name: name.to_owned(),
            n_components,
            array_len,
            offset: round_up(end, align_words(n_components, array_len.is_some())),
        };

        let words = round_up(decl.end_words(), 4).max(MIN_WORDS);
        self.data.resize(words, 0.0);
        self.decls.push(decl);
        self.generation += 1;

        Ok((self.decls.len() - 1) as i32)
    }

    /// Location of `name`, or [`UNIFORM_NOT_FOUND`].
    pub fn location(&self, name: &str) -> i32 {
        self.decls
            .iter()
            .position(|d| d.name == name)
            .map_or(UNIFORM_NOT_FOUND, |i| i as i32)
    }

    pub fn get(&self, location: i32) -> Option<&UniformDecl> {
        usize::try_from(location).ok().and_then(|i| self.decls.get(i))
    }

    /// Writes `count` vectors of `n_components` floats, taken from the front of `values`.
    pub fn set_float(
        &mut self,
        location: i32,
        n_components: usize,
        count: usize,
        values: &[f32],
    ) -> Result<(), QuadError> {
        if !(1..=4).contains(&n_components) {
            return Err(QuadError::InvalidComponents { n_components });
        }
        let Some(decl) = self.get(location) else {
            return Err(QuadError::InvalidUniform { location });
        };
        if decl.n_components != n_components {
            return Err(QuadError::ComponentMismatch {
                name: decl.name.clone(),
                expected: decl.n_components,
                actual: n_components,
            });
        }
        if count > decl.capacity() {
            return Err(QuadError::TooManyElements {
                name: decl.name.clone(),
                max: decl.capacity(),
                requested: count,
            });
        }
        let needed = count * n_components;
        if values.len() < needed {
            return Err(QuadError::ShortBuffer { expected: needed, actual: values.len() });
        }

        let (offset, stride) = (decl.offset, decl.stride_words());
        for (i, vector) in values[..needed].chunks_exact(n_components).enumerate() {
            let start = offset + i * stride;
            self.data[start..start + n_components].copy_from_slice(vector);
        }
        self.generation += 1;
        Ok(())
    }

    /// Raw slots of one uniform, including array padding lanes.
    pub fn values(&self, location: i32) -> Option<&[f32]> {
        let decl = self.get(location)?;
        self.data.get(decl.offset..decl.end_words())
    }

    /// Block contents as uploaded to the GPU; always a non-zero multiple of 16 bytes.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }

    /// Bumped on every declaration or write.
    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(decls: &[(&str, usize, Option<usize>)]) -> UniformBlock {
        let mut b = UniformBlock::new();
        for (name, n, len) in decls {
            b.declare(name, *n, *len).unwrap();
        }
        b
    }

    // ── layout ────────────────────────────────────────────────────────────

    #[test]
    fn offsets_follow_wgsl_alignment() {
        let b = block(&[
            ("a", 1, None),
            ("b", 3, None),
            ("c", 1, None),
            ("d", 2, None),
            ("e", 2, Some(3)),
        ]);
        let offsets: Vec<usize> = b.decls().iter().map(UniformDecl::byte_offset).collect();
        // f32 @0, vec3 aligned to 16, f32 packs into the vec3 tail, vec2 aligned to 8, array to 16.
        assert_eq!(offsets, vec![0, 16, 28, 32, 48]);
        assert_eq!(b.as_bytes().len(), 48 + 3 * 16);
    }

    #[test]
    fn empty_block_is_one_vec4() {
        assert_eq!(UniformBlock::new().as_bytes().len(), 16);
    }

    #[test]
    fn wgsl_types() {
        let b = block(&[("s", 1, None), ("v", 3, None), ("arr", 1, Some(5))]);
        let types: Vec<String> = b.decls().iter().map(UniformDecl::wgsl_type).collect();
        assert_eq!(types, vec!["f32", "vec3<f32>", "array<vec4<f32>, 5>"]);
    }

    // ── declare ───────────────────────────────────────────────────────────

    #[test]
    fn declare_rejects_bad_input() {
        let mut b = block(&[("x", 1, None)]);
        assert!(matches!(b.declare("x", 1, None), Err(QuadError::DuplicateUniform { .. })));
        assert!(matches!(b.declare("1x", 1, None), Err(QuadError::InvalidUniformName { .. })));
        assert!(matches!(b.declare("__x", 1, None), Err(QuadError::InvalidUniformName { .. })));
        assert!(matches!(b.declare("y", 5, None), Err(QuadError::InvalidComponents { n_components: 5 })));
        assert!(matches!(b.declare("z", 2, Some(0)), Err(QuadError::InvalidArrayLength { .. })));
        assert_eq!(b.decls().len(), 1);
    }

    #[test]
    fn location_is_stable_and_missing_is_sentinel() {
        let b = block(&[("alpha", 1, None), ("beta", 4, None)]);
        assert_eq!(b.location("beta"), 1);
        assert_eq!(b.location("beta"), b.location("beta"));
        assert_eq!(b.location("gamma"), UNIFORM_NOT_FOUND);
        assert!(b.get(UNIFORM_NOT_FOUND).is_none());
    }

    // ── set_float ─────────────────────────────────────────────────────────

    #[test]
    fn vector_array_write_uses_vec4_stride() {
        let mut b = block(&[("pts", 2, Some(3))]);
        let loc = b.location("pts");
        b.set_float(loc, 2, 2, &[1.0, 2.0, 3.0, 4.0, 99.0]).unwrap();
        assert_eq!(
            b.values(loc).unwrap(),
            &[1.0, 2.0, 0.0, 0.0, 3.0, 4.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]
        );
    }

    #[test]
    fn write_does_not_touch_neighbours() {
        let mut b = block(&[("a", 3, None), ("b", 1, None)]);
        b.set_float(0, 3, 1, &[1.0, 2.0, 3.0]).unwrap();
        assert_eq!(b.values(1).unwrap(), &[0.0]);
    }

    #[test]
    fn set_float_rejects_contract_violations() {
        let mut b = block(&[("v", 4, None), ("arr", 1, Some(2))]);
        let before = b.as_bytes().to_vec();

        assert!(matches!(b.set_float(7, 4, 1, &[0.0; 4]), Err(QuadError::InvalidUniform { location: 7 })));
        assert!(matches!(b.set_float(0, 3, 1, &[0.0; 3]), Err(QuadError::ComponentMismatch { .. })));
        assert!(matches!(b.set_float(0, 4, 2, &[0.0; 8]), Err(QuadError::TooManyElements { .. })));
        assert!(matches!(b.set_float(1, 1, 2, &[0.0]), Err(QuadError::ShortBuffer { expected: 2, actual: 1 })));
        assert!(matches!(b.set_float(1, 0, 0, &[]), Err(QuadError::InvalidComponents { .. })));

        assert_eq!(b.as_bytes(), &before[..]);
    }

    #[test]
    fn generation_advances_on_write() {
        let mut b = block(&[("v", 1, None)]);
        let g = b.generation();
        b.set_float(0, 1, 1, &[0.5]).unwrap();
        assert!(b.generation() > g);
    }
}
