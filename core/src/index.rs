//! Index element width selection.

use crate::buffer::{BufferData, ElementType};

/// Largest index value stored in 16-bit index buffers.
///
/// `u16::MAX` itself is the primitive-restart sentinel and never a valid index.
pub const MAX_U16_INDEX: u32 = u16::MAX as u32 - 1;

/// Storage width of an index buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum IndexWidth {
    /// 16-bit unsigned indices.
    #[default]
    U16,
    /// 32-bit unsigned indices.
    U32,
}

impl IndexWidth {
    /// Narrowest width able to hold `max_index`.
    pub fn for_max_index(max_index: u32) -> Self {
        if max_index > MAX_U16_INDEX {
            Self::U32
        } else {
            Self::U16
        }
    }

    /// Narrowest width able to hold every value in `indices`.
    pub fn for_indices(indices: &[u32]) -> Self {
        Self::for_max_index(indices.iter().copied().max().unwrap_or(0))
    }

    /// Size of one index in bytes.
    pub fn size(&self) -> usize {
        match self {
            Self::U16 => 2,
            Self::U32 => 4,
        }
    }

    /// Matching element type.
    pub fn element_type(&self) -> ElementType {
        match self {
            Self::U16 => ElementType::U16,
            Self::U32 => ElementType::U32,
        }
    }

    /// Width of an existing index array, if its element type is a valid index type.
    pub fn of_element_type(element_type: ElementType) -> Option<Self> {
        match element_type {
            ElementType::U16 => Some(Self::U16),
            ElementType::U32 => Some(Self::U32),
            _ => None,
        }
    }

    /// Pack indices into an array of this width.
    ///
    /// Callers pick the width with [`for_indices`](Self::for_indices), so
    /// narrowing to 16 bits never truncates.
    pub fn pack(&self, indices: &[u32]) -> BufferData {
        match self {
            Self::U16 => BufferData::U16(indices.iter().map(|&i| i as u16).collect()),
            Self::U32 => BufferData::U32(indices.to_vec()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, IndexWidth::U16)]
    #[case(65534, IndexWidth::U16)]
    #[case(65535, IndexWidth::U32)]
    #[case(1_000_000, IndexWidth::U32)]
    fn test_width_threshold(#[case] max: u32, #[case] expected: IndexWidth) {
        assert_eq!(IndexWidth::for_max_index(max), expected);
    }

    #[test]
    fn test_for_indices() {
        assert_eq!(IndexWidth::for_indices(&[]), IndexWidth::U16);
        assert_eq!(IndexWidth::for_indices(&[0, 65534, 3]), IndexWidth::U16);
        assert_eq!(IndexWidth::for_indices(&[0, 65535, 3]), IndexWidth::U32);
    }

    #[test]
    fn test_pack() {
        let packed = IndexWidth::U16.pack(&[0, 1, 2]);
        assert_eq!(packed, BufferData::U16(vec![0, 1, 2]));
        assert_eq!(IndexWidth::U32.size(), 4);
    }
}
