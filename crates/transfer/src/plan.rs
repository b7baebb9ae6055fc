use crate::TransferError;

/// One contiguous slice of the source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartSpec {
    /// 1-based part number.
    pub part_number: u32,
    /// Byte offset within the source.
    pub offset: u64,
    /// Length of the slice in bytes.
    pub length: u64,
}

impl PartSpec {
    /// Exclusive end offset.
    pub fn end(&self) -> u64 {
        self.offset + self.length
    }
}

/// Splits `total_size` bytes into parts of `part_size` bytes.
///
/// Parts are numbered `1..=N` with `N = ceil(total_size / part_size)`;
/// only the last part may be shorter. A zero-byte source yields an empty
/// plan.
pub fn plan_parts(total_size: u64, part_size: u64) -> Result<Vec<PartSpec>, TransferError> {
    if part_size == 0 {
        return Err(TransferError::InvalidPlan("part size must be > 0".into()));
    }

    let count = total_size.div_ceil(part_size);
    if count > u64::from(u32::MAX) {
        return Err(TransferError::InvalidPlan(format!(
            "{count} parts exceed the part number range"
        )));
    }

    let parts = (0..count)
        .map(|i| {
            let offset = i * part_size;
            PartSpec {
                part_number: i as u32 + 1,
                offset,
                length: part_size.min(total_size - offset),
            }
        })
        .collect();
    Ok(parts)
}
