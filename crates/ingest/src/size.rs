/// Approximate characters per processing unit of the extraction service.
pub const CHARS_PER_UNIT: usize = 4;

/// Estimate how many processing units the extraction service will bill for `text`.
///
/// Rounds up, so any non-empty text costs at least one unit.
pub fn estimate_units(text: &str) -> usize {
    let chars = text.chars().count();
    chars.div_ceil(CHARS_PER_UNIT)
}
