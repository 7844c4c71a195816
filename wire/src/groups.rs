//! Group list: named sub-ranges of the face (or vertex) index space.

use crate::cursor::ByteCursor;
use crate::error::{FormatError, LimitKind, WireResult};
use crate::limits::Limits;

/// A sub-range of the decoded geometry with string-keyed properties.
///
/// `end` is the exclusive end offset of the range in faces (meshes) or
/// vertices (point clouds); the range starts where the previous group ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub end: u32,
    pub properties: Vec<(String, String)>,
}

/// Parses the group list from the current cursor position.
pub fn decode_groups(cursor: &mut ByteCursor<'_>, limits: &Limits) -> WireResult<Vec<Group>> {
    let count = cursor.read_i32()?;
    if count < 0 {
        return Err(FormatError::NegativeCount {
            field: "group",
            found: count,
        });
    }
    let count = count as usize;
    if count > limits.max_groups {
        return Err(FormatError::LimitsExceeded {
            kind: LimitKind::Groups,
            limit: limits.max_groups,
            actual: count,
        });
    }
    let mut groups = Vec::with_capacity(count);
    for _ in 0..count {
        let end = cursor.read_u32()?;
        let property_count = cursor.read_u8()?;
        let mut properties = Vec::with_capacity(property_count as usize);
        for _ in 0..property_count {
            let key = cursor.read_string()?;
            let value = cursor.read_string()?;
            if key.len() > limits.max_string_len || value.len() > limits.max_string_len {
                return Err(FormatError::LimitsExceeded {
                    kind: LimitKind::StringLength,
                    limit: limits.max_string_len,
                    actual: key.len().max(value.len()),
                });
            }
            properties.push((key, value));
        }
        groups.push(Group { end, properties });
    }
    Ok(groups)
}
