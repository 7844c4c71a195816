//! Container layout parsing for the mdec codec.
//!
//! This crate handles the binary container format: the header, the attribute
//! descriptor table, the group list, and the byte/bitstream cursors used to
//! walk the compressed payload. It does not know how residuals or
//! connectivity are coded, only the structure around them.
//!
//! # Design Principles
//!
//! - **Stable wire format** - The format is versioned and changes are documented.
//! - **Bounded parsing** - All length fields are validated against limits before iteration.
//! - **No decoding knowledge** - This crate handles layout, not entropy coding
//!   or geometry reconstruction.

mod cursor;
mod error;
mod groups;
mod header;
mod limits;

pub use cursor::ByteCursor;
pub use error::{FormatError, LimitKind, WireResult};
pub use groups::{decode_groups, Group};
pub use header::{
    decode_header, AttributeCodec, AttributeDescriptor, EntropyScheme, Header, StrategyFlags,
    ValueType, MAGIC, VERSION,
};
pub use limits::Limits;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_api_exports() {
        // Verify all expected items are exported
        let _ = MAGIC;
        let _ = VERSION;
        let _ = Limits::default();
        let _ = StrategyFlags::new(0);
        let _ = ByteCursor::new(&[]);

        let _: WireResult<()> = Ok(());
    }

    #[test]
    fn magic_is_fixed_constant() {
        assert_eq!(MAGIC, 0x787A_6300);
        assert_eq!(MAGIC, 2_021_286_656);
    }
}
