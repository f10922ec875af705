mod compat;
mod interface;
mod scan;
mod schema;

pub use compat::parse_compat_flags;
pub use interface::{parse_registration_block, parse_registration_text};
pub use scan::{
    BRACE_LOOKAHEAD, Block, brace_delta, extract_braced_block, gather_parenthesized,
    outer_parenthesized,
};
pub use schema::{find_record, parse_schema};
