pub mod address;
pub mod page_table;
pub mod tlb;
pub mod translator;

pub use address::{parse_address, read_address_lines};
pub use translator::{
    split16, split32, TranslateError, Translation, Translation16, Translation32, Translator,
};
