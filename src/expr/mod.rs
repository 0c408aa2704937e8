//! Expression decomposition pipeline.
//!
//! text → `tokenizer` → tokens → `postfix` (shunting-yard) → postfix tokens
//! → `decompose` → task graph

pub mod decompose;
pub mod postfix;
pub mod tokenizer;

pub use decompose::{Decomposer, Decomposition};
pub use postfix::to_postfix;
pub use tokenizer::{Token, tokenize};
