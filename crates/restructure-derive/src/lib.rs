//! Procedural macros for `restructure`.
//!
//! All macros in this crate are re-exported from the `restructure` crate. See its docs for more details
//! and the examples of usage.

// General settings
#![recursion_limit = "128"]
// Linter settings
#![allow(missing_docs)] // Adding docs here would interfere with docs in the main crate

extern crate proc_macro;

use proc_macro::TokenStream;

mod de;
mod encode;
mod utils;

#[proc_macro_derive(Decode, attributes(decode, tag))]
pub fn decode(input: TokenStream) -> TokenStream {
    de::impl_decode(input)
}

#[proc_macro_derive(Encode, attributes(decode, tag))]
pub fn encode(input: TokenStream) -> TokenStream {
    encode::impl_encode(input)
}
