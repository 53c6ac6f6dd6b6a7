//! `Encode` derive macro implementation.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::DeriveInput;

use crate::utils::{DecodeStruct, StructShape};

impl DecodeStruct {
    fn derive_encode(&self) -> syn::Result<TokenStream2> {
        let cr = self.cr();
        let name = &self.name;

        let body = match &self.shape {
            StructShape::Named(fields) => {
                let rust_type = self.rust_type(&cr);
                let fields = fields
                    .iter()
                    .map(|field| field.struct_field(&cr))
                    .collect::<syn::Result<Vec<_>>>()?;
                quote! {
                    let fields = ::std::vec![#(#fields,)*];
                    #cr::Value::Struct(#cr::value::StructValue::new(#rust_type, fields))
                }
            }
            StructShape::Newtype(field) => {
                let member = &field.member;
                quote!(#cr::Encode::encode(&self.#member))
            }
        };

        Ok(quote! {
            impl #cr::Encode for #name {
                fn encode(&self) -> #cr::Value {
                    #body
                }
            }
        })
    }
}

pub(crate) fn impl_encode(input: TokenStream) -> TokenStream {
    let input: DeriveInput = syn::parse(input).unwrap();
    let trait_impl = match DecodeStruct::new(&input, "Encode") {
        Ok(trait_impl) => trait_impl,
        Err(err) => return err.into_compile_error().into(),
    };
    match trait_impl.derive_encode() {
        Ok(tokens) => tokens.into(),
        Err(err) => err.into_compile_error().into(),
    }
}
