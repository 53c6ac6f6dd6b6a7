//! `Decode` derive macro implementation.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::DeriveInput;

use crate::utils::{DecodeStruct, Receiver, StructShape};

impl DecodeStruct {
    fn unmarshal_tokens(&self, cr: &TokenStream2) -> (TokenStream2, TokenStream2) {
        match self.unmarshal() {
            None => (quote!(::core::option::Option::None), quote!()),
            Some(Receiver::Pointer) => (
                quote!(::core::option::Option::Some(#cr::metadata::Receiver::Pointer)),
                quote! {
                    fn unmarshaler(&mut self) -> ::core::option::Option<#cr::de::Unmarshaler<'_>> {
                        ::core::option::Option::Some(#cr::de::Unmarshaler::Pointer(self))
                    }
                },
            ),
            Some(Receiver::Value) => (
                quote!(::core::option::Option::Some(#cr::metadata::Receiver::Value)),
                quote! {
                    fn unmarshaler(&mut self) -> ::core::option::Option<#cr::de::Unmarshaler<'_>> {
                        let copy = ::core::clone::Clone::clone(self);
                        ::core::option::Option::Some(#cr::de::Unmarshaler::Value(::std::boxed::Box::new(copy)))
                    }
                },
            ),
        }
    }

    fn derive_decode(&self) -> syn::Result<TokenStream2> {
        let cr = self.cr();
        let name = &self.name;
        let rust_type = self.rust_type(&cr);
        let (receiver, unmarshaler) = self.unmarshal_tokens(&cr);

        let (kind, node, struct_node) = match &self.shape {
            StructShape::Named(fields) => {
                let field_metadata = fields
                    .iter()
                    .map(|field| field.metadata(&cr))
                    .collect::<syn::Result<Vec<_>>>()?;
                let match_arms = fields.iter().enumerate().map(|(i, field)| {
                    let member = &field.member;
                    quote!(#i => &mut self.#member,)
                });

                let struct_node = quote! {
                    impl #cr::de::StructNode for #name {
                        fn fields(&self) -> &'static [#cr::metadata::FieldMetadata] {
                            const FIELDS: &[#cr::metadata::FieldMetadata] = &[#(#field_metadata,)*];
                            FIELDS
                        }

                        fn field_mut(&mut self, index: usize) -> &mut dyn #cr::Decode {
                            match index {
                                #(#match_arms)*
                                _ => ::core::panic!("field index {index} is out of bounds"),
                            }
                        }
                    }
                };
                (
                    quote!(#cr::metadata::Kind::Struct),
                    quote!(#cr::de::Node::Struct(self)),
                    struct_node,
                )
            }
            StructShape::Newtype(field) => {
                let ty = &field.ty;
                let member = &field.member;
                (
                    quote!(<#ty as #cr::DescribeType>::TYPE.kind),
                    quote!(#cr::Decode::node(&mut self.#member)),
                    quote!(),
                )
            }
        };

        Ok(quote! {
            impl #cr::DescribeType for #name {
                const TYPE: #cr::metadata::TypeMetadata =
                    #cr::metadata::TypeMetadata::new(#rust_type, #kind).with_unmarshal(#receiver);

                fn zero() -> Self {
                    <Self as ::core::default::Default>::default()
                }
            }

            impl #cr::Decode for #name {
                fn node(&mut self) -> #cr::de::Node<'_> {
                    #node
                }

                #unmarshaler
            }

            #struct_node
        })
    }
}

pub(crate) fn impl_decode(input: TokenStream) -> TokenStream {
    let input: DeriveInput = syn::parse(input).unwrap();
    let trait_impl = match DecodeStruct::new(&input, "Decode") {
        Ok(trait_impl) => trait_impl,
        Err(err) => return err.into_compile_error().into(),
    };
    match trait_impl.derive_decode() {
        Ok(tokens) => tokens.into(),
        Err(err) => err.into_compile_error().into(),
    }
}
