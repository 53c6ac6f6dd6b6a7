//! Parsing of derive inputs shared by all macros.

use proc_macro2::{Span, TokenStream};
use quote::{quote, quote_spanned};
use syn::{
    Attribute, Data, DeriveInput, Field, Fields, GenericArgument, Ident, Index, LitStr, Member, Path, PathArguments,
    Type, TypePath, ext::IdentExt,
};

/// Receiver of the custom decode method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Receiver {
    Pointer,
    Value,
}

impl Receiver {
    fn parse(lit: &LitStr) -> syn::Result<Self> {
        match lit.value().as_str() {
            "pointer" => Ok(Self::Pointer),
            "value" => Ok(Self::Value),
            _ => Err(syn::Error::new(lit.span(), "expected one of `pointer` or `value`")),
        }
    }
}

#[derive(Debug, Default)]
struct ContainerAttrs {
    cr: Option<Path>,
    unmarshal: Option<Receiver>,
}

impl ContainerAttrs {
    fn new(attrs: &[Attribute]) -> syn::Result<Self> {
        let decode_attrs = attrs.iter().filter(|attr| attr.path().is_ident("decode"));

        let mut this = Self::default();
        for attr in decode_attrs {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("crate") {
                    this.cr = Some(meta.value()?.parse()?);
                    Ok(())
                } else if meta.path.is_ident("unmarshal") {
                    this.unmarshal = Some(if meta.input.peek(syn::Token![=]) {
                        Receiver::parse(&meta.value()?.parse()?)?
                    } else {
                        Receiver::Pointer
                    });
                    Ok(())
                } else {
                    Err(meta.error("Unsupported attribute; only `crate` and `unmarshal` are supported"))
                }
            })?;
        }
        Ok(this)
    }
}

#[derive(Debug)]
pub(crate) struct DecodeField {
    pub member: Member,
    pub ty: Type,
    pub embedded: bool,
    tags: Vec<(String, LitStr)>,
}

impl DecodeField {
    fn new(raw: &Field, index: usize) -> syn::Result<Option<Self>> {
        let mut embedded = false;
        let mut skip = false;
        for attr in raw.attrs.iter().filter(|attr| attr.path().is_ident("decode")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("embed") {
                    embedded = true;
                    Ok(())
                } else if meta.path.is_ident("skip") {
                    skip = true;
                    Ok(())
                } else {
                    Err(meta.error("Unsupported attribute; only `embed` and `skip` are supported"))
                }
            })?;
        }

        let mut tags = vec![];
        for attr in raw.attrs.iter().filter(|attr| attr.path().is_ident("tag")) {
            attr.parse_nested_meta(|meta| {
                let Some(tag_name) = meta.path.get_ident() else {
                    return Err(meta.error("tag name must be an identifier"));
                };
                let tag_name = tag_name.unraw().to_string();
                if tags.iter().any(|(name, _)| *name == tag_name) {
                    return Err(meta.error(format!("tag `{tag_name}` is specified multiple times")));
                }
                let value: LitStr = meta.value()?.parse()?;
                tags.push((tag_name, value));
                Ok(())
            })?;
        }

        if skip {
            return Ok(None);
        }
        let member = raw
            .ident
            .clone()
            .map_or_else(|| Member::Unnamed(Index::from(index)), Member::Named);
        Ok(Some(Self {
            member,
            ty: raw.ty.clone(),
            embedded,
            tags,
        }))
    }

    fn span(&self) -> Span {
        match &self.member {
            Member::Named(ident) => ident.span(),
            Member::Unnamed(index) => index.span,
        }
    }

    pub fn rust_field_name(&self) -> String {
        match &self.member {
            Member::Named(ident) => ident.unraw().to_string(),
            Member::Unnamed(index) => index.index.to_string(),
        }
    }

    /// Returns the name of the embedded type with `Option` and `Box` wrappers removed.
    fn embedded_type_name(&self) -> syn::Result<String> {
        let mut ty = &self.ty;
        loop {
            let Type::Path(TypePath { qself: None, path }) = ty else {
                break;
            };
            let Some(segment) = path.segments.last() else {
                break;
            };
            if segment.ident != "Option" && segment.ident != "Box" {
                return Ok(segment.ident.unraw().to_string());
            }
            let PathArguments::AngleBracketed(args) = &segment.arguments else {
                break;
            };
            match args.args.first() {
                Some(GenericArgument::Type(inner)) if args.args.len() == 1 => ty = inner,
                _ => break,
            }
        }
        let message = "embedded field must have a named type, optionally wrapped in `Option` or `Box`";
        Err(syn::Error::new_spanned(&self.ty, message))
    }

    /// Canonical field name: the type name for embedded fields, or the Rust field name otherwise.
    fn name(&self) -> syn::Result<String> {
        if self.embedded {
            self.embedded_type_name()
        } else {
            Ok(self.rust_field_name())
        }
    }

    pub fn tags(&self) -> TokenStream {
        let tags = self.tags.iter().map(|(name, value)| quote!((#name, #value)));
        quote!(&[#(#tags,)*])
    }

    pub fn metadata(&self, cr: &TokenStream) -> syn::Result<TokenStream> {
        let name = self.name()?;
        let rust_field_name = self.rust_field_name();
        let tags = self.tags();
        let embedded = self.embedded;
        let ty = &self.ty;
        Ok(quote_spanned! {self.span()=>
            #cr::metadata::FieldMetadata {
                name: #name,
                rust_field_name: #rust_field_name,
                tags: #tags,
                embedded: #embedded,
                ty: <#ty as #cr::DescribeType>::TYPE,
            }
        })
    }

    pub fn struct_field(&self, cr: &TokenStream) -> syn::Result<TokenStream> {
        let name = self.name()?;
        let tags = self.tags();
        let embedded = self.embedded;
        let member = &self.member;
        Ok(quote_spanned! {self.span()=>
            #cr::value::StructField::new(#name, #tags, #embedded, #cr::Encode::encode(&self.#member))
        })
    }
}

/// Shape of the derive input.
#[derive(Debug)]
pub(crate) enum StructShape {
    /// Struct with named fields (or a unit struct).
    Named(Vec<DecodeField>),
    /// Tuple struct with a single field.
    Newtype(DecodeField),
}

#[derive(Debug)]
pub(crate) struct DecodeStruct {
    attrs: ContainerAttrs,
    pub name: Ident,
    pub shape: StructShape,
}

impl DecodeStruct {
    pub fn new(raw: &DeriveInput, macro_name: &str) -> syn::Result<Self> {
        let Data::Struct(data) = &raw.data else {
            let message = format!("#[derive({macro_name})] can only be placed on structs");
            return Err(syn::Error::new_spanned(raw, message));
        };
        if raw.generics.type_params().count() != 0
            || raw.generics.const_params().count() != 0
            || raw.generics.lifetimes().count() != 0
        {
            let message = "generics are not supported";
            return Err(syn::Error::new_spanned(&raw.generics, message));
        }

        let attrs = ContainerAttrs::new(&raw.attrs)?;
        let shape = match &data.fields {
            Fields::Named(_) | Fields::Unit => {
                let mut fields = vec![];
                for (i, field) in data.fields.iter().enumerate() {
                    fields.extend(DecodeField::new(field, i)?);
                }
                StructShape::Named(fields)
            }
            Fields::Unnamed(fields) if fields.unnamed.len() == 1 => {
                let field = DecodeField::new(&fields.unnamed[0], 0)?.ok_or_else(|| {
                    syn::Error::new_spanned(fields, "the wrapped field of a newtype cannot be skipped")
                })?;
                StructShape::Newtype(field)
            }
            Fields::Unnamed(fields) => {
                let message = "only newtype tuple structs (i.e., ones with a single field) are supported";
                return Err(syn::Error::new_spanned(fields, message));
            }
        };

        Ok(Self {
            attrs,
            name: raw.ident.clone(),
            shape,
        })
    }

    pub fn cr(&self) -> TokenStream {
        if let Some(cr) = &self.attrs.cr {
            quote!(#cr)
        } else {
            let name = &self.name;
            quote_spanned!(name.span()=> ::restructure)
        }
    }

    pub fn unmarshal(&self) -> Option<Receiver> {
        self.attrs.unmarshal
    }

    /// Returns `RustType` for the struct.
    pub fn rust_type(&self, cr: &TokenStream) -> TokenStream {
        let name = &self.name;
        let name_in_code = name.unraw().to_string();
        quote!(#cr::metadata::RustType::of::<Self>(#name_in_code))
    }
}
