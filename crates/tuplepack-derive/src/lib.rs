// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

extern crate proc_macro;

use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::ext::IdentExt;
use syn::{parse_macro_input, Data, DeriveInput, Fields, LitInt, LitStr};

/// Parsed field declaration
struct FieldInfo {
    ident: syn::Ident,
    /// Wire field name (raw identifiers unescaped)
    name: String,
    index: Option<(i64, proc_macro2::Span)>,
}

/// `#[derive(Schema)]` macro: generates `Schema`, `ToValue` and `FromValue`
///
/// Attributes:
/// - `#[schema(name = "...")]` on the struct: schema name (default: struct ident)
/// - `#[schema(index = N)]` on fields: explicit field index; either every
///   field has one or none does (sequential indices in declaration order)
///
/// Every field type must implement `ToValue` and `FromValue`. Use
/// `Option<T>` for fields that may be absent.
///
/// Example:
/// ```ignore
/// use tuplepack::Schema;
///
/// #[derive(Schema)]
/// #[schema(name = "Order")]
/// struct Order {
///     #[schema(index = 1)]
///     id: u32,
///     #[schema(index = 3)]
///     note: Option<String>,
/// }
/// ```
#[proc_macro_derive(Schema, attributes(schema))]
pub fn derive_schema(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let ident = &input.ident;

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Schema cannot be derived for generic types",
        ));
    }

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(f) => &f.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    input,
                    "Schema requires a struct with named fields",
                ))
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                input,
                "Schema can only be derived for structs",
            ))
        }
    };

    let schema_name = parse_struct_attrs(input)?.unwrap_or_else(|| ident.unraw().to_string());

    let mut infos = Vec::with_capacity(fields.len());
    for field in fields {
        let Some(field_ident) = field.ident.clone() else {
            return Err(syn::Error::new_spanned(field, "Field must have a name"));
        };
        let index = parse_field_attrs(field)?;
        infos.push(FieldInfo {
            name: field_ident.unraw().to_string(),
            ident: field_ident,
            index,
        });
    }

    // All-or-none explicit indices
    let explicit = infos.iter().filter(|f| f.index.is_some()).count();
    if explicit != 0 && explicit != infos.len() {
        let missing = infos.iter().find(|f| f.index.is_none()).map(|f| &f.ident);
        return Err(syn::Error::new_spanned(
            missing,
            "either every field has #[schema(index = N)] or none does",
        ));
    }
    for info in &infos {
        if let Some((index, span)) = info.index {
            if index <= 0 {
                return Err(syn::Error::new(span, "field index must be a positive integer"));
            }
        }
    }

    let descriptor_body = if explicit == 0 {
        let names = infos.iter().map(|f| &f.name);
        quote! {
            ::tuplepack::Descriptor::sequential(#schema_name, &[#(#names),*])
        }
    } else {
        let pairs = infos.iter().map(|f| {
            let name = &f.name;
            let index = f.index.map_or(0, |(i, _)| i);
            quote! { (#name, #index) }
        });
        quote! {
            ::tuplepack::Descriptor::explicit(#schema_name, &[#(#pairs),*])
        }
    };

    let owning_type = ident.unraw().to_string();

    let to_record_fields = infos.iter().map(|f| {
        let field_ident = &f.ident;
        let name = &f.name;
        quote! {
            record.set(#name, ::tuplepack::ToValue::to_value(&self.#field_ident));
        }
    });

    // Locals are prefixed so a field named `record` cannot shadow the input.
    let locals: Vec<_> = infos
        .iter()
        .map(|f| format_ident!("__field_{}", f.name))
        .collect();

    let from_record_fields = infos.iter().zip(&locals).map(|(f, local)| {
        let name = &f.name;
        quote! {
            let #local = ::tuplepack::FromValue::from_value(record.take(#name))
                .map_err(|e| e.in_field(#name))?;
        }
    });

    let field_inits = infos.iter().zip(&locals).map(|(f, local)| {
        let field_ident = &f.ident;
        quote! { #field_ident: #local }
    });

    Ok(quote! {
        impl ::tuplepack::Schema for #ident {
            fn owning_type() -> &'static str {
                ::core::concat!(::core::module_path!(), "::", #owning_type)
            }

            fn schema_name() -> &'static str {
                #schema_name
            }

            fn descriptor() -> ::core::result::Result<::tuplepack::Descriptor, ::tuplepack::DescriptorError> {
                #descriptor_body
            }

            #[allow(unused_mut)]
            fn to_record(&self) -> ::tuplepack::Record {
                let mut record = ::tuplepack::Record::new(<Self as ::tuplepack::Schema>::owning_type());
                #(#to_record_fields)*
                record
            }

            #[allow(unused_mut)]
            fn from_record(
                mut record: ::tuplepack::Record,
            ) -> ::core::result::Result<Self, ::tuplepack::ValueError> {
                ::tuplepack::schema::expect_owning_type::<Self>(&record)?;
                #(#from_record_fields)*
                ::core::result::Result::Ok(Self { #(#field_inits),* })
            }
        }

        impl ::tuplepack::ToValue for #ident {
            fn to_value(&self) -> ::tuplepack::Value {
                ::tuplepack::Value::Record(<Self as ::tuplepack::Schema>::to_record(self))
            }
        }

        impl ::tuplepack::FromValue for #ident {
            fn from_value(
                value: ::tuplepack::Value,
            ) -> ::core::result::Result<Self, ::tuplepack::ValueError> {
                match value {
                    ::tuplepack::Value::Record(record) => {
                        <Self as ::tuplepack::Schema>::from_record(record)
                    }
                    other => ::core::result::Result::Err(
                        ::tuplepack::ValueError::mismatch("record", &other),
                    ),
                }
            }
        }
    })
}

/// Parse `#[schema(name = "...")]` on the struct.
fn parse_struct_attrs(input: &DeriveInput) -> syn::Result<Option<String>> {
    let mut name = None;
    for attr in &input.attrs {
        if !attr.path().is_ident("schema") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                let lit: LitStr = meta.value()?.parse()?;
                if lit.value().is_empty() {
                    return Err(meta.error("schema name must not be empty"));
                }
                name = Some(lit.value());
                Ok(())
            } else {
                Err(meta.error("unsupported schema attribute, expected `name`"))
            }
        })?;
    }
    Ok(name)
}

/// Parse `#[schema(index = N)]` on a field.
fn parse_field_attrs(field: &syn::Field) -> syn::Result<Option<(i64, proc_macro2::Span)>> {
    let mut index = None;
    for attr in &field.attrs {
        if !attr.path().is_ident("schema") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("index") {
                let lit: LitInt = meta.value()?.parse()?;
                index = Some((lit.base10_parse::<i64>()?, lit.span()));
                Ok(())
            } else {
                Err(meta.error("unsupported field attribute, expected `index`"))
            }
        })?;
    }
    Ok(index)
}
