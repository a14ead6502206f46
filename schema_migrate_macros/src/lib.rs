//! Derive macro for schema_migrate models
//!
//! `#[derive(SchemaModel)]` turns a struct with named fields into a
//! `ModelDefinition`, one column per field.
//!
//! ```ignore
//! #[derive(SchemaModel)]
//! #[schema(table = "users")]
//! struct User {
//!     #[schema(primary_key)]
//!     id: u32,
//!     #[schema(size = 100)]
//!     name: String,
//!     #[schema(unique_index)]
//!     student_no: Option<String>,
//! }
//! ```

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::ext::IdentExt;
use syn::{
    parse_macro_input, Attribute, Data, DeriveInput, Fields, GenericArgument, LitInt, LitStr,
    PathArguments, Type,
};

#[proc_macro_derive(SchemaModel, attributes(schema))]
pub fn derive_schema_model(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

#[derive(Default)]
struct FieldAttrs {
    column: Option<String>,
    primary_key: bool,
    unique: bool,
    index: Option<(Option<String>, bool)>,
    nullable: Option<bool>,
    size: Option<u32>,
    db_type: Option<String>,
    default: Option<String>,
    comment: Option<String>,
}

fn expand(input: DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    name,
                    "SchemaModel only supports structs with named fields",
                ))
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                name,
                "SchemaModel only supports structs",
            ))
        }
    };

    let table = parse_table(&input.attrs)?.map(|table| quote!(.table(#table)));

    let mut field_defs = Vec::with_capacity(fields.len());
    for field in fields {
        let attrs = parse_field_attrs(&field.attrs)?;
        let ident = field
            .ident
            .as_ref()
            .ok_or_else(|| syn::Error::new_spanned(field, "field without a name"))?;

        let column = attrs.column.unwrap_or_else(|| ident.unraw().to_string());
        let (inner, optional) = unwrap_option(&field.ty);
        let rust_type = quote!(#inner).to_string();

        let mut def = quote!(::schema_migrate::models::FieldDefinition::new(#column, #rust_type));
        if attrs.primary_key {
            def.extend(quote!(.primary_key()));
        }
        if attrs.unique {
            def.extend(quote!(.unique()));
        }
        if let Some(size) = attrs.size {
            def.extend(quote!(.size(#size)));
        }
        if let Some(db_type) = attrs.db_type {
            def.extend(quote!(.db_type(#db_type)));
        }
        // Explicit nullable/not_null wins over Option<T>
        match attrs.nullable {
            Some(nullable) => def.extend(quote!(.nullable(#nullable))),
            None if optional => def.extend(quote!(.nullable(true))),
            None => {}
        }
        if let Some(default) = attrs.default {
            def.extend(quote!(.default_value(#default)));
        }
        if let Some(comment) = attrs.comment {
            def.extend(quote!(.comment(#comment)));
        }
        if let Some((index_name, unique)) = attrs.index {
            let index_name = match index_name {
                Some(n) => quote!(::std::option::Option::Some(#n)),
                None => quote!(::std::option::Option::None),
            };
            def.extend(quote!(.index(#index_name, #unique)));
        }

        field_defs.push(quote!(.field(#def)));
    }

    let model_name = name.to_string();
    Ok(quote! {
        #[automatically_derived]
        impl #impl_generics ::schema_migrate::models::SchemaModel for #name #ty_generics #where_clause {
            fn model_definition() -> ::schema_migrate::models::ModelDefinition {
                ::schema_migrate::models::ModelDefinition::new(#model_name)
                    #table
                    #(#field_defs)*
            }
        }
    })
}

fn parse_table(attrs: &[Attribute]) -> syn::Result<Option<String>> {
    let mut table = None;
    for attr in attrs.iter().filter(|a| a.path().is_ident("schema")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("table") {
                table = Some(meta.value()?.parse::<LitStr>()?.value());
                Ok(())
            } else {
                Err(meta.error("unsupported struct attribute, expected `table = \"...\"`"))
            }
        })?;
    }
    Ok(table)
}

fn parse_field_attrs(attrs: &[Attribute]) -> syn::Result<FieldAttrs> {
    let mut out = FieldAttrs::default();

    for attr in attrs.iter().filter(|a| a.path().is_ident("schema")) {
        attr.parse_nested_meta(|meta| {
            let path = &meta.path;
            if path.is_ident("primary_key") {
                out.primary_key = true;
            } else if path.is_ident("unique") {
                out.unique = true;
            } else if path.is_ident("nullable") {
                out.nullable = Some(true);
            } else if path.is_ident("not_null") {
                out.nullable = Some(false);
            } else if path.is_ident("index") || path.is_ident("unique_index") {
                let unique = path.is_ident("unique_index");
                let name = if meta.input.peek(syn::Token![=]) {
                    Some(meta.value()?.parse::<LitStr>()?.value())
                } else {
                    None
                };
                out.index = Some((name, unique));
            } else if path.is_ident("size") {
                out.size = Some(meta.value()?.parse::<LitInt>()?.base10_parse()?);
            } else if path.is_ident("db_type") {
                out.db_type = Some(meta.value()?.parse::<LitStr>()?.value());
            } else if path.is_ident("default") {
                out.default = Some(meta.value()?.parse::<LitStr>()?.value());
            } else if path.is_ident("column") {
                out.column = Some(meta.value()?.parse::<LitStr>()?.value());
            } else if path.is_ident("comment") {
                out.comment = Some(meta.value()?.parse::<LitStr>()?.value());
            } else {
                return Err(meta.error("unsupported schema field attribute"));
            }
            Ok(())
        })?;
    }

    Ok(out)
}

/// `Option<T>` yields `(T, true)`, anything else `(ty, false)`
fn unwrap_option(ty: &Type) -> (&Type, bool) {
    if let Type::Path(type_path) = ty {
        if let Some(segment) = type_path.path.segments.last() {
            if segment.ident == "Option" {
                if let PathArguments::AngleBracketed(args) = &segment.arguments {
                    if let Some(GenericArgument::Type(inner)) = args.args.first() {
                        return (inner, true);
                    }
                }
            }
        }
    }
    (ty, false)
}
