//! Derive macro for depgraph-di
//!
//! `#[derive(Provide)]` generates a `depgraph_di::Provide` implementation
//! from a struct's named fields: every field becomes a factory parameter of
//! the same name, and the constructor reads each field back out of the
//! resolved arguments.
//!
//! # Example
//!
//! ```rust,ignore
//! use depgraph_di::{ContainerBuilder, Provide, Scope};
//! use std::sync::Arc;
//!
//! struct Config { url: String }
//!
//! #[derive(Provide)]
//! struct Database {
//!     // Dependency on Config
//!     config: Arc<Config>,
//!     // Resolved through whatever is registered under the name "Pool"
//!     #[inject(name = "Pool")]
//!     pool: Arc<ConnectionPool>,
//!     // Supplied as a fixed argument, cloned out
//!     timeout_ms: u64,
//!     // Not a parameter; Default::default()
//!     #[inject(skip)]
//!     queries: AtomicU64,
//! }
//!
//! let mut builder = ContainerBuilder::new();
//! builder.provide::<Database>(Scope::Singleton)?;
//! ```

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Attribute, Data, DeriveInput, Fields, LitStr, Type, parse_macro_input};

/// Derive `depgraph_di::Provide`.
///
/// # Field rules
///
/// - `Arc<T>` is a dependency on `T`, handed over as the shared `Arc`.
/// - Any other type `F` is a parameter typed `F`, cloned out of the
///   arguments (so `F: Clone`). Usually fixed at registration.
/// - `#[inject(name = "X")]` types the parameter as a forward reference
///   to `X` instead.
/// - `#[inject(skip)]` leaves the field out of the signature and fills it
///   with `Default::default()`.
#[proc_macro_derive(Provide, attributes(inject))]
pub fn derive_provide(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand_provide(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand_provide(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    input,
                    "Provide can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                input,
                "Provide can only be derived for structs",
            ));
        }
    };

    let mut params = Vec::new();
    let mut field_inits = Vec::new();

    for field in fields {
        let Some(field_name) = field.ident.as_ref() else {
            return Err(syn::Error::new_spanned(field, "expected a named field"));
        };
        let field_type = &field.ty;
        let param_name = field_name.to_string();

        let attr = parse_inject_attr(&field.attrs)?;

        if attr.skip {
            field_inits.push(quote! {
                #field_name: ::std::default::Default::default()
            });
            continue;
        }

        let arc_inner = extract_arc_inner_type(field_type);

        let param_type = match (&attr.name, arc_inner) {
            (Some(forward), _) => quote! { ::depgraph_di::TypeKey::forward(#forward) },
            (None, Some(inner)) => quote! { ::depgraph_di::TypeKey::of::<#inner>() },
            (None, None) => quote! { ::depgraph_di::TypeKey::of::<#field_type>() },
        };
        params.push(quote! { .param(#param_name, #param_type) });

        let init = match arc_inner {
            Some(inner) => quote! { args.get::<#inner>(#param_name)? },
            None => quote! { args.cloned::<#field_type>(#param_name)? },
        };
        field_inits.push(quote! { #field_name: #init });
    }

    Ok(quote! {
        impl #impl_generics ::depgraph_di::Provide for #name #ty_generics #where_clause {
            fn signature() -> ::depgraph_di::Signature {
                ::depgraph_di::Signature::new() #(#params)*
            }

            fn provide(args: &::depgraph_di::Args) -> ::depgraph_di::Result<Self> {
                ::std::result::Result::Ok(Self {
                    #(#field_inits),*
                })
            }
        }
    })
}

/// Parsed `#[inject(...)]` options of one field
#[derive(Default)]
struct InjectAttr {
    name: Option<LitStr>,
    skip: bool,
}

fn parse_inject_attr(attrs: &[Attribute]) -> syn::Result<InjectAttr> {
    let mut parsed = InjectAttr::default();

    for attr in attrs.iter().filter(|attr| attr.path().is_ident("inject")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                parsed.name = Some(meta.value()?.parse()?);
                Ok(())
            } else if meta.path.is_ident("skip") {
                parsed.skip = true;
                Ok(())
            } else {
                Err(meta.error("expected `name = \"...\"` or `skip`"))
            }
        })?;
    }

    if parsed.skip {
        if let Some(name) = &parsed.name {
            return Err(syn::Error::new_spanned(
                name,
                "a skipped field cannot also be named",
            ));
        }
    }

    Ok(parsed)
}

/// Extract T from Arc<T>
fn extract_arc_inner_type(ty: &Type) -> Option<&Type> {
    let Type::Path(type_path) = ty else {
        return None;
    };
    let segment = type_path.path.segments.last()?;
    if segment.ident != "Arc" {
        return None;
    }
    match &segment.arguments {
        syn::PathArguments::AngleBracketed(args) => match args.args.first()? {
            syn::GenericArgument::Type(inner) => Some(inner),
            _ => None,
        },
        _ => None,
    }
}
