//! Procedural macros for the `dddlib` domain library.
//!
//! `#[derive(Entity)]` inspects a struct and generates its identity contract:
//! - `Identifiable` from the field marked `#[entity(id)]`;
//! - `PartialEq`, `Eq` and `Hash` over the fields marked `#[entity(key)]`;
//! - the `Entity` impl itself.
//!
//! Equality deliberately ignores the id field, so a transient entity and its
//! persisted copy compare equal.

use proc_macro::TokenStream;
use quote::quote;
use syn::{
    parenthesized, parse_macro_input, Data, DeriveInput, Fields, Ident, LitInt, Token, Type,
};

// --- Helper Functions for Parsing ---

/// Helper to check if a type is an `Option<T>`.
fn is_option(ty: &Type) -> bool {
    get_option_inner(ty).is_some()
}

/// Helper to get the inner type of an `Option<T>`.
fn get_option_inner(ty: &Type) -> Option<&Type> {
    if let Type::Path(type_path) = ty {
        if type_path.qself.is_some() {
            return None;
        }
        let segment = type_path.path.segments.last()?;
        if segment.ident != "Option" {
            return None;
        }
        if let syn::PathArguments::AngleBracketed(args) = &segment.arguments {
            if let Some(syn::GenericArgument::Type(inner_ty)) = args.args.first() {
                return Some(inner_ty);
            }
        }
    }
    None
}

/// Holds parsed metadata about a single struct field.
struct FieldMetadata {
    ident: Ident,
    ty: Type,
    is_id: bool,
    is_key: bool,
}

/// Parses all named fields from a `DeriveInput` struct.
fn parse_field_metadata(input: &DeriveInput) -> Vec<FieldMetadata> {
    let fields = match &input.data {
        Data::Struct(s) => match &s.fields {
            Fields::Named(named) => named,
            _ => panic!("#[derive(Entity)] only supports structs with named fields."),
        },
        _ => panic!("#[derive(Entity)] can only be used on structs."),
    };

    fields
        .named
        .iter()
        .map(|field| {
            let ident = field
                .ident
                .clone()
                .expect("named fields always carry an ident");
            let mut is_id = false;
            let mut is_key = false;

            for attr in &field.attrs {
                if !attr.path().is_ident("entity") {
                    continue;
                }
                attr.parse_nested_meta(|meta| {
                    if meta.path.is_ident("id") {
                        is_id = true;
                        Ok(())
                    } else if meta.path.is_ident("key") {
                        is_key = true;
                        Ok(())
                    } else {
                        Err(meta.error("expected `id` or `key`"))
                    }
                })
                .expect("Invalid #[entity(...)] field attribute. Use #[entity(id)] or #[entity(key)].");
            }
            FieldMetadata {
                ident,
                ty: field.ty.clone(),
                is_id,
                is_key,
            }
        })
        .collect()
}

/// Parses `#[entity(hash_seeds(initial, multiplier))]` on the struct, if present.
fn parse_hash_seeds(input: &DeriveInput) -> Option<(i32, i32)> {
    let mut seeds = None;
    for attr in &input.attrs {
        if !attr.path().is_ident("entity") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("hash_seeds") {
                let content;
                parenthesized!(content in meta.input);
                let initial: LitInt = content.parse()?;
                content.parse::<Token![,]>()?;
                let multiplier: LitInt = content.parse()?;
                seeds = Some((initial.base10_parse()?, multiplier.base10_parse()?));
                Ok(())
            } else {
                Err(meta.error("expected `hash_seeds(initial, multiplier)`"))
            }
        })
        .expect("Invalid #[entity(...)] struct attribute. Supported: #[entity(hash_seeds(17, 37))].");
    }
    seeds
}

// --- `Entity` derive macro ---

#[proc_macro_derive(Entity, attributes(entity))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let struct_name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let fields_metadata = parse_field_metadata(&input);

    // --- Validate id / key markers ---
    let id_count = fields_metadata.iter().filter(|f| f.is_id).count();
    if id_count == 0 {
        panic!("A field must be marked with #[entity(id)]. Hint: mark the persistence identifier, usually `id: Option<i64>`.");
    } else if id_count > 1 {
        panic!("Exactly one field must be marked with #[entity(id)] (found {}). Remove extra #[entity(id)] attributes.", id_count);
    }
    if let Some(f) = fields_metadata.iter().find(|f| f.is_id && f.is_key) {
        panic!("Field `{}` cannot be both #[entity(id)] and #[entity(key)]: equality must not depend on the persistence identifier.", f.ident);
    }
    let key_fields: Vec<_> = fields_metadata.iter().filter(|f| f.is_key).collect();
    if key_fields.is_empty() {
        panic!("#[derive(Entity)] needs at least one business-key field marked #[entity(key)]. Hint: pick the fields that identify `{}` before it is saved.", struct_name);
    }

    // --- Implement `Identifiable` ---
    let id_field = fields_metadata
        .iter()
        .find(|f| f.is_id)
        .expect("unreachable: validated id_count == 1");
    let id_ident = &id_field.ident;
    let id_ty = &id_field.ty;
    let key_ty = get_option_inner(id_ty).unwrap_or(id_ty);

    let id_accessor = if is_option(id_ty) {
        quote! { ::core::clone::Clone::clone(&self.#id_ident) }
    } else {
        quote! { ::core::option::Option::Some(::core::clone::Clone::clone(&self.#id_ident)) }
    };

    let identifiable_impl = quote! {
        impl #impl_generics ::dddlib_core::Identifiable for #struct_name #ty_generics #where_clause {
            type Key = #key_ty;
            fn id(&self) -> ::core::option::Option<Self::Key> {
                #id_accessor
            }
        }
    };

    // --- Implement `PartialEq`, `Eq`, `Hash` over the business key ---
    let key_idents: Vec<_> = key_fields.iter().map(|f| &f.ident).collect();

    let equality_impl = quote! {
        impl #impl_generics ::core::cmp::PartialEq for #struct_name #ty_generics #where_clause {
            fn eq(&self, other: &Self) -> bool {
                true #(&& self.#key_idents == other.#key_idents)*
            }
        }

        impl #impl_generics ::core::cmp::Eq for #struct_name #ty_generics #where_clause {}

        impl #impl_generics ::core::hash::Hash for #struct_name #ty_generics #where_clause {
            fn hash<__H: ::core::hash::Hasher>(&self, state: &mut __H) {
                #(::core::hash::Hash::hash(&self.#key_idents, state);)*
            }
        }
    };

    // --- Implement `Entity` ---
    let hash_code_override = match parse_hash_seeds(&input) {
        Some((initial, multiplier)) => {
            if initial % 2 == 0 || multiplier % 2 == 0 {
                panic!("#[entity(hash_seeds({}, {}))]: both seeds must be odd.", initial, multiplier);
            }
            quote! {
                fn hash_code(&self) -> i32 {
                    ::dddlib_core::HashCodeBuilder::new(#initial, #multiplier)
                        #(.append(&self.#key_idents))*
                        .to_hash_code()
                }
            }
        }
        None => quote! {},
    };

    let entity_impl = quote! {
        impl #impl_generics ::dddlib_core::Entity for #struct_name #ty_generics #where_clause {
            #hash_code_override
        }
    };

    let expanded = quote! {
        #identifiable_impl
        #equality_impl
        #entity_impl
    };

    TokenStream::from(expanded)
}
