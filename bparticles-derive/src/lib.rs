//! Derive macros for the bparticles block storage engine.
//!
//! This crate provides one derive macro:
//!
//! - [`Particle`] - Maps a plain Rust struct onto a block attribute schema
//!
//! # Usage
//!
//! The macro is re-exported from the main `bparticles` crate. You don't need
//! to add this crate directly:
//!
//! ```ignore
//! use bparticles::prelude::*;
//!
//! #[derive(Particle, Clone)]
//! struct Spark {
//!     position: Vec3,
//!     velocity: Vec3,
//!     age: f32,
//! }
//! ```
//!
//! # The Particle Macro
//!
//! `#[derive(Particle)]` implements `ParticleTrait`, which lets a struct be
//! written into (and read back from) one slot of a block's attribute buffers.
//! It generates:
//!
//! - `SCALARS` / `VECTORS` constants listing the attribute names
//! - `write_to()` for struct → buffer slot
//! - `read_from()` for buffer slot → struct
//!
//! ## Field Types
//!
//! - `f32` fields become scalar attributes
//! - `Vec3` fields become 3-vector attributes
//!
//! ## Attribute Names
//!
//! Field names are converted to PascalCase (`position` → `Position`,
//! `spawn_time` → `SpawnTime`). Override with `#[attribute("Name")]`.

use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Fields, LitStr, Type};

/// Derive macro for particle structs.
///
/// # Generated Code
///
/// For a particle `Spark`, the macro generates:
///
/// ```ignore
/// impl ParticleTrait for Spark {
///     const SCALARS: &'static [&'static str] = &["Age"];
///     const VECTORS: &'static [&'static str] = &["Position", "Velocity"];
///
///     fn write_to(&self, buffers: &mut AttributeBuffers, index: usize) -> Result<()> { ... }
///     fn read_from(buffers: &AttributeBuffers, index: usize) -> Result<Self> { ... }
/// }
/// ```
///
/// # Example
///
/// ```ignore
/// #[derive(Particle, Clone)]
/// struct Ember {
///     position: Vec3,
///     velocity: Vec3,
///     #[attribute("Heat")]
///     temperature: f32,
/// }
/// ```
///
/// # Panics
///
/// The macro panics at compile time if:
/// - Applied to an enum instead of a struct
/// - Struct uses tuple fields instead of named fields
/// - Any field has a type other than `f32` or `Vec3`
/// - `#[attribute(...)]` does not contain a single string literal
#[proc_macro_derive(Particle, attributes(attribute))]
pub fn derive_particle(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => panic!("Particle derive only supports structs with named fields"),
        },
        _ => panic!("Particle derive only supports structs"),
    };

    let mut scalar_names = Vec::new();
    let mut vector_names = Vec::new();
    let mut writes = Vec::new();
    let mut reads = Vec::new();

    for field in fields.iter() {
        let field_name = match field.ident.as_ref() {
            Some(ident) => ident,
            None => panic!("Particle derive only supports structs with named fields"),
        };
        let attribute_name = attribute_name(field)
            .unwrap_or_else(|| to_pascal_case(&field_name.to_string()));

        match attribute_kind(&field.ty) {
            AttributeKind::Scalar => {
                writes.push(quote! {
                    buffers.set_scalar(#attribute_name, index, self.#field_name)?;
                });
                reads.push(quote! {
                    #field_name: buffers.scalar_at(#attribute_name, index)?
                });
                scalar_names.push(attribute_name);
            }
            AttributeKind::Vector => {
                writes.push(quote! {
                    buffers.set_vector(#attribute_name, index, self.#field_name)?;
                });
                reads.push(quote! {
                    #field_name: buffers.vector_at(#attribute_name, index)?
                });
                vector_names.push(attribute_name);
            }
        }
    }

    let expanded = quote! {
        impl ::bparticles::ParticleTrait for #name {
            const SCALARS: &'static [&'static str] = &[#(#scalar_names),*];
            const VECTORS: &'static [&'static str] = &[#(#vector_names),*];

            fn write_to(
                &self,
                buffers: &mut ::bparticles::AttributeBuffers,
                index: usize,
            ) -> ::bparticles::Result<()> {
                #(#writes)*
                Ok(())
            }

            fn read_from(
                buffers: &::bparticles::AttributeBuffers,
                index: usize,
            ) -> ::bparticles::Result<Self> {
                Ok(Self {
                    #(#reads),*
                })
            }
        }
    };

    TokenStream::from(expanded)
}

enum AttributeKind {
    Scalar,
    Vector,
}

/// Classify a field type as a scalar or vector attribute.
fn attribute_kind(ty: &Type) -> AttributeKind {
    let type_str = quote!(#ty).to_string().replace(' ', "");

    match type_str.as_str() {
        "f32" => AttributeKind::Scalar,
        "Vec3" | "glam::Vec3" | "bparticles::Vec3" => AttributeKind::Vector,
        _ => panic!(
            "Unsupported type in Particle struct: {} (expected f32 or Vec3)",
            type_str
        ),
    }
}

/// Read an explicit `#[attribute("Name")]` override, if present.
fn attribute_name(field: &syn::Field) -> Option<String> {
    field
        .attrs
        .iter()
        .find(|attr| attr.path().is_ident("attribute"))
        .map(|attr| match attr.parse_args::<LitStr>() {
            Ok(lit) => lit.value(),
            Err(_) => panic!("#[attribute(...)] expects a single string literal"),
        })
}

/// `spawn_time` → `SpawnTime`.
fn to_pascal_case(name: &str) -> String {
    name.split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}
