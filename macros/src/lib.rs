//! Derive [Reflect](https://docs.rs/packetwire-codec) for structs and fieldless enums.

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

mod attrs;
mod expand;

/// Describe a type to the serialization engine.
///
/// Structs become aggregates: every field not marked `#[reflect(skip)]` is
/// eligible, in declaration order, and a constructor taking every eligible
/// field is generated. Fieldless enums are written by member name.
///
/// Container attributes:
/// - `#[reflect(default)]`: register `Default::default` for field-by-field
///   assignment.
/// - `#[reflect(skip_constructor)]`: do not generate the all-fields
///   constructor (requires `default`).
/// - `#[reflect(custom)]`: the type implements `CustomSerializable`.
///
/// Field attributes:
/// - `#[reflect(skip)]`: not serialized; rebuilt with `Default::default`.
/// - `#[reflect(nullable)]`: the field may be absent.
/// - `#[reflect(tag = "name")]`: attach a tag for user resolvers.
/// - `#[reflect(streamable = "Type")]`: element type of the sequence.
///
/// Variant attributes:
/// - `#[reflect(rename = "NAME")]`: the name written to the wire.
#[proc_macro_derive(Reflect, attributes(reflect))]
pub fn derive_reflect(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand::derive(&input)
        .unwrap_or_else(|err| err.to_compile_error())
        .into()
}
