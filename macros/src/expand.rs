use crate::attrs::{Container, Field, Marker, Variant};
use proc_macro2::{Span, TokenStream};
use quote::quote;
use syn::{
    parse_quote, spanned::Spanned, Data, DataEnum, DeriveInput, Error, Fields, GenericParam,
    Generics, Index, LitStr, Member,
};

pub fn derive(input: &DeriveInput) -> Result<TokenStream, Error> {
    let container = Container::parse(&input.attrs)?;
    if let Some(lifetime) = input.generics.lifetimes().next() {
        return Err(Error::new(
            lifetime.span(),
            "Reflect cannot be derived for types with lifetime parameters",
        ));
    }

    let body = if container.custom {
        quote! { ::packetwire_codec::TypeInfo::custom::<Self>() }
    } else {
        match &input.data {
            Data::Struct(data) => aggregate(&container, &data.fields)?,
            Data::Enum(data) => return enumeration(input, data),
            Data::Union(data) => {
                return Err(Error::new(
                    data.union_token.span(),
                    "Reflect cannot be derived for unions",
                ))
            }
        }
    };

    let name = &input.ident;
    let generics = bounded(&input.generics);
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();
    Ok(quote! {
        impl #impl_generics ::packetwire_codec::Reflect for #name #ty_generics #where_clause {
            fn type_info() -> ::packetwire_codec::TypeInfo {
                #body
            }
        }
    })
}

/// Adds `T: Reflect` to every type parameter.
fn bounded(generics: &Generics) -> Generics {
    let mut generics = generics.clone();
    for param in &mut generics.params {
        if let GenericParam::Type(ty) = param {
            ty.bounds.push(parse_quote!(::packetwire_codec::Reflect));
        }
    }
    generics
}

fn marker(marker: &Marker) -> TokenStream {
    match marker {
        Marker::Nullable => quote! { ::packetwire_codec::Marker::Nullable },
        Marker::Tag(tag) => quote! { ::packetwire_codec::Marker::Tag(#tag) },
        Marker::Streamable(ty) => quote! {
            ::packetwire_codec::Marker::Streamable(<#ty as ::packetwire_codec::Reflect>::type_info)
        },
    }
}

fn aggregate(container: &Container, fields: &Fields) -> Result<TokenStream, Error> {
    if container.skip_constructor && !container.default {
        return Err(Error::new(
            Span::call_site(),
            "`skip_constructor` requires `default`",
        ));
    }

    let mut registered = Vec::new();
    let mut initializers = Vec::new();
    for (index, field) in fields.iter().enumerate() {
        let attrs = Field::parse(&field.attrs)?;
        let member = match &field.ident {
            Some(ident) => Member::Named(ident.clone()),
            None => Member::Unnamed(Index::from(index)),
        };
        if attrs.skip {
            initializers.push(quote! { #member: ::core::default::Default::default() });
            continue;
        }

        let ty = &field.ty;
        let label = match &field.ident {
            Some(ident) => LitStr::new(&ident.to_string(), ident.span()),
            None => LitStr::new(&index.to_string(), field.span()),
        };
        let markers = attrs.markers.iter().map(marker);
        registered.push(quote! {
            .field::<#ty>(#label, |v| &v.#member, |v, x| v.#member = x)
            #(.marker(#markers))*
        });
        initializers.push(quote! { #member: args.take()? });
    }

    let constructor = if container.skip_constructor {
        quote! {}
    } else {
        let args = if registered.is_empty() {
            quote! { _ }
        } else {
            quote! { args }
        };
        quote! { .constructor(|#args| ::core::result::Result::Ok(Self { #(#initializers),* })) }
    };
    let default = if container.default {
        quote! { .default_constructor(<Self as ::core::default::Default>::default) }
    } else {
        quote! {}
    };
    Ok(quote! {
        ::packetwire_codec::AggregateInfo::builder::<Self>()
            #(#registered)*
            #constructor
            #default
            .build()
    })
}

fn enumeration(input: &DeriveInput, data: &DataEnum) -> Result<TokenStream, Error> {
    if !input.generics.params.is_empty() {
        return Err(Error::new(
            input.generics.span(),
            "Reflect cannot be derived for generic enums",
        ));
    }
    if data.variants.is_empty() {
        return Err(Error::new(
            input.ident.span(),
            "Reflect cannot be derived for enums without members",
        ));
    }

    let mut idents = Vec::new();
    let mut labels = Vec::new();
    for variant in &data.variants {
        if !matches!(variant.fields, Fields::Unit) {
            return Err(Error::new(
                variant.fields.span(),
                "Reflect can only be derived for enums without fields",
            ));
        }
        let attrs = Variant::parse(&variant.attrs)?;
        let label = attrs
            .rename
            .unwrap_or_else(|| LitStr::new(&variant.ident.to_string(), variant.ident.span()));
        if labels.iter().any(|l: &LitStr| l.value() == label.value()) {
            return Err(Error::new(label.span(), "duplicate member name"));
        }
        idents.push(&variant.ident);
        labels.push(label);
    }

    let name = &input.ident;
    Ok(quote! {
        impl ::packetwire_codec::WireEnum for #name {
            fn name(&self) -> &'static str {
                match self {
                    #(Self::#idents => #labels,)*
                }
            }

            fn from_name(name: &str) -> ::core::option::Option<Self> {
                match name {
                    #(#labels => ::core::option::Option::Some(Self::#idents),)*
                    _ => ::core::option::Option::None,
                }
            }
        }

        impl ::packetwire_codec::Reflect for #name {
            fn type_info() -> ::packetwire_codec::TypeInfo {
                ::packetwire_codec::TypeInfo::enumeration::<Self>()
            }
        }
    })
}
