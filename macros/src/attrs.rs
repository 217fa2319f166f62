use syn::{spanned::Spanned, Attribute, Error, Lit, LitStr, Meta, NestedMeta, Type};

/// Options set on the type itself.
#[derive(Default)]
pub struct Container {
    pub default: bool,
    pub skip_constructor: bool,
    pub custom: bool,
}

/// A marker requested on a field.
pub enum Marker {
    Nullable,
    Tag(LitStr),
    Streamable(Type),
}

#[derive(Default)]
pub struct Field {
    pub skip: bool,
    pub markers: Vec<Marker>,
}

#[derive(Default)]
pub struct Variant {
    pub rename: Option<LitStr>,
}

/// Every `name` or `name = "value"` item inside `#[reflect(...)]`.
fn items(attrs: &[Attribute]) -> Result<Vec<Meta>, Error> {
    let mut items = Vec::new();
    for attr in attrs.iter().filter(|attr| attr.path.is_ident("reflect")) {
        let Meta::List(list) = attr.parse_meta()? else {
            return Err(Error::new(attr.span(), "expected #[reflect(...)]"));
        };
        for nested in list.nested {
            match nested {
                NestedMeta::Meta(meta) => items.push(meta),
                NestedMeta::Lit(lit) => {
                    return Err(Error::new(lit.span(), "unexpected literal"));
                }
            }
        }
    }
    Ok(items)
}

fn string(meta: &Meta) -> Result<LitStr, Error> {
    match meta {
        Meta::NameValue(nv) => match &nv.lit {
            Lit::Str(s) => Ok(s.clone()),
            lit => Err(Error::new(lit.span(), "expected a string")),
        },
        _ => Err(Error::new(meta.span(), "expected `name = \"...\"`")),
    }
}

fn unknown(meta: &Meta) -> Error {
    Error::new(meta.span(), "unknown reflect attribute")
}

impl Container {
    pub fn parse(attrs: &[Attribute]) -> Result<Self, Error> {
        let mut container = Self::default();
        for meta in items(attrs)? {
            match &meta {
                Meta::Path(p) if p.is_ident("default") => container.default = true,
                Meta::Path(p) if p.is_ident("skip_constructor") => {
                    container.skip_constructor = true
                }
                Meta::Path(p) if p.is_ident("custom") => container.custom = true,
                _ => return Err(unknown(&meta)),
            }
        }
        Ok(container)
    }
}

impl Field {
    pub fn parse(attrs: &[Attribute]) -> Result<Self, Error> {
        let mut field = Self::default();
        for meta in items(attrs)? {
            match &meta {
                Meta::Path(p) if p.is_ident("skip") => field.skip = true,
                Meta::Path(p) if p.is_ident("nullable") => field.markers.push(Marker::Nullable),
                Meta::NameValue(nv) if nv.path.is_ident("tag") => {
                    field.markers.push(Marker::Tag(string(&meta)?))
                }
                Meta::NameValue(nv) if nv.path.is_ident("streamable") => {
                    let ty = string(&meta)?.parse::<Type>()?;
                    field.markers.push(Marker::Streamable(ty))
                }
                _ => return Err(unknown(&meta)),
            }
        }
        Ok(field)
    }
}

impl Variant {
    pub fn parse(attrs: &[Attribute]) -> Result<Self, Error> {
        let mut variant = Self::default();
        for meta in items(attrs)? {
            match &meta {
                Meta::NameValue(nv) if nv.path.is_ident("rename") => {
                    variant.rename = Some(string(&meta)?)
                }
                _ => return Err(unknown(&meta)),
            }
        }
        Ok(variant)
    }
}
