//! Structure of aggregate types: fields, constructors and accessors.
//!
//! An [AggregateInfo] is usually generated by `#[derive(Reflect)]`, but can be
//! written by hand with [AggregateInfo::builder]:
//!
//! ```
//! use packetwire_codec::{AggregateInfo, Reflect, TypeInfo};
//!
//! #[derive(Debug, PartialEq)]
//! struct Pair {
//!     a: i32,
//!     b: String,
//! }
//!
//! impl Reflect for Pair {
//!     fn type_info() -> TypeInfo {
//!         AggregateInfo::builder::<Self>()
//!             .field::<i32>("a", |p| &p.a, |p, v| p.a = v)
//!             .field::<String>("b", |p| &p.b, |p, v| p.b = v)
//!             .constructor(|args| Ok(Pair { a: args.take()?, b: args.take()? }))
//!             .build()
//!     }
//! }
//!
//! let bytes = packetwire_codec::encode(&Pair { a: 1, b: "x".into() }).unwrap();
//! let pair: Pair = packetwire_codec::decode(bytes).unwrap();
//! assert_eq!(pair, Pair { a: 1, b: "x".into() });
//! ```

use crate::{reflect::view, take, AnyValue, Error, Kind, Marker, Reflect, TypeInfo, TypeInfoFn};
use std::{
    any::{type_name, Any},
    marker::PhantomData,
    sync::Arc,
};

trait Access: Send + Sync {
    fn get<'a>(&self, owner: &'a dyn Any) -> Result<&'a dyn Any, Error>;
    fn set(&self, owner: &mut dyn Any, value: AnyValue) -> Result<(), Error>;
}

struct FieldAccess<T, F> {
    get: fn(&T) -> &F,
    set: fn(&mut T, F),
}

impl<T: Any, F: Any> Access for FieldAccess<T, F> {
    fn get<'a>(&self, owner: &'a dyn Any) -> Result<&'a dyn Any, Error> {
        let field: &'a dyn Any = (self.get)(view::<T>(owner)?);
        Ok(field)
    }

    fn set(&self, owner: &mut dyn Any, value: AnyValue) -> Result<(), Error> {
        let owner = owner
            .downcast_mut::<T>()
            .ok_or(Error::TypeMismatch(type_name::<T>()))?;
        (self.set)(owner, take::<F>(value)?);
        Ok(())
    }
}

/// An eligible field of an aggregate.
#[derive(Clone)]
pub struct FieldInfo {
    name: &'static str,
    ty: TypeInfoFn,
    markers: Vec<Marker>,
    access: Arc<dyn Access>,
}

impl FieldInfo {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn type_info(&self) -> TypeInfo {
        (self.ty)()
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    /// Borrows this field out of its owner.
    pub fn get<'a>(&self, owner: &'a dyn Any) -> Result<&'a dyn Any, Error> {
        self.access.get(owner)
    }

    /// Assigns a decoded value to this field of its owner.
    pub fn set(&self, owner: &mut dyn Any, value: AnyValue) -> Result<(), Error> {
        self.access.set(owner, value)
    }

    fn param(&self) -> Param {
        Param {
            name: self.name,
            ty: self.ty,
            markers: self.markers.clone(),
        }
    }
}

/// A constructor parameter.
#[derive(Clone)]
pub struct Param {
    name: &'static str,
    ty: TypeInfoFn,
    markers: Vec<Marker>,
}

impl Param {
    pub fn new<T: Reflect>(name: &'static str) -> Self {
        Self {
            name,
            ty: T::type_info,
            markers: Vec::new(),
        }
    }

    pub fn marker(mut self, marker: Marker) -> Self {
        self.markers.push(marker);
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn type_info(&self) -> TypeInfo {
        (self.ty)()
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }
}

/// Decoded constructor arguments, consumed in parameter order.
pub struct Args {
    values: std::vec::IntoIter<AnyValue>,
}

impl Args {
    pub(crate) fn new(values: Vec<AnyValue>) -> Self {
        Self {
            values: values.into_iter(),
        }
    }

    /// Takes the next argument as a `T`.
    pub fn take<T: Any>(&mut self) -> Result<T, Error> {
        let value = self
            .values
            .next()
            .ok_or(Error::TypeMismatch(type_name::<T>()))?;
        take(value)
    }
}

type Build = Arc<dyn Fn(&mut Args) -> Result<AnyValue, Error> + Send + Sync>;
type Instantiate = Arc<dyn Fn() -> AnyValue + Send + Sync>;

/// A constructor taking every parameter at once.
#[derive(Clone)]
pub struct Constructor {
    params: Vec<Param>,
    build: Build,
}

impl Constructor {
    pub fn params(&self) -> &[Param] {
        &self.params
    }

    /// Invokes the constructor with decoded arguments, in parameter order.
    pub fn invoke(&self, args: Vec<AnyValue>) -> Result<AnyValue, Error> {
        (self.build)(&mut Args::new(args))
    }
}

/// How an aggregate is rebuilt while decoding.
pub enum Strategy<'a> {
    /// Decode every parameter, then call the constructor.
    Construct(usize, &'a Constructor),
    /// Instantiate with no arguments, then assign each field.
    Assign(&'a (dyn Fn() -> AnyValue + Send + Sync)),
}

/// Fields and constructors of an aggregate type.
#[derive(Clone)]
pub struct AggregateInfo {
    fields: Vec<FieldInfo>,
    constructors: Vec<Constructor>,
    instantiate: Option<Instantiate>,
}

impl AggregateInfo {
    /// Starts describing the aggregate `T`.
    pub fn builder<T: Any>() -> AggregateBuilder<T> {
        AggregateBuilder {
            fields: Vec::new(),
            constructors: Vec::new(),
            instantiate: None,
            _phantom: PhantomData,
        }
    }

    /// Eligible fields in declaration order.
    pub fn fields(&self) -> &[FieldInfo] {
        &self.fields
    }

    pub fn constructors(&self) -> &[Constructor] {
        &self.constructors
    }

    /// Picks the decode strategy from the static shape alone.
    ///
    /// The first constructor whose parameter count equals the field count wins;
    /// otherwise the zero-argument constructor is used.
    pub fn strategy(&self) -> Option<Strategy<'_>> {
        let eligible = self.fields.len();
        if let Some((index, constructor)) = self
            .constructors
            .iter()
            .enumerate()
            .find(|(_, c)| c.params.len() == eligible)
        {
            return Some(Strategy::Construct(index, constructor));
        }
        self.instantiate.as_deref().map(Strategy::Assign)
    }
}

/// Builds the [TypeInfo] of an aggregate `T`.
pub struct AggregateBuilder<T> {
    fields: Vec<FieldInfo>,
    constructors: Vec<(Option<Vec<Param>>, Build)>,
    instantiate: Option<Instantiate>,
    _phantom: PhantomData<fn() -> T>,
}

impl<T: Any> AggregateBuilder<T> {
    /// Adds an eligible field with its accessors.
    pub fn field<F: Reflect>(
        mut self,
        name: &'static str,
        get: fn(&T) -> &F,
        set: fn(&mut T, F),
    ) -> Self {
        self.fields.push(FieldInfo {
            name,
            ty: F::type_info,
            markers: Vec::new(),
            access: Arc::new(FieldAccess { get, set }),
        });
        self
    }

    /// Attaches a marker to the most recently added field.
    pub fn marker(mut self, marker: Marker) -> Self {
        if let Some(field) = self.fields.last_mut() {
            field.markers.push(marker);
        }
        self
    }

    /// Adds a constructor whose parameters mirror the fields.
    pub fn constructor(mut self, build: fn(&mut Args) -> Result<T, Error>) -> Self {
        self.constructors.push((None, Self::erase(build)));
        self
    }

    /// Adds a constructor with explicit parameters.
    pub fn constructor_with(
        mut self,
        params: Vec<Param>,
        build: fn(&mut Args) -> Result<T, Error>,
    ) -> Self {
        self.constructors.push((Some(params), Self::erase(build)));
        self
    }

    /// Adds the zero-argument constructor used for field-by-field assignment.
    pub fn default_constructor(mut self, instantiate: fn() -> T) -> Self {
        self.instantiate = Some(Arc::new(move || Box::new(instantiate()) as AnyValue));
        self
    }

    fn erase(build: fn(&mut Args) -> Result<T, Error>) -> Build {
        Arc::new(move |args: &mut Args| build(args).map(|value| Box::new(value) as AnyValue))
    }

    /// Finishes the description as the [TypeInfo] of `T`.
    pub fn build(self) -> TypeInfo {
        let mirrored: Vec<Param> = self.fields.iter().map(FieldInfo::param).collect();
        let constructors = self
            .constructors
            .into_iter()
            .map(|(params, build)| Constructor {
                params: params.unwrap_or_else(|| mirrored.clone()),
                build,
            })
            .collect();
        let info = AggregateInfo {
            fields: self.fields,
            constructors,
            instantiate: self.instantiate,
        };
        TypeInfo::new::<T>(Kind::Aggregate(Arc::new(info)))
    }
}
