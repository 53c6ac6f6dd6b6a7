//! `Decode` implementations for standard types.

use std::{
    collections::{BTreeMap, HashMap},
    hash::{BuildHasher, Hash},
    net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr},
    time::Duration,
};

use super::{ArrayNode, Decode, MapNode, Node, PointerNode, SliceNode, Unmarshaler};
use crate::{
    DescribeType,
    metadata::{Kind, RustType, ScalarKind, TypeMetadata},
    parsing::{parse_int, parse_uint},
    value::Value,
};

macro_rules! impl_scalar {
    ($($ty:ty: $kind:ident = $zero:expr),+ $(,)?) => {
        $(
        impl DescribeType for $ty {
            const TYPE: TypeMetadata = TypeMetadata::new(
                RustType::of::<$ty>(stringify!($ty)),
                Kind::Scalar(ScalarKind::$kind),
            );

            fn zero() -> Self {
                $zero
            }
        }

        impl Decode for $ty {
            fn node(&mut self) -> Node<'_> {
                Node::Scalar(self)
            }
        }
        )+
    };
}

impl_scalar!(
    bool: Bool = false,
    i8: Int = 0,
    i16: Int = 0,
    i32: Int = 0,
    i64: Int = 0,
    i128: Int = 0,
    isize: Int = 0,
    u8: Uint = 0,
    u16: Uint = 0,
    u32: Uint = 0,
    u64: Uint = 0,
    u128: Uint = 0,
    usize: Uint = 0,
    f32: Float = 0.0,
    f64: Float = 0.0,
    char: Char = '\0',
    String: String = String::new(),
    Duration: Duration = Duration::ZERO,
    IpAddr: Parsed = IpAddr::V4(Ipv4Addr::UNSPECIFIED),
    Ipv4Addr: Parsed = Ipv4Addr::UNSPECIFIED,
    Ipv6Addr: Parsed = Ipv6Addr::UNSPECIFIED,
    SocketAddr: Parsed = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0),
);

impl DescribeType for Value {
    const TYPE: TypeMetadata = TypeMetadata::new(RustType::of::<Self>("Value"), Kind::Interface);

    fn zero() -> Self {
        Self::Null
    }
}

impl Decode for Value {
    fn node(&mut self) -> Node<'_> {
        Node::Interface(self)
    }
}

impl<T: DescribeType> DescribeType for Option<T> {
    const TYPE: TypeMetadata = TypeMetadata::new(RustType::of::<Self>("Option"), Kind::Pointer)
        .with_unmarshal(T::TYPE.unmarshal);

    fn zero() -> Self {
        None
    }
}

impl<T: Decode + DescribeType> Decode for Option<T> {
    fn node(&mut self) -> Node<'_> {
        Node::Pointer(self)
    }

    fn unmarshaler(&mut self) -> Option<Unmarshaler<'_>> {
        // Only allocate if the pointee is going to decode itself.
        T::TYPE.unmarshal?;
        self.get_or_insert_with(T::zero).unmarshaler()
    }
}

impl<T: Decode + DescribeType> PointerNode for Option<T> {
    fn is_nil(&self) -> bool {
        self.is_none()
    }

    fn set_nil(&mut self) {
        *self = None;
    }

    fn pointee_mut(&mut self) -> &mut dyn Decode {
        self.get_or_insert_with(T::zero)
    }
}

impl<T: DescribeType> DescribeType for Box<T> {
    const TYPE: TypeMetadata = TypeMetadata::new(RustType::of::<Self>("Box"), Kind::Pointer)
        .with_unmarshal(T::TYPE.unmarshal);

    fn zero() -> Self {
        Box::new(T::zero())
    }
}

impl<T: Decode + DescribeType> Decode for Box<T> {
    fn node(&mut self) -> Node<'_> {
        Node::Pointer(self)
    }

    fn unmarshaler(&mut self) -> Option<Unmarshaler<'_>> {
        (**self).unmarshaler()
    }
}

impl<T: Decode + DescribeType> PointerNode for Box<T> {
    fn is_nil(&self) -> bool {
        false
    }

    fn set_nil(&mut self) {
        // Boxes are never nil
    }

    fn pointee_mut(&mut self) -> &mut dyn Decode {
        &mut **self
    }
}

impl<T: DescribeType> DescribeType for Vec<T> {
    const TYPE: TypeMetadata = TypeMetadata::new(RustType::of::<Self>("Vec"), Kind::Slice);

    fn zero() -> Self {
        Vec::new()
    }
}

impl<T: Decode + DescribeType> Decode for Vec<T> {
    fn node(&mut self) -> Node<'_> {
        Node::Slice(self)
    }
}

impl<T: Decode + DescribeType> SliceNode for Vec<T> {
    fn element_type(&self) -> TypeMetadata {
        T::TYPE
    }

    fn clear(&mut self) {
        Vec::clear(self);
    }

    fn resize(&mut self, len: usize) {
        self.resize_with(len, T::zero);
    }

    fn element_mut(&mut self, index: usize) -> &mut dyn Decode {
        &mut self[index]
    }
}

impl<T: DescribeType, const N: usize> DescribeType for [T; N] {
    const TYPE: TypeMetadata = TypeMetadata::new(RustType::of::<Self>("array"), Kind::Array);

    fn zero() -> Self {
        std::array::from_fn(|_| T::zero())
    }
}

impl<T: Decode + DescribeType, const N: usize> Decode for [T; N] {
    fn node(&mut self) -> Node<'_> {
        Node::Array(self)
    }
}

impl<T: Decode + DescribeType, const N: usize> ArrayNode for [T; N] {
    fn element_type(&self) -> TypeMetadata {
        T::TYPE
    }

    fn len(&self) -> usize {
        N
    }

    fn element_mut(&mut self, index: usize) -> &mut dyn Decode {
        &mut self[index]
    }
}

/// Key of a map that can be decoded. Keys are parsed from strings since [`Value::Object`] only has string keys.
pub trait MapKey: 'static + Sized {
    /// Parses the key from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the string doesn't represent a valid key.
    fn parse_key(key: &str) -> anyhow::Result<Self>;
}

impl MapKey for String {
    fn parse_key(key: &str) -> anyhow::Result<Self> {
        Ok(key.to_owned())
    }
}

macro_rules! impl_map_key_for_ints {
    ($parse:ident: $($int:ty),+) => {
        $(
        impl MapKey for $int {
            fn parse_key(key: &str) -> anyhow::Result<Self> {
                $parse(key)
            }
        }
        )+
    };
}

impl_map_key_for_ints!(parse_int: i8, i16, i32, i64, i128, isize);
impl_map_key_for_ints!(parse_uint: u8, u16, u32, u64, u128, usize);

impl<K, V, S> DescribeType for HashMap<K, V, S>
where
    K: MapKey + Eq + Hash,
    V: DescribeType,
    S: 'static + BuildHasher + Default,
{
    const TYPE: TypeMetadata = TypeMetadata::new(RustType::of::<Self>("HashMap"), Kind::Map);

    fn zero() -> Self {
        Self::default()
    }
}

impl<K, V, S> Decode for HashMap<K, V, S>
where
    K: MapKey + Eq + Hash,
    V: Decode + DescribeType,
    S: 'static + BuildHasher + Default,
{
    fn node(&mut self) -> Node<'_> {
        Node::Map(self)
    }
}

impl<K, V, S> MapNode for HashMap<K, V, S>
where
    K: MapKey + Eq + Hash,
    V: Decode + DescribeType,
    S: 'static + BuildHasher + Default,
{
    fn clear(&mut self) {
        HashMap::clear(self);
    }

    fn contains_key(&self, key: &str) -> bool {
        K::parse_key(key).is_ok_and(|key| HashMap::contains_key(self, &key))
    }

    fn entry(&mut self, key: &str) -> anyhow::Result<&mut dyn Decode> {
        let key = K::parse_key(key)?;
        Ok(HashMap::entry(self, key).or_insert_with(V::zero))
    }

    fn remove(&mut self, key: &str) {
        if let Ok(key) = K::parse_key(key) {
            HashMap::remove(self, &key);
        }
    }
}

impl<K, V> DescribeType for BTreeMap<K, V>
where
    K: MapKey + Ord,
    V: DescribeType,
{
    const TYPE: TypeMetadata = TypeMetadata::new(RustType::of::<Self>("BTreeMap"), Kind::Map);

    fn zero() -> Self {
        Self::new()
    }
}

impl<K, V> Decode for BTreeMap<K, V>
where
    K: MapKey + Ord,
    V: Decode + DescribeType,
{
    fn node(&mut self) -> Node<'_> {
        Node::Map(self)
    }
}

impl<K, V> MapNode for BTreeMap<K, V>
where
    K: MapKey + Ord,
    V: Decode + DescribeType,
{
    fn clear(&mut self) {
        BTreeMap::clear(self);
    }

    fn contains_key(&self, key: &str) -> bool {
        K::parse_key(key).is_ok_and(|key| BTreeMap::contains_key(self, &key))
    }

    fn entry(&mut self, key: &str) -> anyhow::Result<&mut dyn Decode> {
        let key = K::parse_key(key)?;
        Ok(BTreeMap::entry(self, key).or_insert_with(V::zero))
    }

    fn remove(&mut self, key: &str) {
        if let Ok(key) = K::parse_key(key) {
            BTreeMap::remove(self, &key);
        }
    }
}
