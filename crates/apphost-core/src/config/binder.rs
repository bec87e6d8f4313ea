//! Serde binding for configuration sections.
//!
//! A section is first folded into a [`Node`] tree (one node per key segment),
//! then handed to [`NodeDeserializer`], which drives any `Deserialize` type
//! from the string leaves.
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::de::value::{MapAccessDeserializer, MapDeserializer, SeqDeserializer, StrDeserializer};
use serde::de::{self, DeserializeOwned, Deserializer, IntoDeserializer, Visitor};

use crate::config::error::ConfigError;
use crate::config::tree::{ConfigSection, KEY_DELIMITER};

pub(crate) fn bind<T: DeserializeOwned>(section: &ConfigSection<'_>) -> Result<T, ConfigError> {
    let node = Node::from_section(section);
    T::deserialize(NodeDeserializer { node: &node }).map_err(|err| ConfigError::Bind {
        section: if section.path().is_empty() {
            "<root>".to_string()
        } else {
            section.path().to_string()
        },
        message: err.0,
    })
}

#[derive(Debug, Default)]
struct Node {
    value: Option<String>,
    // normalized segment -> (original segment, child)
    children: BTreeMap<String, (String, Node)>,
}

impl Node {
    fn from_section(section: &ConfigSection<'_>) -> Node {
        let mut root = Node {
            value: section.value().map(str::to_string),
            children: BTreeMap::new(),
        };
        for (relative, value) in section.entries() {
            let mut node = &mut root;
            for segment in relative.split(KEY_DELIMITER) {
                node = &mut node
                    .children
                    .entry(segment.to_ascii_lowercase())
                    .or_insert_with(|| (segment.to_string(), Node::default()))
                    .1;
            }
            node.value = Some(value.to_string());
        }
        root
    }

    /// No children and no meaningful value (JSON `null` flattens to "").
    fn is_empty(&self) -> bool {
        self.children.is_empty() && self.value.as_deref().is_none_or(str::is_empty)
    }

    /// Children ordered by index when every child key is an array index.
    fn indexed_children(&self) -> Option<Vec<&Node>> {
        let mut indexed = self
            .children
            .iter()
            .map(|(key, (_, node))| key.parse::<usize>().ok().map(|index| (index, node)))
            .collect::<Option<Vec<_>>>()?;
        indexed.sort_by_key(|(index, _)| *index);
        Some(indexed.into_iter().map(|(_, node)| node).collect())
    }
}

#[derive(Debug)]
struct BindError(String);

impl fmt::Display for BindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for BindError {}

impl de::Error for BindError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        BindError(msg.to_string())
    }
}

#[derive(Debug, Clone, Copy)]
struct NodeDeserializer<'de> {
    node: &'de Node,
}

impl<'de> NodeDeserializer<'de> {
    fn scalar(&self) -> Result<&'de str, BindError> {
        match &self.node.value {
            Some(value) => Ok(value.as_str()),
            None if self.node.children.is_empty() => Ok(""),
            None => Err(BindError("expected a value but found a section".to_string())),
        }
    }

    fn parse<T>(&self, expected: &str) -> Result<T, BindError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        let raw = self.scalar()?;
        raw.trim()
            .parse()
            .map_err(|err| BindError(format!("invalid {} '{}': {}", expected, raw, err)))
    }

    fn entries(
        self,
        names: &'static [&'static str],
    ) -> impl Iterator<Item = (&'de str, NodeDeserializer<'de>)> {
        self.node.children.values().map(move |(key, node)| {
            let key: &'de str = match names.iter().find(|name| name.eq_ignore_ascii_case(key)) {
                Some(name) => *name,
                None => key.as_str(),
            };
            (key, NodeDeserializer { node })
        })
    }

    fn visit_items<V: Visitor<'de>>(items: Vec<&'de Node>, visitor: V) -> Result<V::Value, BindError> {
        let mut seq: SeqDeserializer<_, BindError> =
            SeqDeserializer::new(items.into_iter().map(|node| NodeDeserializer { node }));
        let value = visitor.visit_seq(&mut seq)?;
        seq.end()?;
        Ok(value)
    }

    fn visit_entries<V: Visitor<'de>>(
        self,
        names: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, BindError> {
        let mut map: MapDeserializer<'de, _, BindError> = MapDeserializer::new(self.entries(names));
        let value = visitor.visit_map(&mut map)?;
        map.end()?;
        Ok(value)
    }
}

impl<'de> IntoDeserializer<'de, BindError> for NodeDeserializer<'de> {
    type Deserializer = Self;

    fn into_deserializer(self) -> Self {
        self
    }
}

macro_rules! deserialize_parsed {
    ($($method:ident => $ty:ty, $visit:ident;)*) => {
        $(
            fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
                visitor.$visit(self.parse::<$ty>(stringify!($ty))?)
            }
        )*
    };
}

impl<'de> Deserializer<'de> for NodeDeserializer<'de> {
    type Error = BindError;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        if self.node.children.is_empty() {
            return match &self.node.value {
                Some(value) => visitor.visit_borrowed_str(value),
                None => visitor.visit_unit(),
            };
        }
        match self.node.indexed_children() {
            Some(items) => Self::visit_items(items, visitor),
            None => self.visit_entries(&[], visitor),
        }
    }

    fn deserialize_bool<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        let raw = self.scalar()?;
        match raw.trim().to_ascii_lowercase().as_str() {
            "true" => visitor.visit_bool(true),
            "false" => visitor.visit_bool(false),
            _ => Err(BindError(format!("invalid bool '{}'", raw))),
        }
    }

    deserialize_parsed! {
        deserialize_i8 => i8, visit_i8;
        deserialize_i16 => i16, visit_i16;
        deserialize_i32 => i32, visit_i32;
        deserialize_i64 => i64, visit_i64;
        deserialize_u8 => u8, visit_u8;
        deserialize_u16 => u16, visit_u16;
        deserialize_u32 => u32, visit_u32;
        deserialize_u64 => u64, visit_u64;
        deserialize_f32 => f32, visit_f32;
        deserialize_f64 => f64, visit_f64;
    }

    fn deserialize_char<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        let raw = self.scalar()?;
        let mut chars = raw.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => visitor.visit_char(c),
            _ => Err(BindError(format!("invalid char '{}'", raw))),
        }
    }

    fn deserialize_str<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_borrowed_str(self.scalar()?)
    }

    fn deserialize_string<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        self.deserialize_str(visitor)
    }

    fn deserialize_bytes<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_borrowed_bytes(self.scalar()?.as_bytes())
    }

    fn deserialize_byte_buf<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        self.deserialize_bytes(visitor)
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        if self.node.is_empty() {
            visitor.visit_none()
        } else {
            visitor.visit_some(self)
        }
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_unit()
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        visitor.visit_unit()
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        if self.node.is_empty() {
            return Self::visit_items(Vec::new(), visitor);
        }
        match self.node.indexed_children() {
            Some(items) if !items.is_empty() => Self::visit_items(items, visitor),
            _ => Err(BindError(
                "expected a sequence (children keyed 0, 1, 2, ...)".to_string(),
            )),
        }
    }

    fn deserialize_tuple<V: Visitor<'de>>(self, _len: usize, visitor: V) -> Result<V::Value, Self::Error> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_map<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        self.visit_entries(&[], visitor)
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        self.visit_entries(fields, visitor)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        if self.node.children.is_empty() {
            let raw = self.scalar()?.trim();
            let variant: &'de str = match variants.iter().find(|name| name.eq_ignore_ascii_case(raw)) {
                Some(name) => *name,
                None => raw,
            };
            let access: StrDeserializer<'_, BindError> = variant.into_deserializer();
            return visitor.visit_enum(access);
        }
        let map: MapDeserializer<'de, _, BindError> = MapDeserializer::new(self.entries(variants));
        visitor.visit_enum(MapAccessDeserializer::new(map))
    }

    fn deserialize_identifier<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        self.deserialize_str(visitor)
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_unit()
    }
}
