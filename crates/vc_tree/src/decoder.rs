use alloc::string::{String, ToString};
use alloc::sync::Arc;
use alloc::vec::{self, Vec};

use vc_serialize::SerialError;
use vc_serialize::descriptor::{PrimitiveKind, TypeDescriptor, TypeKind};
use vc_serialize::protocol::{Decoder, PrimitiveValue, descriptor_trace};
use vc_serialize::registry::SerialRegistry;
use vc_serialize::serializer::PolymorphicSerializer;

use crate::{Layout, TreeConfig, TreeError, Value};

/// An open scope, holding the values not read yet.
enum Frame {
    /// A keyed class, entries are visited in tree order.
    Keyed {
        entries: vec::IntoIter<(String, Value)>,
        seen: Vec<bool>,
        pending: Option<(usize, Value)>,
    },
    /// A list or positional class, items are read in index order.
    Items {
        items: vec::IntoIter<Value>,
        next: usize,
        len: usize,
    },
    /// A map stored as `[key, value]` pairs.
    Entries {
        pairs: vec::IntoIter<Value>,
        value: Option<Value>,
        next: usize,
        len: usize,
    },
}

/// [`Decoder`] reading a [`Value`] tree.
///
/// The value the next read consumes is kept in `current`.
/// `decode_element` moves the next child of the innermost scope there.
pub(crate) struct TreeDecoder<'a> {
    registry: &'a Arc<SerialRegistry>,
    config: &'a TreeConfig,
    stack: Vec<Frame>,
    current: Option<Value>,
}

fn malformed(error: TreeError) -> SerialError {
    log::debug!("malformed tree: {error}\n{}", descriptor_trace());
    SerialError::from(error)
}

fn mismatch(descriptor: &TypeDescriptor, expected: &'static str, found: &Value) -> SerialError {
    malformed(TreeError::KindMismatch {
        type_name: descriptor.name().to_string(),
        expected,
        found: found.kind_name(),
    })
}

impl<'a> TreeDecoder<'a> {
    pub fn new(registry: &'a Arc<SerialRegistry>, config: &'a TreeConfig, root: Value) -> Self {
        Self {
            registry,
            config,
            stack: Vec::new(),
            current: Some(root),
        }
    }

    /// Fails if the root value was not consumed.
    pub fn finish(self, descriptor: &TypeDescriptor) -> Result<(), SerialError> {
        match self.current {
            None => Ok(()),
            Some(_) => Err(malformed(TreeError::TrailingElements {
                type_name: descriptor.name().to_string(),
                count: 1,
            })),
        }
    }

    fn take(&mut self, descriptor: &TypeDescriptor) -> Result<Value, SerialError> {
        self.current.take().ok_or_else(|| {
            malformed(TreeError::UnexpectedEnd {
                type_name: descriptor.name().to_string(),
            })
        })
    }

    fn key_index(&self, descriptor: &TypeDescriptor, key: &str) -> Option<usize> {
        if PolymorphicSerializer::is_polymorphic(descriptor) {
            return if key == self.config.type_key {
                Some(PolymorphicSerializer::TYPE_INDEX)
            } else {
                descriptor
                    .element_index(key)
                    .filter(|&index| index != PolymorphicSerializer::TYPE_INDEX)
            };
        }
        descriptor.element_index(key)
    }

    fn variant_index(&self, descriptor: &TypeDescriptor, value: Value) -> Result<usize, SerialError> {
        let index = match value {
            Value::Str(name) => descriptor.element_index(&name).ok_or_else(|| {
                malformed(TreeError::UnknownVariant {
                    type_name: descriptor.name().to_string(),
                    variant: name,
                })
            })?,
            Value::UInt(index) => usize::try_from(index).unwrap_or(usize::MAX),
            Value::Int(index) => usize::try_from(index).unwrap_or(usize::MAX),
            other => return Err(mismatch(descriptor, "variant", &other)),
        };
        if index >= descriptor.element_len() {
            return Err(malformed(TreeError::UnknownVariant {
                type_name: descriptor.name().to_string(),
                variant: index.to_string(),
            }));
        }
        Ok(index)
    }
}

// -----------------------------------------------------------------------------
// Primitive conversion

fn out_of_range(value: impl ToString, kind: PrimitiveKind) -> SerialError {
    malformed(TreeError::OutOfRange {
        value: value.to_string(),
        kind,
    })
}

fn kind_mismatch(kind: PrimitiveKind, found: &Value) -> SerialError {
    malformed(TreeError::KindMismatch {
        type_name: kind.to_string(),
        expected: kind.name(),
        found: found.kind_name(),
    })
}

macro_rules! integer {
    ($value:expr, $kind:expr, $ty:ty, $variant:ident) => {
        match $value {
            Value::Int(v) => <$ty>::try_from(v)
                .map(PrimitiveValue::$variant)
                .map_err(|_| out_of_range(v, $kind)),
            Value::UInt(v) => <$ty>::try_from(v)
                .map(PrimitiveValue::$variant)
                .map_err(|_| out_of_range(v, $kind)),
            other => Err(kind_mismatch($kind, &other)),
        }
    };
}

/// Converts a leaf value, integers and floats are accepted across widths.
fn primitive(value: Value, kind: PrimitiveKind) -> Result<PrimitiveValue, SerialError> {
    match kind {
        PrimitiveKind::Bool => match value {
            Value::Bool(v) => Ok(PrimitiveValue::Bool(v)),
            other => Err(kind_mismatch(kind, &other)),
        },
        PrimitiveKind::I8 => integer!(value, kind, i8, I8),
        PrimitiveKind::I16 => integer!(value, kind, i16, I16),
        PrimitiveKind::I32 => integer!(value, kind, i32, I32),
        PrimitiveKind::I64 => integer!(value, kind, i64, I64),
        PrimitiveKind::U8 => integer!(value, kind, u8, U8),
        PrimitiveKind::U16 => integer!(value, kind, u16, U16),
        PrimitiveKind::U32 => integer!(value, kind, u32, U32),
        PrimitiveKind::U64 => integer!(value, kind, u64, U64),
        PrimitiveKind::F32 => match value {
            Value::Float(v) => Ok(PrimitiveValue::F32(v as f32)),
            Value::Int(v) => Ok(PrimitiveValue::F32(v as f32)),
            Value::UInt(v) => Ok(PrimitiveValue::F32(v as f32)),
            other => Err(kind_mismatch(kind, &other)),
        },
        PrimitiveKind::F64 => match value {
            Value::Float(v) => Ok(PrimitiveValue::F64(v)),
            Value::Int(v) => Ok(PrimitiveValue::F64(v as f64)),
            Value::UInt(v) => Ok(PrimitiveValue::F64(v as f64)),
            other => Err(kind_mismatch(kind, &other)),
        },
        PrimitiveKind::Char => match value {
            Value::Char(v) => Ok(PrimitiveValue::Char(v)),
            Value::Str(s) => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Ok(PrimitiveValue::Char(c)),
                    _ => Err(kind_mismatch(kind, &Value::Str(s))),
                }
            }
            other => Err(kind_mismatch(kind, &other)),
        },
        PrimitiveKind::Str => match value {
            Value::Str(v) => Ok(PrimitiveValue::Str(v)),
            Value::Char(v) => Ok(PrimitiveValue::Str(v.to_string())),
            other => Err(kind_mismatch(kind, &other)),
        },
        PrimitiveKind::Bytes => match value {
            Value::Bytes(v) => Ok(PrimitiveValue::Bytes(v)),
            // Text formats render bytes as a list of integers.
            Value::Seq(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::UInt(v) => u8::try_from(v).map_err(|_| out_of_range(v, PrimitiveKind::U8)),
                    Value::Int(v) => u8::try_from(v).map_err(|_| out_of_range(v, PrimitiveKind::U8)),
                    other => Err(kind_mismatch(PrimitiveKind::U8, &other)),
                })
                .collect::<Result<Vec<u8>, SerialError>>()
                .map(PrimitiveValue::Bytes),
            other => Err(kind_mismatch(kind, &other)),
        },
    }
}

// -----------------------------------------------------------------------------
// Decoder

impl Decoder for TreeDecoder<'_> {
    #[inline]
    fn registry(&self) -> &Arc<SerialRegistry> {
        self.registry
    }

    fn decode_primitive(&mut self, kind: PrimitiveKind) -> Result<PrimitiveValue, SerialError> {
        let Some(value) = self.current.take() else {
            return Err(malformed(TreeError::UnexpectedEnd {
                type_name: kind.to_string(),
            }));
        };
        primitive(value, kind)
    }

    fn decode_presence(&mut self) -> Result<bool, SerialError> {
        match self.current {
            Some(Value::Null) => {
                self.current = None;
                Ok(false)
            }
            Some(_) => Ok(true),
            None => Err(malformed(TreeError::UnexpectedEnd {
                type_name: String::from("nullable"),
            })),
        }
    }

    fn decode_enum(&mut self, descriptor: &TypeDescriptor) -> Result<usize, SerialError> {
        let value = self.take(descriptor)?;
        self.variant_index(descriptor, value)
    }

    fn begin_structure(&mut self, descriptor: &TypeDescriptor) -> Result<(), SerialError> {
        let value = self.take(descriptor)?;
        let keyed = self.config.layout == Layout::Keyed;
        let frame = match (descriptor.kind(), value) {
            (TypeKind::Class, Value::Map(entries)) if keyed => Frame::Keyed {
                entries: entries.into_iter(),
                seen: alloc::vec![false; descriptor.element_len()],
                pending: None,
            },
            (TypeKind::Class, Value::Seq(items)) if !keyed => Frame::Items {
                len: items.len(),
                items: items.into_iter(),
                next: 0,
            },
            (TypeKind::List, Value::Seq(items)) => Frame::Items {
                len: items.len(),
                items: items.into_iter(),
                next: 0,
            },
            (TypeKind::Map, Value::Seq(pairs)) => Frame::Entries {
                len: pairs.len(),
                pairs: pairs.into_iter(),
                value: None,
                next: 0,
            },
            (TypeKind::Class, other) if keyed => return Err(mismatch(descriptor, "map", &other)),
            (TypeKind::Class | TypeKind::List | TypeKind::Map, other) => {
                return Err(mismatch(descriptor, "seq", &other));
            }
            (kind, _) => {
                return Err(SerialError::custom(format_args!(
                    "`{}` of kind {kind} cannot be read as a structure",
                    descriptor.name()
                )));
            }
        };
        self.stack.push(frame);
        Ok(())
    }

    fn decode_element_index(
        &mut self,
        descriptor: &TypeDescriptor,
    ) -> Result<Option<usize>, SerialError> {
        let ignore_unknown = self.config.ignore_unknown_keys;
        let next_key = loop {
            let Some(Frame::Keyed { entries, .. }) = self.stack.last_mut() else {
                break None;
            };
            let Some((key, value)) = entries.next() else {
                return Ok(None);
            };
            match self.key_index(descriptor, &key) {
                Some(index) => break Some((key, index, value)),
                None if ignore_unknown => {
                    log::trace!("skipping unknown key `{key}` of `{}`", descriptor.name());
                }
                None => {
                    return Err(malformed(TreeError::UnknownKey {
                        type_name: descriptor.name().to_string(),
                        key,
                    }));
                }
            }
        };

        match self.stack.last_mut() {
            Some(Frame::Keyed { seen, pending, .. }) => {
                let Some((key, index, value)) = next_key else {
                    return Ok(None);
                };
                if core::mem::replace(&mut seen[index], true) {
                    return Err(malformed(TreeError::DuplicateKey {
                        type_name: descriptor.name().to_string(),
                        key,
                    }));
                }
                *pending = Some((index, value));
                Ok(Some(index))
            }
            Some(Frame::Items { next, len, .. }) => Ok((*next < *len).then_some(*next)),
            Some(Frame::Entries {
                next, len, value, ..
            }) => {
                let more = if *next % 2 == 0 { *next / 2 < *len } else { value.is_some() };
                Ok(more.then_some(*next))
            }
            None => Err(SerialError::custom("element index requested outside a structure")),
        }
    }

    fn decode_element(
        &mut self,
        descriptor: &TypeDescriptor,
        index: usize,
    ) -> Result<(), SerialError> {
        let out_of_order = || {
            malformed(TreeError::OutOfOrder {
                type_name: descriptor.name().to_string(),
                index,
            })
        };
        let unexpected_end = || {
            malformed(TreeError::UnexpectedEnd {
                type_name: descriptor.name().to_string(),
            })
        };

        let value = match self.stack.last_mut() {
            Some(Frame::Keyed { pending, .. }) => match pending.take() {
                Some((expected, value)) if expected == index => value,
                _ => return Err(out_of_order()),
            },
            Some(Frame::Items { items, next, .. }) => {
                if *next != index {
                    return Err(out_of_order());
                }
                *next += 1;
                items.next().ok_or_else(unexpected_end)?
            }
            Some(Frame::Entries {
                pairs, value, next, ..
            }) => {
                if *next != index {
                    return Err(out_of_order());
                }
                *next += 1;
                if index % 2 == 1 {
                    value.take().ok_or_else(unexpected_end)?
                } else {
                    match pairs.next().ok_or_else(unexpected_end)? {
                        Value::Seq(pair) if pair.len() == 2 => {
                            let mut pair = pair.into_iter();
                            let key = pair.next();
                            *value = pair.next();
                            key.ok_or_else(unexpected_end)?
                        }
                        other => return Err(mismatch(descriptor, "[key, value] pair", &other)),
                    }
                }
            }
            None => return Err(SerialError::custom("element read outside a structure")),
        };
        self.current = Some(value);
        Ok(())
    }

    fn decode_collection_size(
        &mut self,
        _: &TypeDescriptor,
    ) -> Result<Option<usize>, SerialError> {
        Ok(match self.stack.last() {
            Some(Frame::Items { len, .. } | Frame::Entries { len, .. }) => Some(*len),
            _ => None,
        })
    }

    #[inline]
    fn decode_sequentially(&self) -> bool {
        self.config.layout == Layout::Positional
    }

    fn end_structure(&mut self, descriptor: &TypeDescriptor) -> Result<(), SerialError> {
        // A positioned value nobody read belongs to the closing scope.
        self.current = None;
        let remaining = match self.stack.pop() {
            Some(Frame::Keyed { entries, .. }) => entries.len(),
            Some(Frame::Items { items, .. }) => items.len(),
            Some(Frame::Entries { pairs, .. }) => pairs.len(),
            None => {
                return Err(SerialError::custom(format_args!(
                    "`{}` closed without being opened",
                    descriptor.name()
                )));
            }
        };
        if remaining > 0 {
            return Err(malformed(TreeError::TrailingElements {
                type_name: descriptor.name().to_string(),
                count: remaining,
            }));
        }
        Ok(())
    }
}
