use alloc::string::{String, ToString};
use alloc::sync::Arc;
use alloc::vec::Vec;

use vc_serialize::SerialError;
use vc_serialize::descriptor::{TypeDescriptor, TypeKind};
use vc_serialize::protocol::{Encoder, PrimitiveRef};
use vc_serialize::registry::SerialRegistry;
use vc_serialize::serializer::PolymorphicSerializer;

use crate::{Layout, TreeConfig, Value};

/// An open scope, collecting the values written into it.
enum Frame {
    /// A keyed class, the key of the next value is set by `encode_element`.
    Keyed {
        entries: Vec<(String, Value)>,
        key: Option<String>,
    },
    /// A list or positional class.
    Items(Vec<Value>),
    /// A map, keys and values alternate.
    Entries {
        pairs: Vec<Value>,
        key: Option<Value>,
    },
}

/// [`Encoder`] building a [`Value`] tree.
pub(crate) struct TreeEncoder<'a> {
    registry: &'a Arc<SerialRegistry>,
    config: &'a TreeConfig,
    stack: Vec<Frame>,
    root: Option<Value>,
}

impl<'a> TreeEncoder<'a> {
    pub fn new(registry: &'a Arc<SerialRegistry>, config: &'a TreeConfig) -> Self {
        Self {
            registry,
            config,
            stack: Vec::new(),
            root: None,
        }
    }

    /// Returns the finished tree.
    pub fn finish(self) -> Result<Value, SerialError> {
        if !self.stack.is_empty() {
            return Err(SerialError::custom(format_args!(
                "{} structure(s) left open",
                self.stack.len()
            )));
        }
        self.root
            .ok_or_else(|| SerialError::custom("the serializer wrote no value"))
    }

    fn emit(&mut self, value: Value) -> Result<(), SerialError> {
        match self.stack.last_mut() {
            None => {
                if self.root.is_some() {
                    return Err(SerialError::custom("more than one root value written"));
                }
                self.root = Some(value);
            }
            Some(Frame::Keyed { entries, key }) => {
                let Some(key) = key.take() else {
                    return Err(SerialError::custom("value written without element header"));
                };
                entries.push((key, value));
            }
            Some(Frame::Items(items)) => items.push(value),
            Some(Frame::Entries { pairs, key }) => match key.take() {
                None => *key = Some(value),
                Some(k) => pairs.push(Value::Seq(alloc::vec![k, value])),
            },
        }
        Ok(())
    }

    fn is_keyed(&self, descriptor: &TypeDescriptor) -> bool {
        self.config.layout == Layout::Keyed && descriptor.kind() == TypeKind::Class
    }
}

impl Encoder for TreeEncoder<'_> {
    #[inline]
    fn registry(&self) -> &Arc<SerialRegistry> {
        self.registry
    }

    fn encode_primitive(&mut self, value: PrimitiveRef<'_>) -> Result<(), SerialError> {
        let value = match value {
            PrimitiveRef::Bool(v) => Value::Bool(v),
            PrimitiveRef::I8(v) => Value::Int(v.into()),
            PrimitiveRef::I16(v) => Value::Int(v.into()),
            PrimitiveRef::I32(v) => Value::Int(v.into()),
            PrimitiveRef::I64(v) => Value::Int(v),
            PrimitiveRef::U8(v) => Value::UInt(v.into()),
            PrimitiveRef::U16(v) => Value::UInt(v.into()),
            PrimitiveRef::U32(v) => Value::UInt(v.into()),
            PrimitiveRef::U64(v) => Value::UInt(v),
            PrimitiveRef::F32(v) => Value::Float(v.into()),
            PrimitiveRef::F64(v) => Value::Float(v),
            PrimitiveRef::Char(v) => Value::Char(v),
            PrimitiveRef::Str(v) => Value::Str(v.to_string()),
            PrimitiveRef::Bytes(v) => Value::Bytes(v.to_vec()),
        };
        self.emit(value)
    }

    fn encode_presence(&mut self, present: bool) -> Result<(), SerialError> {
        if present {
            Ok(())
        } else {
            self.emit(Value::Null)
        }
    }

    fn encode_enum(
        &mut self,
        descriptor: &TypeDescriptor,
        variant: usize,
    ) -> Result<(), SerialError> {
        let Some(info) = descriptor.element(variant) else {
            return Err(SerialError::unknown_element(descriptor, variant));
        };
        match self.config.layout {
            Layout::Keyed => self.emit(Value::Str(info.name().to_string())),
            Layout::Positional => self.emit(Value::UInt(variant as u64)),
        }
    }

    fn begin_structure(&mut self, descriptor: &TypeDescriptor) -> Result<(), SerialError> {
        let frame = match descriptor.kind() {
            TypeKind::Map => Frame::Entries {
                pairs: Vec::new(),
                key: None,
            },
            TypeKind::Class if self.is_keyed(descriptor) => Frame::Keyed {
                entries: Vec::with_capacity(descriptor.element_len()),
                key: None,
            },
            TypeKind::Class | TypeKind::List => {
                Frame::Items(Vec::with_capacity(descriptor.element_len()))
            }
            kind => {
                return Err(SerialError::custom(format_args!(
                    "`{}` of kind {kind} cannot be written as a structure",
                    descriptor.name()
                )));
            }
        };
        self.stack.push(frame);
        Ok(())
    }

    fn begin_collection(
        &mut self,
        descriptor: &TypeDescriptor,
        len: usize,
    ) -> Result<(), SerialError> {
        self.begin_structure(descriptor)?;
        match self.stack.last_mut() {
            Some(Frame::Items(items)) => items.reserve(len),
            Some(Frame::Entries { pairs, .. }) => pairs.reserve(len),
            _ => {}
        }
        Ok(())
    }

    fn encode_element(
        &mut self,
        descriptor: &TypeDescriptor,
        index: usize,
    ) -> Result<(), SerialError> {
        let Some(Frame::Keyed { key, .. }) = self.stack.last_mut() else {
            return Ok(());
        };
        let name = if index == PolymorphicSerializer::TYPE_INDEX
            && PolymorphicSerializer::is_polymorphic(descriptor)
        {
            self.config.type_key.to_string()
        } else {
            match descriptor.element(index) {
                Some(info) => info.name().to_string(),
                None => return Err(SerialError::unknown_element(descriptor, index)),
            }
        };
        *key = Some(name);
        Ok(())
    }

    fn end_structure(&mut self, descriptor: &TypeDescriptor) -> Result<(), SerialError> {
        let value = match self.stack.pop() {
            Some(Frame::Keyed { entries, .. }) => Value::Map(entries),
            Some(Frame::Items(items)) => Value::Seq(items),
            Some(Frame::Entries { pairs, key: None }) => Value::Seq(pairs),
            Some(Frame::Entries { key: Some(_), .. }) => {
                return Err(SerialError::custom(format_args!(
                    "map `{}` ended with a key but no value",
                    descriptor.name()
                )));
            }
            None => {
                return Err(SerialError::custom(format_args!(
                    "`{}` closed without being opened",
                    descriptor.name()
                )));
            }
        };
        self.emit(value)
    }
}
