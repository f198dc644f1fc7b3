//! Structured unpacking of raw runtime values.
//!
//! `unpack` converts one tagged runtime value into a [`MirrorObject`]
//! tree for programmatic consumption (watch windows, REPL result
//! objects). Trees are fresh copies: array payloads hold copied child
//! objects, never live heap views, so heap mutation after the call
//! cannot corrupt an already-captured snapshot.
//!
//! Array recursion carries the same visited-handle cycle guard as the
//! textual tracer; a handle already being unpacked further up the chain
//! produces a handle marker instead of infinite recursion.

use rustc_hash::FxHashSet;

use crate::error::StrandError;
use crate::symbols::TypeTag;
use crate::value::{Heap, HeapHandle, ProcId, Value};

/// Compound payload of a mirror object.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Int(i64),
    Double(f64),
    Bool(bool),
    Char(char),
    /// Copied-out string contents.
    Str(String),
    /// Opaque handle: class instances (callers needing fields go through
    /// the property accessor), and the cycle marker for repeated arrays.
    Handle(HeapHandle),
    Function(ProcId),
    Array(MirrorArray),
}

/// Copied array members.
#[derive(Debug, Clone, PartialEq)]
pub struct MirrorArray {
    pub members: Vec<MirrorObject>,
}

/// A raw runtime value paired with its resolved semantic type.
///
/// `type_tag` is always populated; `payload` is `None` only for the
/// null/invalid runtime values.
#[derive(Debug, Clone, PartialEq)]
pub struct MirrorObject {
    pub type_tag: TypeTag,
    pub payload: Option<Payload>,
}

impl MirrorObject {
    pub fn as_int(&self) -> Option<i64> {
        match self.payload {
            Some(Payload::Int(n)) => Some(n),
            _ => None,
        }
    }

    pub fn as_double(&self) -> Option<f64> {
        match self.payload {
            Some(Payload::Double(d)) => Some(d),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.payload {
            Some(Payload::Bool(b)) => Some(b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.payload {
            Some(Payload::Str(s)) => Some(s),
            _ => None,
        }
    }

    /// Members of an unpacked array; `None` for non-arrays and for the
    /// cycle marker.
    pub fn members(&self) -> Option<&[MirrorObject]> {
        match &self.payload {
            Some(Payload::Array(a)) => Some(&a.members),
            _ => None,
        }
    }

    /// Instance (or cycle-marker) handle.
    pub fn handle(&self) -> Option<HeapHandle> {
        match self.payload {
            Some(Payload::Handle(h)) => Some(h),
            _ => None,
        }
    }
}

/// Unpack a value against an explicit heap. This is the cross-executive
/// entry point; [`ExecutionMirror::unpack`](crate::mirror::ExecutionMirror::unpack)
/// delegates here with its own executive's heap. Scalar payloads are
/// identical across both.
pub fn unpack_value(value: Value, heap: &Heap) -> Result<MirrorObject, StrandError> {
    let mut visited = FxHashSet::default();
    unpack_inner(value, heap, &mut visited)
}

fn unpack_inner(
    value: Value,
    heap: &Heap,
    visited: &mut FxHashSet<HeapHandle>,
) -> Result<MirrorObject, StrandError> {
    match value {
        Value::Null => Ok(MirrorObject {
            type_tag: TypeTag::Null,
            payload: None,
        }),
        Value::Invalid => Ok(MirrorObject {
            type_tag: TypeTag::Invalid,
            payload: None,
        }),
        Value::Int(n) => Ok(MirrorObject {
            type_tag: TypeTag::Int,
            payload: Some(Payload::Int(n)),
        }),
        Value::Double(d) => Ok(MirrorObject {
            type_tag: TypeTag::Double,
            payload: Some(Payload::Double(d)),
        }),
        Value::Bool(b) => Ok(MirrorObject {
            type_tag: TypeTag::Bool,
            payload: Some(Payload::Bool(b)),
        }),
        Value::Char(c) => Ok(MirrorObject {
            type_tag: TypeTag::Char,
            payload: Some(Payload::Char(c)),
        }),
        Value::Str(h) => {
            let s = heap
                .get_str(h)
                .ok_or_else(|| StrandError::invalid_handle(h.0))?;
            Ok(MirrorObject {
                type_tag: TypeTag::Str,
                payload: Some(Payload::Str(s.to_string())),
            })
        }
        Value::Array(h) => {
            if !visited.insert(h) {
                // already unpacking this array up the chain: emit a
                // handle marker instead of recursing forever
                return Ok(MirrorObject {
                    type_tag: TypeTag::Array,
                    payload: Some(Payload::Handle(h)),
                });
            }
            let elements = heap
                .get_array(h)
                .ok_or_else(|| StrandError::invalid_handle(h.0))?;
            let mut members = Vec::with_capacity(elements.len());
            for &e in elements {
                members.push(unpack_inner(e, heap, visited)?);
            }
            visited.remove(&h);
            Ok(MirrorObject {
                type_tag: TypeTag::Array,
                payload: Some(Payload::Array(MirrorArray { members })),
            })
        }
        Value::Pointer(h) => {
            let instance = heap
                .get_instance(h)
                .ok_or_else(|| StrandError::invalid_handle(h.0))?;
            Ok(MirrorObject {
                type_tag: TypeTag::Pointer(instance.class),
                payload: Some(Payload::Handle(h)),
            })
        }
        Value::Function(p) => Ok(MirrorObject {
            type_tag: TypeTag::Function,
            payload: Some(Payload::Function(p)),
        }),
    }
}

/// Rebuild a raw value from a mirror tree, allocating fresh heap storage
/// for strings and arrays. Pointer payloads repack to their original
/// handle (the instance itself is not copied).
pub fn repack(obj: &MirrorObject, heap: &mut Heap) -> Result<Value, StrandError> {
    match (&obj.type_tag, &obj.payload) {
        (TypeTag::Null, None) => Ok(Value::Null),
        (TypeTag::Invalid, None) => Ok(Value::Invalid),
        (_, Some(Payload::Int(n))) => Ok(Value::Int(*n)),
        (_, Some(Payload::Double(d))) => Ok(Value::Double(*d)),
        (_, Some(Payload::Bool(b))) => Ok(Value::Bool(*b)),
        (_, Some(Payload::Char(c))) => Ok(Value::Char(*c)),
        (_, Some(Payload::Str(s))) => Ok(heap.alloc_str(s)),
        (_, Some(Payload::Function(p))) => Ok(Value::Function(*p)),
        (TypeTag::Array, Some(Payload::Array(arr))) => {
            let mut values = Vec::with_capacity(arr.members.len());
            for m in &arr.members {
                values.push(repack(m, heap)?);
            }
            Ok(heap.alloc_array(values))
        }
        (TypeTag::Array, Some(Payload::Handle(h))) => Ok(Value::Array(*h)),
        (TypeTag::Pointer(_), Some(Payload::Handle(h))) => Ok(Value::Pointer(*h)),
        (tag, _) => Err(StrandError::type_mismatch(
            "repackable mirror object",
            tag.name(),
        )),
    }
}
