// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! Binary encoding of units.
//!
//! Layout (little-endian): magic `QUIL`, `u16` version, unit name, `u32`
//! entry count, then per entry: name, kind tag, signature text, `u16`
//! max locals, constant pool, op pool, code. Strings are a `u32` length
//! followed by UTF-8 bytes.

use quill_form::{
    BasicType, BootstrapOp, Kind, Linkage, MemberRef, MethodType, NamedOp, Object, PrimType,
    RefType, Signature, Value, ValueType,
};

use crate::emit::{EntryCode, Unit};
use crate::error::{SynthError, SynthResult};
use crate::insn::{Insn, Widening};

const MAGIC: &[u8; 4] = b"QUIL";
const VERSION: u16 = 1;

// ── encode ──────────────────────────────────────────────────────

pub(crate) fn encode(unit: &Unit) -> SynthResult<Vec<u8>> {
    let mut w = Writer::default();
    w.bytes(MAGIC);
    w.u16(VERSION);
    w.str(unit.name());
    w.u32(unit.len() as u32);
    for entry in unit.entries() {
        encode_entry(&mut w, entry)?;
    }
    Ok(w.buf)
}

fn encode_entry(w: &mut Writer, entry: &EntryCode) -> SynthResult<()> {
    w.str(&entry.name);
    w.u8(entry.kind.to_u8());
    w.str(&entry.signature.to_string());
    w.u16(entry.max_locals);

    w.u16(entry.constants.len() as u16);
    for value in &entry.constants {
        encode_value(w, value)?;
    }

    w.u16(entry.ops.len() as u16);
    for op in &entry.ops {
        encode_op(w, op);
    }

    w.u32(entry.code.len() as u32);
    for insn in &entry.code {
        encode_insn(w, insn);
    }
    Ok(())
}

fn encode_value(w: &mut Writer, value: &Value) -> SynthResult<()> {
    match value {
        Value::Void => w.u8(0),
        Value::Int(v) => {
            w.u8(1);
            w.bytes(&v.to_le_bytes());
        }
        Value::Long(v) => {
            w.u8(2);
            w.bytes(&v.to_le_bytes());
        }
        Value::Float(v) => {
            w.u8(3);
            w.u32(v.to_bits());
        }
        Value::Double(v) => {
            w.u8(4);
            w.bytes(&v.to_bits().to_le_bytes());
        }
        Value::Ref(None) => w.u8(5),
        Value::Ref(Some(obj)) => match obj.as_ref() {
            Object::Str(s) => {
                w.u8(6);
                w.str(s);
            }
            other => {
                return Err(SynthError::Unencodable(format!(
                    "constant of type {}",
                    other.type_name()
                )))
            }
        },
    }
    Ok(())
}

fn encode_op(w: &mut Writer, op: &NamedOp) {
    match op.linkage() {
        Linkage::Bootstrap(b) => {
            w.u8(0);
            match b {
                BootstrapOp::Identity(bt) => {
                    w.u8(0);
                    w.u8(bt.as_char() as u8);
                }
                BootstrapOp::Zero(bt) => {
                    w.u8(1);
                    w.u8(bt.as_char() as u8);
                }
                BootstrapOp::Add(bt) => {
                    w.u8(2);
                    w.u8(bt.as_char() as u8);
                }
                BootstrapOp::Sub(bt) => {
                    w.u8(3);
                    w.u8(bt.as_char() as u8);
                }
                BootstrapOp::Mul(bt) => {
                    w.u8(4);
                    w.u8(bt.as_char() as u8);
                }
                BootstrapOp::InvokeBasic(sig) => {
                    w.u8(5);
                    w.str(&sig.to_string());
                }
                BootstrapOp::GetField { slot, ty } => {
                    w.u8(6);
                    w.u16(*slot);
                    w.u8(ty.as_char() as u8);
                }
                BootstrapOp::Convert { from, to, call_site } => {
                    w.u8(7);
                    w.str(&from.descriptor());
                    w.str(&to.descriptor());
                    w.str(&call_site.descriptor());
                }
            }
        }
        Linkage::Member(member) => {
            w.u8(1);
            w.str(&member.owner);
            w.str(&member.name);
            w.str(&op.method_type().descriptor());
        }
    }
}

fn encode_insn(w: &mut Writer, insn: &Insn) {
    match insn {
        Insn::Load(i) => {
            w.u8(0);
            w.u16(*i);
        }
        Insn::Store(i) => {
            w.u8(1);
            w.u16(*i);
        }
        Insn::Const(i) => {
            w.u8(2);
            w.u16(*i);
        }
        Insn::Call(i) => {
            w.u8(3);
            w.u16(*i);
        }
        Insn::Widen(widening) => {
            w.u8(4);
            w.u8(widening.to_u8());
        }
        Insn::Box(prim) => {
            w.u8(5);
            w.u8(prim.descriptor() as u8);
        }
        Insn::Unbox { owner, to } => {
            w.u8(6);
            w.str(&ValueType::Ref(owner.clone()).descriptor());
            w.u8(to.descriptor() as u8);
        }
        Insn::CheckCast(ty) => {
            w.u8(7);
            w.str(&ValueType::Ref(ty.clone()).descriptor());
        }
        Insn::Return => w.u8(8),
        Insn::ReturnVoid => w.u8(9),
    }
}

#[derive(Default)]
struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    fn u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn u16(&mut self, v: u16) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn bytes(&mut self, b: &[u8]) {
        self.buf.extend_from_slice(b);
    }

    fn str(&mut self, s: &str) {
        self.u32(s.len() as u32);
        self.bytes(s.as_bytes());
    }
}

// ── decode ──────────────────────────────────────────────────────

pub(crate) fn decode(bytes: &[u8]) -> SynthResult<Unit> {
    let mut r = Reader { bytes, pos: 0 };
    if r.take(4)? != MAGIC {
        return Err(malformed("bad magic"));
    }
    let version = r.u16()?;
    if version != VERSION {
        return Err(malformed(format!("unsupported version {version}")));
    }
    let name = r.string()?;
    let count = r.u32()? as usize;
    let mut entries = Vec::with_capacity(count.min(1024));
    for _ in 0..count {
        entries.push(decode_entry(&mut r)?);
    }
    if r.pos != bytes.len() {
        return Err(malformed("trailing bytes"));
    }
    Ok(Unit::from_entries(name, entries))
}

fn decode_entry(r: &mut Reader<'_>) -> SynthResult<EntryCode> {
    let name = r.string()?;
    let kind_tag = r.u8()?;
    let kind = Kind::from_u8(kind_tag).ok_or_else(|| malformed(format!("unknown kind {kind_tag}")))?;
    let signature = Signature::parse(&r.string()?)?;
    let max_locals = r.u16()?;

    let n = r.u16()?;
    let constants = (0..n).map(|_| decode_value(r)).collect::<SynthResult<Vec<_>>>()?;

    let n = r.u16()?;
    let ops = (0..n).map(|_| decode_op(r)).collect::<SynthResult<Vec<_>>>()?;

    let n = r.u32()?;
    let code = (0..n).map(|_| decode_insn(r)).collect::<SynthResult<Vec<_>>>()?;

    Ok(EntryCode { name, kind, signature, max_locals, constants, ops, code })
}

fn decode_value(r: &mut Reader<'_>) -> SynthResult<Value> {
    Ok(match r.u8()? {
        0 => Value::Void,
        1 => Value::Int(i32::from_le_bytes(r.array()?)),
        2 => Value::Long(i64::from_le_bytes(r.array()?)),
        3 => Value::Float(f32::from_bits(r.u32()?)),
        4 => Value::Double(f64::from_bits(u64::from_le_bytes(r.array()?))),
        5 => Value::NULL,
        6 => Value::string(r.string()?),
        tag => return Err(malformed(format!("unknown constant tag {tag}"))),
    })
}

fn decode_op(r: &mut Reader<'_>) -> SynthResult<NamedOp> {
    match r.u8()? {
        0 => {
            let op = match r.u8()? {
                0 => BootstrapOp::Identity(r.basic_type()?),
                1 => BootstrapOp::Zero(r.basic_type()?),
                2 => BootstrapOp::Add(r.basic_type()?),
                3 => BootstrapOp::Sub(r.basic_type()?),
                4 => BootstrapOp::Mul(r.basic_type()?),
                5 => BootstrapOp::InvokeBasic(Signature::parse(&r.string()?)?),
                6 => BootstrapOp::GetField { slot: r.u16()?, ty: r.basic_type()? },
                7 => BootstrapOp::Convert {
                    from: r.value_type()?,
                    to: r.value_type()?,
                    call_site: r.value_type()?,
                },
                tag => return Err(malformed(format!("unknown bootstrap op {tag}"))),
            };
            Ok(NamedOp::bootstrap(op))
        }
        1 => {
            let owner = r.string()?;
            let name = r.string()?;
            let desc = r.string()?;
            let ty = MethodType::from_descriptor(&desc)
                .ok_or_else(|| malformed(format!("bad method descriptor `{desc}`")))?;
            Ok(NamedOp::member(MemberRef { owner, name }, ty))
        }
        tag => Err(malformed(format!("unknown linkage {tag}"))),
    }
}

fn decode_insn(r: &mut Reader<'_>) -> SynthResult<Insn> {
    Ok(match r.u8()? {
        0 => Insn::Load(r.u16()?),
        1 => Insn::Store(r.u16()?),
        2 => Insn::Const(r.u16()?),
        3 => Insn::Call(r.u16()?),
        4 => {
            let tag = r.u8()?;
            Insn::Widen(Widening::from_u8(tag).ok_or_else(|| malformed(format!("unknown widening {tag}")))?)
        }
        5 => Insn::Box(r.prim_type()?),
        6 => Insn::Unbox { owner: r.ref_type()?, to: r.prim_type()? },
        7 => Insn::CheckCast(r.ref_type()?),
        8 => Insn::Return,
        9 => Insn::ReturnVoid,
        op => return Err(malformed(format!("unknown opcode {op}"))),
    })
}

fn malformed(msg: impl Into<String>) -> SynthError {
    SynthError::Malformed(msg.into())
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize) -> SynthResult<&'a [u8]> {
        let end = self.pos.checked_add(n).filter(|end| *end <= self.bytes.len());
        let end = end.ok_or_else(|| malformed(format!("truncated at byte {}", self.pos)))?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self) -> SynthResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn u8(&mut self) -> SynthResult<u8> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> SynthResult<u16> {
        Ok(u16::from_le_bytes(self.array()?))
    }

    fn u32(&mut self) -> SynthResult<u32> {
        Ok(u32::from_le_bytes(self.array()?))
    }

    fn string(&mut self) -> SynthResult<String> {
        let len = self.u32()? as usize;
        let raw = self.take(len)?;
        String::from_utf8(raw.to_vec()).map_err(|_| malformed("string is not UTF-8"))
    }

    fn basic_type(&mut self) -> SynthResult<BasicType> {
        let c = self.u8()? as char;
        BasicType::from_char(c).ok_or_else(|| malformed(format!("bad basic type `{c}`")))
    }

    fn prim_type(&mut self) -> SynthResult<PrimType> {
        let c = self.u8()? as char;
        PrimType::from_descriptor(c).ok_or_else(|| malformed(format!("bad primitive `{c}`")))
    }

    fn value_type(&mut self) -> SynthResult<ValueType> {
        let desc = self.string()?;
        ValueType::from_descriptor(&desc).ok_or_else(|| malformed(format!("bad descriptor `{desc}`")))
    }

    fn ref_type(&mut self) -> SynthResult<RefType> {
        match self.value_type()? {
            ValueType::Ref(r) => Ok(r),
            other => Err(malformed(format!("expected a reference type, found {other}"))),
        }
    }
}
