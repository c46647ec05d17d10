// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! Box/unbox/widen sequences between declared types.

use quill_form::{BasicType, PrimType, RefType, ValueType};

use crate::error::{SynthError, SynthResult};
use crate::insn::{Insn, Widening};

/// Instructions converting a value declared `arg` into `target`, where the
/// call site sees the value as `call_site`.
///
/// Cases are tried in a fixed order and the order is observable: it decides
/// which failure a bad conversion reports at call time.
pub fn convert(arg: &ValueType, target: &ValueType, call_site: &ValueType) -> SynthResult<Vec<Insn>> {
    let mut code = Vec::new();
    if arg == target && arg == call_site {
        return Ok(code);
    }
    if arg.is_void() || target.is_void() {
        return Ok(code);
    }

    match (arg, target) {
        (ValueType::Prim(from), ValueType::Prim(to)) => widen(*from, *to, &mut code)?,

        (ValueType::Prim(from), ValueType::Ref(to)) => match to.wrapped() {
            Some(wrapper) => {
                widen(*from, wrapper, &mut code)?;
                code.push(Insn::Box(wrapper));
            }
            None => {
                code.push(Insn::Box(*from));
                cast(&RefType::Boxed(*from), to, &mut code);
            }
        },

        (ValueType::Ref(from), ValueType::Prim(to)) => {
            let source = seen_at_call_site(from, call_site, &mut code);
            match source.wrapped() {
                Some(wrapper) if wrapper.is_numeric() => {
                    code.push(Insn::Unbox { owner: source.clone(), to: *to });
                }
                Some(wrapper) => {
                    code.push(Insn::Unbox { owner: source.clone(), to: wrapper });
                    widen(wrapper, *to, &mut code)?;
                }
                None => {
                    let intermediate = if to.is_numeric() {
                        RefType::Number
                    } else {
                        RefType::Boxed(*to)
                    };
                    cast(&source, &intermediate, &mut code);
                    code.push(Insn::Unbox { owner: intermediate, to: *to });
                }
            }
        }

        (ValueType::Ref(from), ValueType::Ref(to)) => {
            let source = seen_at_call_site(from, call_site, &mut code);
            cast(&source, to, &mut code);
        }
    }
    Ok(code)
}

/// Check applied when a value of erased type is passed to a parameter
/// declared `param`; only reference parameters narrower than `Object` need one.
pub fn param_check(param: &ValueType) -> Option<Insn> {
    match param {
        ValueType::Ref(r) if *r != RefType::Object => Some(Insn::CheckCast(r.clone())),
        _ => None,
    }
}

fn seen_at_call_site(from: &RefType, call_site: &ValueType, code: &mut Vec<Insn>) -> RefType {
    match call_site {
        ValueType::Ref(site) => {
            cast(from, site, code);
            site.clone()
        }
        ValueType::Prim(_) => from.clone(),
    }
}

fn cast(from: &RefType, to: &RefType, code: &mut Vec<Insn>) {
    if from != to && *to != RefType::Object {
        code.push(Insn::CheckCast(to.clone()));
    }
}

fn widen(from: PrimType, to: PrimType, code: &mut Vec<Insn>) -> SynthResult<()> {
    if !from.widens_to(to) {
        return Err(SynthError::IllegalConversion {
            from: ValueType::Prim(from),
            to: ValueType::Prim(to),
        });
    }
    let widening = match (from.basic_type(), to.basic_type()) {
        (BasicType::I, BasicType::J) => Widening::I2L,
        (BasicType::I, BasicType::F) => Widening::I2F,
        (BasicType::I, BasicType::D) => Widening::I2D,
        (BasicType::J, BasicType::F) => Widening::L2F,
        (BasicType::J, BasicType::D) => Widening::L2D,
        (BasicType::F, BasicType::D) => Widening::F2D,
        _ => return Ok(()),
    };
    code.push(Insn::Widen(widening));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wrapper(p: PrimType) -> ValueType {
        ValueType::boxed(p)
    }

    fn ok(arg: ValueType, target: ValueType, call_site: ValueType) -> Vec<Insn> {
        convert(&arg, &target, &call_site).unwrap()
    }

    // ── primitive → primitive ───────────────────────────────────

    #[test]
    fn identical_types_emit_nothing() {
        assert!(ok(ValueType::INT, ValueType::INT, ValueType::INT).is_empty());
        assert!(ok(ValueType::STRING, ValueType::STRING, ValueType::STRING).is_empty());
    }

    #[test]
    fn void_on_either_side_emits_nothing() {
        assert!(ok(ValueType::VOID, ValueType::INT, ValueType::OBJECT).is_empty());
        assert!(ok(ValueType::OBJECT, ValueType::VOID, ValueType::OBJECT).is_empty());
    }

    #[test]
    fn primitive_widening() {
        assert_eq!(ok(ValueType::INT, ValueType::LONG, ValueType::INT), vec![Insn::Widen(Widening::I2L)]);
        assert_eq!(ok(ValueType::CHAR, ValueType::DOUBLE, ValueType::CHAR), vec![Insn::Widen(Widening::I2D)]);
        assert_eq!(ok(ValueType::LONG, ValueType::FLOAT, ValueType::LONG), vec![Insn::Widen(Widening::L2F)]);
        assert!(ok(ValueType::BYTE, ValueType::INT, ValueType::BYTE).is_empty());
    }

    #[test]
    fn narrowing_is_rejected() {
        let err = convert(&ValueType::LONG, &ValueType::INT, &ValueType::LONG).unwrap_err();
        assert!(matches!(err, SynthError::IllegalConversion { .. }));
        assert!(convert(&ValueType::INT, &ValueType::CHAR, &ValueType::INT).is_err());
        assert!(convert(&ValueType::BOOLEAN, &ValueType::INT, &ValueType::BOOLEAN).is_err());
    }

    // ── primitive → reference ───────────────────────────────────

    #[test]
    fn int_to_integer_is_box_only() {
        assert_eq!(
            ok(ValueType::INT, wrapper(PrimType::Int), ValueType::OBJECT),
            vec![Insn::Box(PrimType::Int)]
        );
    }

    #[test]
    fn widen_then_box_into_wider_wrapper() {
        assert_eq!(
            ok(ValueType::INT, wrapper(PrimType::Long), ValueType::OBJECT),
            vec![Insn::Widen(Widening::I2L), Insn::Box(PrimType::Long)]
        );
        assert!(convert(&ValueType::LONG, &wrapper(PrimType::Int), &ValueType::OBJECT).is_err());
    }

    #[test]
    fn box_then_cast_for_other_references() {
        assert_eq!(ok(ValueType::INT, ValueType::OBJECT, ValueType::OBJECT), vec![Insn::Box(PrimType::Int)]);
        assert_eq!(
            ok(ValueType::DOUBLE, ValueType::NUMBER, ValueType::OBJECT),
            vec![Insn::Box(PrimType::Double), Insn::CheckCast(RefType::Number)]
        );
    }

    // ── reference → primitive ───────────────────────────────────

    #[test]
    fn number_to_int_unboxes() {
        assert_eq!(
            ok(ValueType::NUMBER, ValueType::INT, ValueType::NUMBER),
            vec![Insn::Unbox { owner: RefType::Number, to: PrimType::Int }]
        );
        assert_eq!(
            ok(ValueType::NUMBER, ValueType::INT, ValueType::INT),
            vec![Insn::Unbox { owner: RefType::Number, to: PrimType::Int }]
        );
    }

    #[test]
    fn numeric_wrapper_unboxes_directly_to_target() {
        assert_eq!(
            ok(wrapper(PrimType::Int), ValueType::LONG, ValueType::LONG),
            vec![Insn::Unbox { owner: RefType::Boxed(PrimType::Int), to: PrimType::Long }]
        );
    }

    #[test]
    fn character_unboxes_then_widens() {
        assert_eq!(
            ok(wrapper(PrimType::Char), ValueType::LONG, ValueType::LONG),
            vec![
                Insn::Unbox { owner: RefType::Boxed(PrimType::Char), to: PrimType::Char },
                Insn::Widen(Widening::I2L),
            ]
        );
        assert!(convert(&wrapper(PrimType::Boolean), &ValueType::INT, &ValueType::INT).is_err());
    }

    #[test]
    fn object_goes_through_canonical_wrapper() {
        assert_eq!(
            ok(ValueType::OBJECT, ValueType::INT, ValueType::OBJECT),
            vec![
                Insn::CheckCast(RefType::Number),
                Insn::Unbox { owner: RefType::Number, to: PrimType::Int },
            ]
        );
        assert_eq!(
            ok(ValueType::OBJECT, ValueType::CHAR, ValueType::OBJECT),
            vec![
                Insn::CheckCast(RefType::Boxed(PrimType::Char)),
                Insn::Unbox { owner: RefType::Boxed(PrimType::Char), to: PrimType::Char },
            ]
        );
    }

    #[test]
    fn call_site_reference_type_is_cast_first() {
        assert_eq!(
            ok(ValueType::OBJECT, ValueType::INT, wrapper(PrimType::Short)),
            vec![
                Insn::CheckCast(RefType::Boxed(PrimType::Short)),
                Insn::Unbox { owner: RefType::Boxed(PrimType::Short), to: PrimType::Int },
            ]
        );
    }

    // ── reference → reference ───────────────────────────────────

    #[test]
    fn reference_casts_only_when_needed() {
        assert_eq!(
            ok(ValueType::OBJECT, ValueType::STRING, ValueType::OBJECT),
            vec![Insn::CheckCast(RefType::String)]
        );
        assert!(ok(ValueType::STRING, ValueType::OBJECT, ValueType::OBJECT).is_empty());
        // Seen as Object at the call site, so the value is cast back.
        assert_eq!(
            ok(ValueType::STRING, ValueType::STRING, ValueType::OBJECT),
            vec![Insn::CheckCast(RefType::String)]
        );
    }

    #[test]
    fn param_checks() {
        assert_eq!(param_check(&ValueType::OBJECT), None);
        assert_eq!(param_check(&ValueType::INT), None);
        assert_eq!(param_check(&ValueType::STRING), Some(Insn::CheckCast(RefType::String)));
    }
}
