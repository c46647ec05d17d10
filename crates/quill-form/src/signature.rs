// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! Erased signatures (`II_I`), the cache key of every shape.

use std::fmt;

use crate::error::FormError;
use crate::types::{BasicType, MethodType};

/// Erased parameter kinds plus an erased return kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Signature {
    params: Vec<BasicType>,
    ret: BasicType,
}

impl Signature {
    /// `params` must not contain `V`; use [`Signature::parse`] for untrusted input.
    pub fn new(params: Vec<BasicType>, ret: BasicType) -> Self {
        debug_assert!(params.iter().all(|p| p.is_arg()), "void parameter in signature");
        Signature { params, ret }
    }

    /// Parses `[LIJFD]*_[LIJFDV]`.
    pub fn parse(text: &str) -> Result<Signature, FormError> {
        let invalid = || FormError::InvalidSignature(text.to_string());
        let (params, ret) = text.split_once('_').ok_or_else(invalid)?;
        let params = params
            .chars()
            .map(|c| BasicType::from_char(c).filter(|b| b.is_arg()))
            .collect::<Option<Vec<_>>>()
            .ok_or_else(invalid)?;
        let mut ret_chars = ret.chars();
        let ret = match (ret_chars.next(), ret_chars.next()) {
            (Some(c), None) => BasicType::from_char(c).ok_or_else(invalid)?,
            _ => return Err(invalid()),
        };
        Ok(Signature { params, ret })
    }

    pub fn params(&self) -> &[BasicType] {
        &self.params
    }

    pub fn ret(&self) -> BasicType {
        self.ret
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// The same signature with `bt` prepended as a leading parameter.
    pub fn with_leading(&self, bt: BasicType) -> Signature {
        let mut params = Vec::with_capacity(self.params.len() + 1);
        params.push(bt);
        params.extend_from_slice(&self.params);
        Signature::new(params, self.ret)
    }

    /// The same signature without its first `count` parameters.
    pub fn drop_leading(&self, count: usize) -> Signature {
        Signature::new(self.params[count.min(self.params.len())..].to_vec(), self.ret)
    }

    pub fn to_method_type(&self) -> MethodType {
        MethodType::new(
            self.ret.erased(),
            self.params.iter().map(|p| p.erased()).collect(),
        )
    }

    /// Parameter letters with runs of three or more compressed (`LLLL` → `L4`).
    pub fn shortened_params(&self) -> String {
        let mut out = String::new();
        let mut i = 0;
        while i < self.params.len() {
            let c = self.params[i];
            let mut run = 1;
            while i + run < self.params.len() && self.params[i + run] == c {
                run += 1;
            }
            out.push(c.as_char());
            if run >= 3 {
                out.push_str(&run.to_string());
            } else if run == 2 {
                out.push(c.as_char());
            }
            i += run;
        }
        out
    }

    /// Compressed form used in generated entry names: `LLLL_L` → `L4_L`.
    pub fn shortened(&self) -> String {
        format!("{}_{}", self.shortened_params(), self.ret)
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for p in &self.params {
            write!(f, "{p}")?;
        }
        write!(f, "_{}", self.ret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_display() {
        let sig = Signature::parse("LIJ_V").unwrap();
        assert_eq!(sig.params(), &[BasicType::L, BasicType::I, BasicType::J]);
        assert_eq!(sig.ret(), BasicType::V);
        assert_eq!(sig.to_string(), "LIJ_V");
        assert_eq!(Signature::parse("_I").unwrap().arity(), 0);
    }

    #[test]
    fn parse_rejects_malformed() {
        for bad in ["II", "IV_I", "IZ_I", "I_", "I_II", "i_I"] {
            assert_eq!(
                Signature::parse(bad),
                Err(FormError::InvalidSignature(bad.to_string())),
                "{bad}"
            );
        }
    }

    #[test]
    fn shortening_compresses_long_runs() {
        assert_eq!(Signature::parse("LLLL_L").unwrap().shortened(), "L4_L");
        assert_eq!(Signature::parse("LLIIIJ_I").unwrap().shortened(), "LLI3J_I");
        assert_eq!(Signature::parse("II_I").unwrap().shortened(), "II_I");
    }

    #[test]
    fn leading_parameter_edits() {
        let sig = Signature::parse("II_I").unwrap();
        let bound = sig.with_leading(BasicType::L);
        assert_eq!(bound.to_string(), "LII_I");
        assert_eq!(bound.drop_leading(1), sig);
    }
}
