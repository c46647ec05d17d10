// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! Pretty-printing for forms.

use std::fmt;

use crate::form::Form;
use crate::name::{Arg, NameDef};

impl Form {
    fn write_ref(&self, f: &mut fmt::Formatter<'_>, index: usize) -> fmt::Result {
        let prefix = if index < self.arity() { 'a' } else { 't' };
        write!(f, "{prefix}{index}")
    }
}

impl fmt::Display for Form {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}=Lambda(", self.name())?;
        for (i, name) in self.names()[..self.arity()].iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "a{}:{}", name.index(), name.ty())?;
        }
        writeln!(f, ")=>{{")?;

        for name in &self.names()[self.arity()..] {
            let NameDef::Apply { op, args } = name.def() else {
                continue;
            };
            write!(f, "    t{}:{}={}(", name.index(), name.ty(), op)?;
            for (i, arg) in args.iter().enumerate() {
                if i > 0 {
                    write!(f, ",")?;
                }
                match arg {
                    Arg::Name(target) => self.write_ref(f, *target)?,
                    Arg::Const(value) => write!(f, "{value}")?,
                }
            }
            writeln!(f, ");")?;
        }

        write!(f, "    ")?;
        match self.result() {
            Some(index) => self.write_ref(f, index)?,
            None => write!(f, "void")?,
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use crate::form::Form;
    use crate::kind::Kind;
    use crate::name::{Arg, BootstrapOp, NamedOp};
    use crate::signature::Signature;
    use crate::types::BasicType;
    use crate::value::Value;

    #[test]
    fn renders_like_a_lambda() {
        let form = Form::build(
            Kind::Add,
            Signature::parse("II_I").unwrap(),
            vec![
                (NamedOp::bootstrap(BootstrapOp::Add(BasicType::I)), vec![Arg::Name(0), Arg::Name(1)]),
                (NamedOp::bootstrap(BootstrapOp::Add(BasicType::I)), vec![Arg::Name(2), Arg::Const(Value::Int(1))]),
            ],
        )
        .unwrap();
        let expected = "add_II_I=Lambda(a0:I,a1:I)=>{\n    t2:I=LF.add_I(a0,a1);\n    t3:I=LF.add_I(t2,1);\n    t3}";
        assert_eq!(form.to_string(), expected);
    }
}
