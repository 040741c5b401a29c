use std::cmp::Ordering;
use std::fmt;
use std::fmt::{Display, Formatter};

use either::Either;
use either::Either::{Left, Right};

use crate::kanp::interpreted::interpreter::kanp_value::KanpValue::{Bool, Float, Integer, Void};

#[derive(Debug, PartialEq, Clone)]
pub enum KanpValue {
    Integer(i64),
    Float(f64),
    String(String),
    Bool(bool),
    /// What a call evaluates to when its body never returns.
    Void,
}

impl KanpValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            Integer(_) => "Integer",
            Float(_) => "Float",
            KanpValue::String(_) => "String",
            Bool(_) => "Bool",
            Void => "Void",
        }
    }

    pub fn stringify(&self) -> String {
        match self {
            Integer(i) => i.to_string(),
            Float(f) => render_float(*f),
            KanpValue::String(s) => s.to_owned(),
            Bool(true) => "True".to_owned(),
            Bool(false) => "False".to_owned(),
            Void => "None".to_owned(),
        }
    }

    pub fn truthiness(&self) -> bool {
        match self {
            Integer(i) => *i != 0,
            Float(f) => *f != 0.0,
            KanpValue::String(s) => !s.is_empty(),
            Bool(b) => *b,
            Void => false,
        }
    }

    /// Both operands as integers, or both widened to floats; `None` if either isn't a number.
    pub fn numeric_pair(&self, other: &KanpValue) -> Option<Either<(i64, i64), (f64, f64)>> {
        match (self, other) {
            (Integer(a), Integer(b)) => Some(Left((*a, *b))),
            (Integer(a), Float(b)) => Some(Right((*a as f64, *b))),
            (Float(a), Integer(b)) => Some(Right((*a, *b as f64))),
            (Float(a), Float(b)) => Some(Right((*a, *b))),
            _ => None,
        }
    }

    pub fn equal_equal(&self, other: &KanpValue) -> bool {
        match self.numeric_pair(other) {
            Some(Left((a, b))) => a == b,
            Some(Right((a, b))) => a == b,
            None => match (self, other) {
                (KanpValue::String(s1), KanpValue::String(s2)) => s1 == s2,
                (Bool(b1), Bool(b2)) => b1 == b2,
                (Void, Void) => true,
                _ => false,
            },
        }
    }

    /// `None` when the two values have no ordering between them.
    pub fn compare(&self, other: &KanpValue) -> Option<Ordering> {
        match self.numeric_pair(other) {
            Some(Left((a, b))) => Some(a.cmp(&b)),
            Some(Right((a, b))) => a.partial_cmp(&b),
            None => match (self, other) {
                (KanpValue::String(s1), KanpValue::String(s2)) => Some(s1.cmp(s2)),
                (Bool(b1), Bool(b2)) => Some(b1.cmp(b2)),
                _ => None,
            },
        }
    }
}

// Debug formatting keeps the fractional part (2.0, not 2) and switches to scientific notation at
// the same magnitudes; the exponent just needs its sign and two digits, as in 1e+17 or 1e-07.
fn render_float(f: f64) -> String {
    if f.is_nan() {
        return "nan".to_owned();
    }
    let debug = format!("{:?}", f);
    match debug.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{}e{}{:0>2}", mantissa, sign, digits)
        }
        None => debug,
    }
}

impl Display for KanpValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.stringify())
    }
}
