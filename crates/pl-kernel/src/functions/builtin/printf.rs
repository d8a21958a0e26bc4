//! printf — Format values into a string.
//!
//! Supported verbs: `%s %v %d %f %x %X %q %t %%`, with `-`, `+` and `0`
//! flags, a width and a `.precision`. Operand problems are rendered inline
//! instead of failing the call:
//!
//! - `%!d(MISSING)` when the format asks for more operands than given
//! - `%!d(string=hi)` when the operand does not fit the verb
//! - `%!(EXTRA int=3)` when operands are left over

use std::sync::LazyLock;

use pl_types::{Signature, Value, ValueType};

use crate::functions::{Function, FunctionError, str_arg};

/// Formatted output: `(printf "%s=%d" "x" 1)`.
pub struct Printf;

static SIGNATURE: LazyLock<Signature> = LazyLock::new(|| {
    Signature::new()
        .param(ValueType::String)
        .variadic(ValueType::Any)
        .returns(ValueType::String)
});

impl Function for Printf {
    fn signature(&self) -> &Signature {
        &SIGNATURE
    }

    fn call(&self, args: Vec<Value>) -> Result<Value, FunctionError> {
        let format = str_arg(&args, 0)?;
        Ok(Value::String(sprintf(format, &args[1..])))
    }
}

#[derive(Debug, Default)]
struct Spec {
    left: bool,
    plus: bool,
    zero: bool,
    width: Option<usize>,
    precision: Option<usize>,
}

/// Format `args` according to `format`.
pub fn sprintf(format: &str, args: &[Value]) -> String {
    let mut out = String::with_capacity(format.len());
    let mut used = 0;
    let mut chars = format.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }

        let mut spec = Spec::default();
        while let Some(&flag) = chars.peek() {
            match flag {
                '-' => spec.left = true,
                '+' => spec.plus = true,
                '0' => spec.zero = true,
                _ => break,
            }
            chars.next();
        }
        spec.width = take_number(&mut chars);
        if chars.peek() == Some(&'.') {
            chars.next();
            spec.precision = Some(take_number(&mut chars).unwrap_or(0));
        }

        let Some(verb) = chars.next() else {
            out.push_str("%!(NOVERB)");
            break;
        };
        if verb == '%' {
            out.push('%');
            continue;
        }

        match args.get(used) {
            Some(arg) => {
                used += 1;
                out.push_str(&format_operand(verb, &spec, arg));
            }
            None => out.push_str(&format!("%!{verb}(MISSING)")),
        }
    }

    if used < args.len() {
        let extra: Vec<String> = args[used..].iter().map(describe).collect();
        out.push_str(&format!("%!(EXTRA {})", extra.join(", ")));
    }

    out
}

fn take_number(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Option<usize> {
    let mut n: Option<usize> = None;
    while let Some(d) = chars.peek().and_then(|c| c.to_digit(10)) {
        n = Some(n.unwrap_or(0).saturating_mul(10).saturating_add(d as usize));
        chars.next();
    }
    n
}

/// `type=value`, the operand form used in inline error markers.
fn describe(arg: &Value) -> String {
    format!("{}={}", arg.value_type(), arg)
}

fn format_operand(verb: char, spec: &Spec, arg: &Value) -> String {
    let formatted = match (verb, arg) {
        ('s' | 'v', _) => {
            let text = arg.to_string();
            let text = match spec.precision {
                Some(p) if verb == 's' => text.chars().take(p).collect(),
                _ => text,
            };
            return pad(text, spec, false);
        }
        ('d', Value::Int(n)) => signed(n.to_string(), *n >= 0, spec),
        ('f' | 'F', Value::Float(f)) => {
            let precision = spec.precision.unwrap_or(6);
            signed(format!("{f:.precision$}"), *f >= 0.0, spec)
        }
        ('x', Value::Int(n)) => hex(*n, false),
        ('X', Value::Int(n)) => hex(*n, true),
        ('x', Value::String(s)) => s.bytes().map(|b| format!("{b:02x}")).collect(),
        ('X', Value::String(s)) => s.bytes().map(|b| format!("{b:02X}")).collect(),
        ('q', Value::String(s)) => format!("{s:?}"),
        ('t', Value::Bool(b)) => b.to_string(),
        _ => return format!("%!{verb}({})", describe(arg)),
    };
    pad(formatted, spec, true)
}

fn signed(digits: String, non_negative: bool, spec: &Spec) -> String {
    if spec.plus && non_negative {
        format!("+{digits}")
    } else {
        digits
    }
}

fn hex(n: i64, upper: bool) -> String {
    let digits = if upper {
        format!("{:X}", n.unsigned_abs())
    } else {
        format!("{:x}", n.unsigned_abs())
    };
    if n < 0 { format!("-{digits}") } else { digits }
}

fn pad(s: String, spec: &Spec, numeric: bool) -> String {
    let Some(width) = spec.width else {
        return s;
    };
    let len = s.chars().count();
    if len >= width {
        return s;
    }
    let fill = width - len;
    if spec.left {
        format!("{s}{}", " ".repeat(fill))
    } else if spec.zero && numeric {
        let (sign, digits) = match s.strip_prefix(['-', '+']) {
            Some(rest) => (&s[..1], rest),
            None => ("", s.as_str()),
        };
        format!("{sign}{}{digits}", "0".repeat(fill))
    } else {
        format!("{}{s}", " ".repeat(fill))
    }
}
