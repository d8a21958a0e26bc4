//! pass — Return the arguments unchanged, as a list.

use std::sync::LazyLock;

use pl_types::{Signature, Value, ValueType};

use crate::functions::{Function, FunctionError};

/// Identity over any number of values.
///
/// The list return is flattened by the pipeline, so `(a | pass)` yields
/// exactly what `a` yielded.
pub struct Pass;

static SIGNATURE: LazyLock<Signature> =
    LazyLock::new(|| Signature::new().variadic(ValueType::Any).returns(ValueType::List));

impl Function for Pass {
    fn signature(&self) -> &Signature {
        &SIGNATURE
    }

    fn call(&self, args: Vec<Value>) -> Result<Value, FunctionError> {
        Ok(Value::List(args))
    }
}
