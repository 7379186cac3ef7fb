//! Canonical, in-scope pretty-printing of values.
//!
//! This is the internal rendering used for error-message identifiers and for
//! naming synthetic constants; it is deliberately not the CLI-facing
//! formatter (colors, source spans, user phrasing) — that layer is out of
//! scope here and is expected to wrap these strings, not replace them.

use crate::scalar::format_scalar_constant;
use crate::value::{Constant, Equation, Primitive, Value};

pub fn pretty_constant(c: &Constant) -> String {
    format_scalar_constant(&c.name)
}

pub fn pretty_value(v: &Value) -> String {
    match v {
        Value::Constant(c) => pretty_constant(c),
        Value::Primitive(p) => pretty_primitive_canonical(p),
        Value::Equation(e) => pretty_equation(e),
    }
}

/// Renders a primitive application in canonical `NAME(a, b, c)` form,
/// recursing into its arguments. Used for both diagnostics and for
/// deriving stable names for rewrite-synthesised constants.
pub fn pretty_primitive_canonical(p: &Primitive) -> String {
    let args: Vec<String> = p.arguments.iter().map(pretty_value).collect();
    let check = if p.check { "?" } else { "" };
    format!("{}{}({})", p.id.name(), check, args.join(", "))
}

fn pretty_equation(e: &Equation) -> String {
    let parts: Vec<String> = e.values.iter().map(pretty_value).collect();
    parts.join("^")
}
