//! Variable declaration rendering.

use crate::var::Variable;
use std::fmt::Write;
use svgen_common::{InternalError, SvgenResult};

/// Writes the declaration of `var` without a terminating `;`.
///
/// `//` comments out arrays with a zero dimension. Constants are
/// `localparam`s with their initializer: single-bit unsigned values as `0`
/// or `1`, others as `'d` decimals, arrays as nested `'{ .. }` lists.
pub fn write_decl(out: &mut String, var: &Variable) -> SvgenResult<()> {
    if var.array_dims.contains(&0) {
        out.push_str("//");
    }
    if var.is_constant() {
        out.push_str("localparam ");
    }
    out.push_str("logic ");
    if var.signed {
        out.push_str("signed ");
    }
    if var.bitwidth > 1 {
        write!(out, "[{}:0] ", var.bitwidth - 1)?;
    }
    out.push_str(&var.name);
    for dim in &var.array_dims {
        write!(out, "[{dim}]")?;
    }

    if var.is_constant() {
        out.push_str(" = ");
        if var.array_dims.is_empty() {
            write_value(out, var.init_vals[0], var.is_bool())?;
        } else {
            let needed: usize = var.array_dims.iter().product();
            if var.init_vals.len() < needed {
                return Err(InternalError::new(format!(
                    "constant `{}` has {} initializers for {needed} elements",
                    var.name,
                    var.init_vals.len()
                )));
            }
            let mut values = var.init_vals.iter().copied();
            write_array(out, &var.array_dims, &mut values, var.is_bool())?;
        }
    }

    if !var.comment.is_empty() {
        write!(out, " /*{}*/", var.comment)?;
    }
    Ok(())
}

fn write_value(out: &mut String, value: i128, is_bool: bool) -> std::fmt::Result {
    if is_bool {
        out.push(if value == 0 { '0' } else { '1' });
        return Ok(());
    }
    if value < 0 {
        out.push('-');
    }
    write!(out, "'d{}", value.unsigned_abs())
}

fn write_array(
    out: &mut String,
    dims: &[usize],
    values: &mut impl Iterator<Item = i128>,
    is_bool: bool,
) -> std::fmt::Result {
    out.push_str("'{ ");
    for i in 0..dims[0] {
        if i > 0 {
            out.push_str(", ");
        }
        if dims.len() == 1 {
            write_value(out, values.next().unwrap_or_default(), is_bool)?;
        } else {
            write_array(out, &dims[1..], values, is_bool)?;
        }
    }
    out.push_str(" }");
    Ok(())
}
