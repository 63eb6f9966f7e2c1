//! Text stream format for built-in payloads.
//!
//! - vectors: `[n](x0,x1,...)`
//! - matrices: `[rows,cols]((r0c0,r0c1,...),(r1c0,...),...)`
//! - scalars and booleans: their plain `Display` form

use core::fmt;
use core::str::FromStr;

use nalgebra::{DMatrix, DVector, Matrix4};

use crate::error::{DgError, DgResult};

pub fn write_vector(out: &mut dyn fmt::Write, v: &DVector<f64>) -> fmt::Result {
    write!(out, "[{}](", v.len())?;
    write_row(out, v.iter().copied())?;
    out.write_str(")")
}

pub fn write_matrix(out: &mut dyn fmt::Write, m: &DMatrix<f64>) -> fmt::Result {
    write!(out, "[{},{}](", m.nrows(), m.ncols())?;
    for (i, row) in m.row_iter().enumerate() {
        if i > 0 {
            out.write_str(",")?;
        }
        out.write_str("(")?;
        write_row(out, row.iter().copied())?;
        out.write_str(")")?;
    }
    out.write_str(")")
}

fn write_row(out: &mut dyn fmt::Write, items: impl Iterator<Item = f64>) -> fmt::Result {
    for (i, x) in items.enumerate() {
        if i > 0 {
            out.write_str(",")?;
        }
        write!(out, "{x}")?;
    }
    Ok(())
}

pub fn parse_scalar<T: FromStr>(text: &str, what: &'static str) -> DgResult<T> {
    text.trim()
        .parse::<T>()
        .map_err(|_| DgError::parse(what, format!("'{}' is not a valid {what}", text.trim())))
}

pub fn parse_bool(text: &str) -> DgResult<bool> {
    match text.trim() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        other => Err(DgError::parse("bool", format!("'{other}' is not a boolean"))),
    }
}

pub fn parse_vector(text: &str) -> DgResult<DVector<f64>> {
    let (dims, body) = split_header(text, "vector")?;
    let [n] = dims[..] else {
        return Err(DgError::parse("vector", "header must hold one dimension"));
    };
    let items = parse_row(body, "vector")?;
    if items.len() != n {
        return Err(DgError::parse(
            "vector",
            format!("declared {n} elements, found {}", items.len()),
        ));
    }
    Ok(DVector::from_vec(items))
}

pub fn parse_matrix(text: &str) -> DgResult<DMatrix<f64>> {
    let (dims, body) = split_header(text, "matrix")?;
    let [rows, cols] = dims[..] else {
        return Err(DgError::parse("matrix", "header must hold two dimensions"));
    };
    rows.checked_mul(cols)
        .ok_or_else(|| DgError::parse("matrix", format!("{rows}x{cols} is too large")))?;
    let groups = if body.trim().is_empty() {
        Vec::new()
    } else {
        split_top_level(body)
    };
    if groups.len() != rows {
        return Err(DgError::parse(
            "matrix",
            format!("declared {rows} rows, found {}", groups.len()),
        ));
    }
    let mut data = Vec::new();
    for group in groups {
        let row = strip_parens(group, "matrix")?;
        let items = parse_row(row, "matrix")?;
        if items.len() != cols {
            return Err(DgError::parse(
                "matrix",
                format!("declared {cols} columns, found a row of {}", items.len()),
            ));
        }
        data.extend(items);
    }
    Ok(DMatrix::from_row_slice(rows, cols, &data))
}

pub fn parse_matrix4(text: &str) -> DgResult<Matrix4<f64>> {
    let m = parse_matrix(text)?;
    if m.shape() != (4, 4) {
        return Err(DgError::parse("matrix4d", "expected a 4x4 matrix"));
    }
    Ok(Matrix4::from_iterator(m.iter().copied()))
}

/// Split `[a,b](body)` into the dimensions and the body between the outer parentheses.
fn split_header<'a>(text: &'a str, what: &'static str) -> DgResult<(Vec<usize>, &'a str)> {
    let text = text.trim();
    let rest = text
        .strip_prefix('[')
        .ok_or_else(|| DgError::parse(what, "missing '[' header"))?;
    let close = rest
        .find(']')
        .ok_or_else(|| DgError::parse(what, "unterminated '[' header"))?;
    let dims = rest[..close]
        .split(',')
        .map(|d| parse_scalar::<usize>(d, "dimension"))
        .collect::<DgResult<Vec<_>>>()?;
    let body = strip_parens(&rest[close + 1..], what)?;
    Ok((dims, body))
}

fn strip_parens<'a>(text: &'a str, what: &'static str) -> DgResult<&'a str> {
    text.trim()
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .ok_or_else(|| DgError::parse(what, format!("'{}' is not parenthesized", text.trim())))
}

fn parse_row(body: &str, what: &'static str) -> DgResult<Vec<f64>> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }
    body.split(',').map(|x| parse_scalar::<f64>(x, what)).collect()
}

/// Split on commas that are not nested inside parentheses.
fn split_top_level(body: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in body.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&body[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&body[start..]);
    parts
}
