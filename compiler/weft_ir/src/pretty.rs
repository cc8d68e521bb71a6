//! Pretty-printing of expressions for diagnostics.

use crate::{BinaryOp, ExprArena, ExprId, ExprKind, StringInterner, SymbolTable};

/// Render an expression the way it was (approximately) spelled.
pub fn pretty_expr(
    arena: &ExprArena,
    table: &SymbolTable,
    interner: &StringInterner,
    id: ExprId,
) -> String {
    let mut out = String::new();
    write_expr(&mut out, arena, table, interner, id);
    out
}

fn write_expr(
    out: &mut String,
    arena: &ExprArena,
    table: &SymbolTable,
    interner: &StringInterner,
    id: ExprId,
) {
    match arena.kind(id) {
        ExprKind::Int(v) => out.push_str(&v.to_string()),
        ExprKind::Symbol(sym) => out.push_str(interner.resolve(table.get(*sym).name)),
        ExprKind::Opaque(name) => out.push_str(interner.resolve(*name)),
        ExprKind::Binary { op, lhs, rhs } => {
            let op_text = match op {
                BinaryOp::Add => " + ",
                BinaryOp::Sub => " - ",
                BinaryOp::Mul => " * ",
                BinaryOp::Div => " / ",
                BinaryOp::Lt => " < ",
            };
            write_expr(out, arena, table, interner, *lhs);
            out.push_str(op_text);
            write_expr(out, arena, table, interner, *rhs);
        }
        ExprKind::Subscript { base, indices } => {
            write_expr(out, arena, table, interner, *base);
            for index in indices {
                out.push('[');
                write_expr(out, arena, table, interner, *index);
                out.push(']');
            }
        }
        ExprKind::Range {
            lower,
            upper,
            stride,
        } => {
            write_expr(out, arena, table, interner, *lower);
            out.push(':');
            write_expr(out, arena, table, interner, *upper);
            out.push(':');
            write_expr(out, arena, table, interner, *stride);
        }
    }
}
