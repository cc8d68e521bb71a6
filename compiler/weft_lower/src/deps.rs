//! Dependence validity filtering.
//!
//! A dependence naming a bare function parameter of non-reference type is
//! useless: parameters are copied, so their value is never visible outside
//! the call. Input dependences of this shape are dropped with a warning;
//! output (or inout) dependences are a user error. The check runs once per
//! declared function-task parameter list, in registration order, and the
//! filtered set is never re-validated later.

use weft_ir::{bare_symbol, pretty_expr, DepDirection, DependencyItem, ExprId};

use crate::{LowerContext, LowerError, LowerResult};

/// True when the dependence expression only names a by-value parameter.
fn bare_value_parameter(ctx: &LowerContext, expr: ExprId) -> bool {
    bare_symbol(&ctx.arena, expr).is_some_and(|sym| {
        let symbol = ctx.symbols.get(sym);
        symbol.is_parameter && !symbol.is_reference
    })
}

/// Filter a function task's dependence list in place.
///
/// Fatal when an output dependence only names a bare parameter; input
/// dependences of that shape are removed after a warning.
pub fn dependence_list_check(
    ctx: &mut LowerContext,
    items: &mut Vec<DependencyItem>,
) -> LowerResult<()> {
    let mut fatal = false;
    for item in items.iter() {
        if !bare_value_parameter(ctx, item.expr) {
            continue;
        }
        let spelled = pretty_expr(&ctx.arena, &ctx.symbols, &ctx.interner, item.expr);
        let span = ctx.arena.span(item.expr);
        if item.direction.contains(DepDirection::OUT) {
            ctx.error(
                span,
                format!(
                    "output dependence '{spelled}' only names a parameter. \
                     The value of a parameter is never copied out of a function \
                     so it cannot generate an output dependence"
                ),
            );
            fatal = true;
        } else {
            ctx.warning(
                span,
                format!(
                    "skipping useless dependence '{spelled}'. The value of a \
                     parameter is always copied and cannot define an input dependence"
                ),
            );
        }
    }
    if fatal {
        return Err(LowerError::ConstructAborted);
    }
    items.retain(|item| !bare_value_parameter(ctx, item.expr));
    Ok(())
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests {
    use super::*;
    use crate::test_util::TestUnit;
    use pretty_assertions::assert_eq;
    use weft_diagnostic::Severity;

    #[test]
    fn input_dependence_on_bare_parameter_is_dropped_with_one_warning() {
        let mut unit = TestUnit::new();
        let p = unit.parameter("p", false);
        let v = unit.variable("v");
        let p_ref = unit.ctx.arena.symbol(p);
        let v_ref = unit.ctx.arena.symbol(v);
        let mut items = vec![
            DependencyItem::new(p_ref, DepDirection::IN),
            DependencyItem::new(v_ref, DepDirection::IN),
        ];

        dependence_list_check(&mut unit.ctx, &mut items).unwrap();

        assert_eq!(items, vec![DependencyItem::new(v_ref, DepDirection::IN)]);
        assert_eq!(unit.ctx.diagnostics.warning_count(), 1);
        assert_eq!(unit.ctx.diagnostics.error_count(), 0);
    }

    #[test]
    fn output_dependence_on_bare_parameter_is_fatal() {
        let mut unit = TestUnit::new();
        let p = unit.parameter("p", false);
        let p_ref = unit.ctx.arena.symbol(p);
        let mut items = vec![DependencyItem::new(p_ref, DepDirection::OUT)];

        let result = dependence_list_check(&mut unit.ctx, &mut items);

        assert_eq!(result, Err(LowerError::ConstructAborted));
        assert_eq!(unit.ctx.diagnostics.error_count(), 1);
        assert_eq!(
            unit.ctx.diagnostics.diagnostics()[0].severity,
            Severity::Error
        );
    }

    #[test]
    fn inout_counts_as_output() {
        let mut unit = TestUnit::new();
        let p = unit.parameter("p", false);
        let p_ref = unit.ctx.arena.symbol(p);
        let mut items = vec![DependencyItem::new(p_ref, DepDirection::INOUT)];
        assert_eq!(
            dependence_list_check(&mut unit.ctx, &mut items),
            Err(LowerError::ConstructAborted)
        );
    }

    #[test]
    fn reference_parameters_pass_through() {
        let mut unit = TestUnit::new();
        let r = unit.parameter("r", true);
        let r_ref = unit.ctx.arena.symbol(r);
        let mut items = vec![DependencyItem::new(r_ref, DepDirection::OUT)];
        dependence_list_check(&mut unit.ctx, &mut items).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(unit.ctx.diagnostics.error_count(), 0);
    }

    #[test]
    fn array_sections_over_parameters_pass_through() {
        let mut unit = TestUnit::new();
        let p = unit.parameter("p", false);
        let base = unit.ctx.arena.symbol(p);
        let lower = unit.ctx.arena.int(0);
        let upper = unit.ctx.arena.int(9);
        let one = unit.ctx.arena.int(1);
        let range = unit.ctx.arena.range(lower, upper, one);
        let section = unit.subscript(base, vec![range]);
        let mut items = vec![DependencyItem::new(section, DepDirection::OUT)];
        dependence_list_check(&mut unit.ctx, &mut items).unwrap();
        assert_eq!(items.len(), 1);
    }
}
