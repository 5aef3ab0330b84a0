// Copyright 2024 tison <wander4096@gmail.com>
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Evaluates the `IndexFilter` node: the minimal [`Expr`] language against one assembled row.
//! Comparisons on mismatched `PropValue` variants are conservatively `false` rather than a panic
//! or an error, matching the `IndexFilter` node's contract of dropping rows it cannot evaluate.

use std::cmp::Ordering;
use std::collections::HashMap;

use graphd_protos::filter::Expr;
use graphd_protos::property::PropValue;

fn compare(left: &PropValue, right: &PropValue) -> Option<Ordering> {
    match (left, right) {
        (PropValue::Int(a), PropValue::Int(b)) => a.partial_cmp(b),
        (PropValue::Float(a), PropValue::Float(b)) => a.partial_cmp(b),
        (PropValue::Int(a), PropValue::Float(b)) => (*a as f64).partial_cmp(b),
        (PropValue::Float(a), PropValue::Int(b)) => a.partial_cmp(&(*b as f64)),
        (PropValue::String(a), PropValue::String(b)) => a.partial_cmp(b),
        (PropValue::Bool(a), PropValue::Bool(b)) => a.partial_cmp(b),
        (PropValue::Date(a), PropValue::Date(b)) => a.partial_cmp(b),
        (PropValue::DateTime(a), PropValue::DateTime(b)) => a.partial_cmp(b),
        _ => None,
    }
}

fn resolve(expr: &Expr, row: &HashMap<String, PropValue>) -> Option<PropValue> {
    match expr {
        Expr::Column(name) => row.get(name).cloned(),
        Expr::Literal(value) => Some(value.clone()),
        _ => None,
    }
}

/// Evaluates `expr` against `row`, a flattened view of one result candidate's columns (index
/// fields plus, if the plan fetched it, the base row's properties).
pub fn evaluate(expr: &Expr, row: &HashMap<String, PropValue>) -> bool {
    match expr {
        Expr::Column(_) | Expr::Literal(_) => {
            matches!(resolve(expr, row), Some(PropValue::Bool(true)))
        }
        Expr::Eq(l, r) => match (resolve(l, row), resolve(r, row)) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        },
        Expr::Ne(l, r) => match (resolve(l, row), resolve(r, row)) {
            (Some(a), Some(b)) => a != b,
            _ => false,
        },
        Expr::Lt(l, r) => compare_exprs(l, r, row, |o| o == Ordering::Less),
        Expr::Le(l, r) => compare_exprs(l, r, row, |o| o != Ordering::Greater),
        Expr::Gt(l, r) => compare_exprs(l, r, row, |o| o == Ordering::Greater),
        Expr::Ge(l, r) => compare_exprs(l, r, row, |o| o != Ordering::Less),
        Expr::And(l, r) => evaluate(l, row) && evaluate(r, row),
        Expr::Or(l, r) => evaluate(l, row) || evaluate(r, row),
        Expr::Not(inner) => !evaluate(inner, row),
    }
}

fn compare_exprs(
    left: &Expr,
    right: &Expr,
    row: &HashMap<String, PropValue>,
    matches_ordering: impl Fn(Ordering) -> bool,
) -> bool {
    match (resolve(left, row), resolve(right, row)) {
        (Some(a), Some(b)) => compare(&a, &b).is_some_and(&matches_ordering),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> HashMap<String, PropValue> {
        HashMap::from([
            ("c1".to_string(), PropValue::Int(3)),
            ("c2".to_string(), PropValue::String("x".to_string())),
        ])
    }

    #[test]
    fn test_eq_and_ne() {
        let row = row();
        let e = Expr::Eq(
            Box::new(Expr::Column("c1".to_string())),
            Box::new(Expr::Literal(PropValue::Int(3))),
        );
        assert!(evaluate(&e, &row));
        let ne = Expr::Ne(
            Box::new(Expr::Column("c1".to_string())),
            Box::new(Expr::Literal(PropValue::Int(3))),
        );
        assert!(!evaluate(&ne, &row));
    }

    #[test]
    fn test_range_comparison() {
        let row = row();
        let gt = Expr::Gt(
            Box::new(Expr::Column("c1".to_string())),
            Box::new(Expr::Literal(PropValue::Int(1))),
        );
        assert!(evaluate(&gt, &row));
        let le = Expr::Le(
            Box::new(Expr::Column("c1".to_string())),
            Box::new(Expr::Literal(PropValue::Int(3))),
        );
        assert!(evaluate(&le, &row));
    }

    #[test]
    fn test_and_or_not() {
        let row = row();
        let a = Expr::Gt(
            Box::new(Expr::Column("c1".to_string())),
            Box::new(Expr::Literal(PropValue::Int(10))),
        );
        let b = Expr::Eq(
            Box::new(Expr::Column("c2".to_string())),
            Box::new(Expr::Literal(PropValue::String("x".to_string()))),
        );
        assert!(evaluate(&Expr::Or(Box::new(a.clone()), Box::new(b.clone())), &row));
        assert!(!evaluate(&Expr::And(Box::new(a.clone()), Box::new(b)), &row));
        assert!(evaluate(&Expr::Not(Box::new(a)), &row));
    }

    #[test]
    fn test_missing_column_is_false_not_panic() {
        let row = row();
        let e = Expr::Eq(
            Box::new(Expr::Column("missing".to_string())),
            Box::new(Expr::Literal(PropValue::Int(1))),
        );
        assert!(!evaluate(&e, &row));
    }
}
