//! Query execution: compiles a validated plan to a polars lazy computation.
//!
//! Operators apply in the standard SQL order. Aggregation is exact;
//! presentation-time rounding is the sink's job. Sorting is stable, so
//! ties keep their original relative order.

use crate::error::Result;
use crate::query::plan::{AggFunc, Aggregate, CmpOp, DeriveExpr, Literal, Predicate, QueryPlan};
use crate::query::validate;
use polars::prelude::*;
use std::collections::HashMap;
use tracing::{debug, info};

/// Executes query plans against cleaned tables.
pub struct QueryEngine;

impl QueryEngine {
    /// Run a plan against the supplied table set.
    ///
    /// The full plan is validated against the table schemas before any row
    /// processing begins.
    pub fn run(plan: &QueryPlan, tables: &HashMap<String, DataFrame>) -> Result<DataFrame> {
        validate::validate(plan, tables)?;
        info!("Running query '{}'", plan.name);

        // Validation guarantees the table lookups below succeed.
        let mut lf = tables[&plan.from].clone().lazy();

        for join in &plan.joins {
            let right = tables[&join.table].clone().lazy();
            let left_on: Vec<Expr> = join.on.iter().map(|(l, _)| col(l.as_str())).collect();
            let right_on: Vec<Expr> = join.on.iter().map(|(_, r)| col(r.as_str())).collect();
            lf = lf.join(right, left_on, right_on, JoinArgs::new(JoinType::Inner));
        }

        if let Some(filter) = conjunction(&plan.filters) {
            lf = lf.filter(filter);
        }

        for derivation in &plan.derives {
            lf = lf.with_column(derive_expr(&derivation.expr).alias(derivation.name.as_str()));
        }

        if !plan.aggregates.is_empty() {
            let aggs: Vec<Expr> = plan.aggregates.iter().map(agg_expr).collect();
            lf = if plan.group_by.is_empty() {
                lf.select(aggs)
            } else {
                let keys: Vec<Expr> = plan.group_by.iter().map(|k| col(k.as_str())).collect();
                lf.group_by_stable(keys).agg(aggs)
            };
        }

        if let Some(having) = conjunction(&plan.having) {
            lf = lf.filter(having);
        }

        if !plan.order_by.is_empty() {
            let by: Vec<Expr> = plan
                .order_by
                .iter()
                .map(|k| col(k.column.as_str()))
                .collect();
            let descending: Vec<bool> = plan.order_by.iter().map(|k| k.descending).collect();
            lf = lf.sort_by_exprs(
                by,
                SortMultipleOptions::default()
                    .with_order_descending_multi(descending)
                    .with_nulls_last(true)
                    .with_maintain_order(true),
            );
        }

        if let Some(n) = plan.limit {
            lf = lf.limit(n as IdxSize);
        }

        let result = lf.collect()?;
        debug!("Query '{}' produced {:?}", plan.name, result.shape());
        Ok(result)
    }
}

/// AND together a predicate list; None when the list is empty.
fn conjunction(predicates: &[Predicate]) -> Option<Expr> {
    predicates
        .iter()
        .map(predicate_expr)
        .reduce(|a, b| a.and(b))
}

fn literal_expr(value: &Literal) -> Expr {
    match value {
        Literal::Str(s) => lit(s.as_str()),
        Literal::Int(v) => lit(*v),
        Literal::Float(v) => lit(*v),
        Literal::Bool(v) => lit(*v),
    }
}

fn predicate_expr(pred: &Predicate) -> Expr {
    match pred {
        Predicate::IsNull(c) => col(c.as_str()).is_null(),
        Predicate::IsNotNull(c) => col(c.as_str()).is_not_null(),
        Predicate::Eq { column, value } => col(column.as_str()).eq(literal_expr(value)),
        Predicate::In { column, values } => values
            .iter()
            .map(|v| col(column.as_str()).eq(literal_expr(v)))
            .reduce(|a, b| a.or(b))
            .unwrap_or_else(|| lit(false)),
        Predicate::Cmp { column, op, value } => {
            let column = col(column.as_str());
            let value = lit(*value);
            match op {
                CmpOp::Gt => column.gt(value),
                CmpOp::Lt => column.lt(value),
                CmpOp::Ge => column.gt_eq(value),
                CmpOp::Le => column.lt_eq(value),
            }
        }
    }
}

fn derive_expr(expr: &DeriveExpr) -> Expr {
    match expr {
        DeriveExpr::Column(c) => col(c.as_str()),
        DeriveExpr::Value(v) => literal_expr(v),
        DeriveExpr::Add(a, b) => derive_expr(a) + derive_expr(b),
        DeriveExpr::Sub(a, b) => derive_expr(a) - derive_expr(b),
        DeriveExpr::Mul(a, b) => derive_expr(a) * derive_expr(b),
        DeriveExpr::Div(a, b) => {
            // a null or zero denominator yields null, not an error or inf
            let numer = derive_expr(a).cast(DataType::Float64);
            let denom = derive_expr(b).cast(DataType::Float64);
            when(denom.clone().is_null().or(denom.clone().eq(lit(0.0))))
                .then(lit(NULL))
                .otherwise(numer / denom)
        }
        DeriveExpr::Case {
            when: cond,
            then,
            otherwise,
        } => when(predicate_expr(cond))
            .then(derive_expr(then))
            .otherwise(derive_expr(otherwise)),
    }
}

fn agg_expr(agg: &Aggregate) -> Expr {
    let expr = match (&agg.func, &agg.column) {
        (AggFunc::Count, None) => len(),
        (AggFunc::Count, Some(c)) => col(c.as_str()).count(),
        (AggFunc::Sum, Some(c)) => col(c.as_str()).sum(),
        (AggFunc::Mean, Some(c)) => col(c.as_str()).mean(),
        (AggFunc::Min, Some(c)) => col(c.as_str()).min(),
        (AggFunc::Max, Some(c)) => col(c.as_str()).max(),
        // validation rejects column-less aggregates other than Count
        (_, None) => len(),
    };
    expr.alias(agg.alias.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::plan::{Derivation, Join, SortKey};
    use pretty_assertions::assert_eq;

    fn tables() -> HashMap<String, DataFrame> {
        let cost = df!(
            "name" => ["X", "Y", "Z"],
            "state" => ["Ohio", "Iowa", "Ohio"],
            "type" => ["Public", "Private", "Public"],
            "in_state_total" => [20000i64, 45000, 0],
        )
        .unwrap();
        let salary = df!(
            "name" => ["X", "Y"],
            "early_career_pay" => [52000i64, 61000],
        )
        .unwrap();
        HashMap::from([
            ("tuition_cost".to_string(), cost),
            ("salary_potential".to_string(), salary),
        ])
    }

    #[test]
    fn test_inner_join_drops_unmatched_rows() {
        let plan = QueryPlan {
            name: "join".to_string(),
            from: "tuition_cost".to_string(),
            joins: vec![Join::on("salary_potential", &[("name", "name")])],
            ..QueryPlan::default()
        };
        let result = QueryEngine::run(&plan, &tables()).unwrap();
        assert_eq!(result.height(), 2);
        let names: Vec<String> = result
            .column("name")
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .flatten()
            .map(|s| s.to_string())
            .collect();
        assert!(!names.contains(&"Z".to_string()));
    }

    #[test]
    fn test_division_by_zero_yields_null() {
        let plan = QueryPlan {
            name: "ratio".to_string(),
            from: "tuition_cost".to_string(),
            joins: vec![Join::on("salary_potential", &[("name", "name")])],
            derives: vec![Derivation::new(
                "ratio",
                DeriveExpr::div(
                    DeriveExpr::col("early_career_pay"),
                    DeriveExpr::col("in_state_total"),
                ),
            )],
            ..QueryPlan::default()
        };
        // add a zero-tuition school that joins
        let mut tables = tables();
        let cost = df!(
            "name" => ["X", "Zero U"],
            "state" => ["Ohio", "Ohio"],
            "type" => ["Public", "Public"],
            "in_state_total" => [20000i64, 0],
        )
        .unwrap();
        let salary = df!(
            "name" => ["X", "Zero U"],
            "early_career_pay" => [52000i64, 40000],
        )
        .unwrap();
        tables.insert("tuition_cost".to_string(), cost);
        tables.insert("salary_potential".to_string(), salary);

        let result = QueryEngine::run(&plan, &tables).unwrap();
        let ratio = result.column("ratio").unwrap();
        assert_eq!(ratio.null_count(), 1);
        let first = ratio.f64().unwrap().get(0).unwrap();
        assert!((first - 2.6).abs() < 1e-9);
    }

    #[test]
    fn test_order_and_limit_are_stable() {
        let pay = df!(
            "school" => ["a", "b", "c", "d"],
            "pay" => [50000i64, 70000, 70000, 30000],
        )
        .unwrap();
        let tables = HashMap::from([("salary".to_string(), pay)]);
        let plan = QueryPlan {
            name: "top2".to_string(),
            from: "salary".to_string(),
            order_by: vec![SortKey::desc("pay")],
            limit: Some(2),
            ..QueryPlan::default()
        };
        let result = QueryEngine::run(&plan, &tables).unwrap();
        let schools: Vec<String> = result
            .column("school")
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .flatten()
            .map(|s| s.to_string())
            .collect();
        // the two 70000 rows keep their original relative order
        assert_eq!(schools, vec!["b", "c"]);
    }

    #[test]
    fn test_group_aggregate_having() {
        let plan = QueryPlan {
            name: "by_state".to_string(),
            from: "tuition_cost".to_string(),
            group_by: vec!["state".to_string()],
            aggregates: vec![
                Aggregate::count("schools"),
                Aggregate::mean("in_state_total", "avg_total"),
            ],
            having: vec![Predicate::cmp("schools", CmpOp::Ge, 2.0)],
            ..QueryPlan::default()
        };
        let result = QueryEngine::run(&plan, &tables()).unwrap();
        // only Ohio has >= 2 schools
        assert_eq!(result.height(), 1);
        let avg = result.column("avg_total").unwrap().f64().unwrap().get(0);
        assert_eq!(avg, Some(10000.0));
    }

    #[test]
    fn test_mean_excludes_nulls() {
        let t = df!(
            "g" => ["a", "a", "a"],
            "v" => [Some(10.0f64), None, Some(20.0)],
        )
        .unwrap();
        let tables = HashMap::from([("t".to_string(), t)]);
        let plan = QueryPlan {
            name: "m".to_string(),
            from: "t".to_string(),
            group_by: vec!["g".to_string()],
            aggregates: vec![Aggregate::mean("v", "avg_v")],
            ..QueryPlan::default()
        };
        let result = QueryEngine::run(&plan, &tables).unwrap();
        assert_eq!(
            result.column("avg_v").unwrap().f64().unwrap().get(0),
            Some(15.0)
        );
    }

    #[test]
    fn test_global_aggregate_without_group() {
        let plan = QueryPlan {
            name: "overall".to_string(),
            from: "tuition_cost".to_string(),
            aggregates: vec![
                Aggregate::count("schools"),
                Aggregate::max("in_state_total", "max_total"),
            ],
            ..QueryPlan::default()
        };
        let result = QueryEngine::run(&plan, &tables()).unwrap();
        assert_eq!(result.height(), 1);
    }

    #[test]
    fn test_in_predicate_and_case_expr() {
        let plan = QueryPlan {
            name: "tiers".to_string(),
            from: "tuition_cost".to_string(),
            filters: vec![Predicate::is_in(
                "type",
                vec![Literal::str("Public"), Literal::str("Private")],
            )],
            derives: vec![Derivation::new(
                "tier",
                DeriveExpr::case(
                    Predicate::cmp("in_state_total", CmpOp::Lt, 25000.0),
                    DeriveExpr::value(Literal::str("low_cost")),
                    DeriveExpr::value(Literal::str("high_cost")),
                ),
            )],
            order_by: vec![SortKey::asc("name")],
            ..QueryPlan::default()
        };
        let result = QueryEngine::run(&plan, &tables()).unwrap();
        assert_eq!(result.height(), 3);
        let tiers: Vec<String> = result
            .column("tier")
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .flatten()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(tiers, vec!["low_cost", "high_cost", "low_cost"]);
    }

    #[test]
    fn test_growth_derivation_nulls_on_zero_base() {
        let t = df!(
            "old" => [100.0f64, 0.0],
            "new" => [150.0f64, 80.0],
        )
        .unwrap();
        let tables = HashMap::from([("t".to_string(), t)]);
        let plan = QueryPlan {
            name: "growth".to_string(),
            from: "t".to_string(),
            derives: vec![Derivation::new(
                "pct_growth",
                DeriveExpr::mul(
                    DeriveExpr::div(
                        DeriveExpr::sub(DeriveExpr::col("new"), DeriveExpr::col("old")),
                        DeriveExpr::col("old"),
                    ),
                    DeriveExpr::value(Literal::Float(100.0)),
                ),
            )],
            ..QueryPlan::default()
        };
        let result = QueryEngine::run(&plan, &tables).unwrap();
        let growth = result.column("pct_growth").unwrap();
        assert_eq!(growth.f64().unwrap().get(0), Some(50.0));
        assert_eq!(growth.null_count(), 1);
    }
}
