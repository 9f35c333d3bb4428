//! The fixed query battery run against the cleaned tables.
//!
//! Each plan has a stable name; the sink writes one artifact per plan and
//! downstream visualization relies on the result schemas staying stable
//! across runs.

use crate::query::{
    Aggregate, CmpOp, Derivation, DeriveExpr, Join, Literal, Predicate, QueryPlan, SortKey,
};

/// All built-in query plans, in execution order.
pub fn battery() -> Vec<QueryPlan> {
    vec![
        avg_cost_by_state(),
        public_vs_private_cost(),
        out_of_state_premium(),
        top_early_career_pay(),
        stem_pay_by_state(),
        pay_to_cost_ratio(),
        hidden_gems(),
        enrollment_share_by_category(),
        net_cost_by_income(),
        historical_cost_by_type(),
    ]
}

/// Look up a built-in plan by name.
pub fn plan_named(name: &str) -> Option<QueryPlan> {
    battery().into_iter().find(|p| p.name == name)
}

/// Average sticker cost per state, for states with at least 3 schools.
fn avg_cost_by_state() -> QueryPlan {
    QueryPlan {
        name: "avg_cost_by_state".to_string(),
        from: "tuition_cost".to_string(),
        group_by: vec!["state".to_string()],
        aggregates: vec![
            Aggregate::count("schools"),
            Aggregate::mean("in_state_total", "avg_in_state_total"),
            Aggregate::mean("out_of_state_total", "avg_out_of_state_total"),
        ],
        having: vec![Predicate::cmp("schools", CmpOp::Ge, 3.0)],
        order_by: vec![SortKey::desc("avg_in_state_total")],
        ..QueryPlan::default()
    }
}

/// Cost profile of public vs private schools, split by degree length.
fn public_vs_private_cost() -> QueryPlan {
    QueryPlan {
        name: "public_vs_private_cost".to_string(),
        from: "tuition_cost".to_string(),
        filters: vec![Predicate::is_in(
            "type",
            vec![Literal::str("Public"), Literal::str("Private")],
        )],
        group_by: vec!["type".to_string(), "degree_length".to_string()],
        aggregates: vec![
            Aggregate::count("schools"),
            Aggregate::mean("in_state_total", "avg_in_state_total"),
            Aggregate::mean("out_of_state_total", "avg_out_of_state_total"),
        ],
        order_by: vec![SortKey::asc("type"), SortKey::asc("degree_length")],
        ..QueryPlan::default()
    }
}

/// Percentage premium out-of-state students pay over in-state, at public
/// schools. A zero or missing in-state total nulls the premium.
fn out_of_state_premium() -> QueryPlan {
    QueryPlan {
        name: "out_of_state_premium".to_string(),
        from: "tuition_cost".to_string(),
        filters: vec![Predicate::eq("type", Literal::str("Public"))],
        derives: vec![Derivation::new(
            "premium_pct",
            DeriveExpr::mul(
                DeriveExpr::div(
                    DeriveExpr::sub(
                        DeriveExpr::col("out_of_state_total"),
                        DeriveExpr::col("in_state_total"),
                    ),
                    DeriveExpr::col("in_state_total"),
                ),
                DeriveExpr::value(Literal::Float(100.0)),
            ),
        )],
        order_by: vec![SortKey::desc("premium_pct")],
        limit: Some(10),
        ..QueryPlan::default()
    }
}

/// Top schools by early career pay.
fn top_early_career_pay() -> QueryPlan {
    QueryPlan {
        name: "top_early_career_pay".to_string(),
        from: "salary_potential".to_string(),
        filters: vec![Predicate::is_not_null("early_career_pay")],
        order_by: vec![SortKey::desc("early_career_pay")],
        limit: Some(10),
        ..QueryPlan::default()
    }
}

/// Mid-career pay by state among STEM-heavy schools.
fn stem_pay_by_state() -> QueryPlan {
    QueryPlan {
        name: "stem_pay_by_state".to_string(),
        from: "salary_potential".to_string(),
        filters: vec![
            Predicate::is_not_null("stem_percent"),
            Predicate::cmp("stem_percent", CmpOp::Ge, 50.0),
        ],
        group_by: vec!["state_name".to_string()],
        aggregates: vec![
            Aggregate::count("schools"),
            Aggregate::mean("mid_career_pay", "avg_mid_career_pay"),
        ],
        order_by: vec![SortKey::desc("avg_mid_career_pay")],
        ..QueryPlan::default()
    }
}

/// Early career pay per dollar of in-state cost. The zero-cost filter is
/// explicit so the derived ratio never sorts null rows.
fn pay_to_cost_ratio() -> QueryPlan {
    QueryPlan {
        name: "pay_to_cost_ratio".to_string(),
        from: "tuition_cost".to_string(),
        joins: vec![Join::on("salary_potential", &[("name", "name")])],
        filters: vec![
            Predicate::cmp("in_state_total", CmpOp::Gt, 0.0),
            Predicate::is_not_null("early_career_pay"),
        ],
        derives: vec![Derivation::new(
            "pay_per_dollar",
            DeriveExpr::div(
                DeriveExpr::col("early_career_pay"),
                DeriveExpr::col("in_state_total"),
            ),
        )],
        order_by: vec![SortKey::desc("pay_per_dollar")],
        limit: Some(15),
        ..QueryPlan::default()
    }
}

///// Hidden gems: schools under 25k total cost with mid-career pay over 90k.
fn hidden_gems() -> QueryPlan {
    QueryPlan {
        name: "hidden_gems".to_string(),
        from: "tuition_cost".to_string(),
        joins: vec![Join::on("salary_potential", &[("name", "name")])],
        filters: vec![
            Predicate::cmp("in_state_total", CmpOp::Lt, 25000.0),
            Predicate::cmp("mid_career_pay", CmpOp::Gt, 90000.0),
        ],
        derives: vec![Derivation::new(
            "value_tier",
            DeriveExpr::case(
                Predicate::cmp("in_state_total", CmpOp::Lt, 20000.0),
                DeriveExpr::value(Literal::str("exceptional")),
                DeriveExpr::value(Literal::str("strong")),
            ),
        )],
        order_by: vec![SortKey::desc("mid_career_pay")],
        limit: Some(20),
        ..QueryPlan::default()
    }
}

/// Average enrollment share per diversity category, across schools with a
/// known total enrollment.
fn enrollment_share_by_category() -> QueryPlan {
    QueryPlan {
        name: "enrollment_share_by_category".to_string(),
        from: "diversity_school".to_string(),
        filters: vec![
            Predicate::is_not_null("total_enrollment"),
            Predicate::cmp("total_enrollment", CmpOp::Gt, 0.0),
        ],
        derives: vec![Derivation::new(
            "share_pct",
            DeriveExpr::mul(
                DeriveExpr::div(
                    DeriveExpr::col("enrollment"),
                    DeriveExpr::col("total_enrollment"),
                ),
                DeriveExpr::value(Literal::Float(100.0)),
            ),
        )],
        group_by: vec!["category".to_string()],
        aggregates: vec![
            Aggregate::count("schools"),
            Aggregate::mean("share_pct", "avg_share_pct"),
        ],
        order_by: vec![SortKey::desc("avg_share_pct")],
        ..QueryPlan::default()
    }
}

/// Average net cost by family income level.
fn net_cost_by_income() -> QueryPlan {
    QueryPlan {
        name: "net_cost_by_income".to_string(),
        from: "tuition_income".to_string(),
        filters: vec![Predicate::is_not_null("net_cost")],
        group_by: vec!["income_lvl".to_string()],
        aggregates: vec![
            Aggregate::count("records"),
            Aggregate::mean("net_cost", "avg_net_cost"),
        ],
        order_by: vec![SortKey::asc("avg_net_cost")],
        ..QueryPlan::default()
    }
}

/// Historical tuition spread per institution type.
fn historical_cost_by_type() -> QueryPlan {
    QueryPlan {
        name: "historical_cost_by_type".to_string(),
        from: "historical_tuition".to_string(),
        filters: vec![Predicate::is_not_null("tuition_cost")],
        group_by: vec!["tuition_type".to_string()],
        aggregates: vec![
            Aggregate::mean("tuition_cost", "avg_tuition"),
            Aggregate::min("tuition_cost", "min_tuition"),
            Aggregate::max("tuition_cost", "max_tuition"),
        ],
        order_by: vec![SortKey::desc("avg_tuition")],
        ..QueryPlan::default()
    }
}
