//! List command - show the location constraints in the CIB.

use clap::Args;
use location_shared_types::LocationConstraint;
use serde::Serialize;
use tabled::Tabled;

use super::Context;
use crate::output::{print_data, print_value};
use crate::OutputFormat;

/// Arguments for the list command.
#[derive(Args)]
pub struct ListArgs {
    /// Read from this shadow CIB instead of the live one
    #[arg(long)]
    cib: Option<String>,

    /// Only show constraints on this resource
    #[arg(short, long)]
    resource: Option<String>,
}

/// Display-friendly constraint for table output.
#[derive(Debug, Serialize, Tabled)]
struct ConstraintRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Resource")]
    primitive: String,
    #[tabled(rename = "Node")]
    node_name: String,
    #[tabled(rename = "Score")]
    score: String,
    #[tabled(rename = "Rule")]
    rule: String,
}

impl From<&LocationConstraint> for ConstraintRow {
    fn from(c: &LocationConstraint) -> Self {
        let rule = c
            .rule
            .as_ref()
            .filter(|r| !r.is_empty())
            .map(|r| {
                r.iter()
                    .map(|(k, v)| format!("{}: {}", k, v))
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .unwrap_or_else(|| "-".to_string());

        ConstraintRow {
            name: c.name.clone(),
            primitive: c.primitive.clone().unwrap_or_else(|| "-".to_string()),
            node_name: c.node_name.clone().unwrap_or_else(|| "-".to_string()),
            score: c
                .score
                .as_ref()
                .map(|s| s.to_string())
                .unwrap_or_else(|| "-".to_string()),
            rule,
        }
    }
}

/// Keep only constraints placing `resource`, or everything without a filter.
fn filter_by_resource(constraints: &mut Vec<LocationConstraint>, resource: Option<&str>) {
    if let Some(resource) = resource {
        constraints.retain(|c| c.primitive.as_deref() == Some(resource));
    }
}

/// Execute the list command.
pub async fn execute(args: ListArgs, ctx: &Context) -> anyhow::Result<()> {
    let provider = ctx.provider(args.cib)?;
    let mut constraints = provider.discover().await?;

    filter_by_resource(&mut constraints, args.resource.as_deref());

    match ctx.format {
        OutputFormat::Table => {
            let rows: Vec<ConstraintRow> = constraints.iter().map(ConstraintRow::from).collect();
            print_data(&rows, ctx.format)
        }
        _ => print_value(&constraints, ctx.format),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use location_shared_types::Rule;

    #[test]
    fn test_row_marks_absent_fields() {
        let row = ConstraintRow::from(&LocationConstraint::new("loc-bare"));
        assert_eq!(row.name, "loc-bare");
        assert_eq!(row.primitive, "-");
        assert_eq!(row.node_name, "-");
        assert_eq!(row.score, "-");
        assert_eq!(row.rule, "-");
    }

    #[test]
    fn test_row_renders_discovered_constraint() {
        let constraint = LocationConstraint::new("loc-web")
            .with_primitive("web")
            .with_node("node1")
            .with_score("-INFINITY")
            .with_rule(Rule::new().with_entry("pingd", "0").with_entry("#uname", "node3"));

        let row = ConstraintRow::from(&constraint);
        assert_eq!(row.primitive, "web");
        assert_eq!(row.node_name, "node1");
        assert_eq!(row.score, "-INFINITY");
        assert_eq!(row.rule, "pingd: 0, #uname: node3");
    }

    #[test]
    fn test_empty_rule_shown_as_absent() {
        let constraint = LocationConstraint::new("loc-web").with_rule(Rule::new());
        assert_eq!(ConstraintRow::from(&constraint).rule, "-");
    }

    #[test]
    fn test_filter_by_resource() {
        let all = vec![
            LocationConstraint::new("loc-web").with_primitive("web"),
            LocationConstraint::new("loc-db").with_primitive("db"),
            LocationConstraint::new("loc-none"),
            LocationConstraint::new("loc-web-2").with_primitive("web"),
        ];

        let mut constraints = all.clone();
        filter_by_resource(&mut constraints, Some("web"));
        let names: Vec<&str> = constraints.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["loc-web", "loc-web-2"]);

        let mut constraints = all.clone();
        filter_by_resource(&mut constraints, None);
        assert_eq!(constraints, all);
    }
}
